//! Orders and the request types used to place them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{Numeric, Validator};

/// Fulfilment state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Awaiting processing.
    #[default]
    #[serde(rename = "Chờ xử lý")]
    Pending,
    /// Confirmed by staff.
    #[serde(rename = "Đã xác nhận")]
    Confirmed,
    /// Out for delivery.
    #[serde(rename = "Đang giao")]
    Shipping,
    /// Delivered to the customer.
    #[serde(rename = "Đã giao")]
    Delivered,
    /// Cancelled.
    #[serde(rename = "Đã hủy")]
    Cancelled,
}

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipping,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// The stored and serialized label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Chờ xử lý",
            Self::Confirmed => "Đã xác nhận",
            Self::Shipping => "Đang giao",
            Self::Delivered => "Đã giao",
            Self::Cancelled => "Đã hủy",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| format!("unknown order status: {s}"))
    }
}

/// A line of an order: the vehicle as it was when purchased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Vehicle identifier.
    pub vehicle: i64,
    /// Vehicle name at purchase time.
    pub name: String,
    /// Vehicle image at purchase time.
    pub image: String,
    /// Units bought.
    pub quantity: i64,
    /// Unit price at purchase time.
    pub price: i64,
}

impl OrderItem {
    /// `price * quantity`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<i64> {
        self.price.checked_mul(self.quantity)
    }
}

/// Delivery address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    /// Street address.
    pub address: String,
    /// City.
    pub city: String,
    /// Contact phone number.
    pub phone_no: String,
    /// Postal code.
    pub postal_code: String,
}

/// Name and email of the ordering customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    /// User identifier.
    #[serde(rename = "_id")]
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

/// The `user` field of an order: a bare id, or the populated customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OrderCustomer {
    /// Populated with name and email.
    Populated(CustomerSummary),
    /// Only the id.
    Id(i64),
}

impl OrderCustomer {
    /// The customer's user id.
    #[must_use]
    pub fn id(&self) -> i64 {
        match self {
            Self::Populated(summary) => summary.id,
            Self::Id(id) => *id,
        }
    }
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Storage-assigned identifier.
    #[serde(rename = "_id")]
    pub id: i64,
    /// Who placed the order. `None` once the account has been deleted.
    pub user: Option<OrderCustomer>,
    /// Purchased lines.
    pub order_items: Vec<OrderItem>,
    /// Delivery address.
    pub shipping_info: ShippingInfo,
    /// Sum of all line totals.
    pub total_price: i64,
    /// Fulfilment state.
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Whether `user_id` placed this order.
    #[must_use]
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user.as_ref().is_some_and(|u| u.id() == user_id)
    }
}

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    /// Vehicle to buy.
    pub vehicle_id: i64,
    /// Units to buy, always positive.
    pub quantity: i64,
}

/// A validated order request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    /// Requested lines, in request order.
    pub lines: Vec<OrderLine>,
    /// Delivery address.
    pub shipping_info: ShippingInfo,
}

/// Raw line of `POST /api/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderItemInput {
    /// Vehicle id.
    pub vehicle: Option<Numeric>,
    /// Units requested.
    pub quantity: Option<Numeric>,
}

/// Raw shipping block of `POST /api/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfoInput {
    /// Street address.
    pub address: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Contact phone number.
    pub phone_no: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    /// Requested lines.
    pub items: Option<Vec<OrderItemInput>>,
    /// Delivery address.
    pub shipping_info: Option<ShippingInfoInput>,
}

impl OrderInput {
    /// Validate an order request.
    ///
    /// # Errors
    ///
    /// Returns a bad request error when no items are given, otherwise a
    /// validation error listing each invalid field.
    pub fn validate(self) -> Result<NewOrder> {
        let items = match self.items {
            Some(items) if !items.is_empty() => items,
            _ => return Err(Error::bad_request("No order items provided")),
        };

        let mut v = Validator::new();
        let mut lines = Vec::with_capacity(items.len());
        for (i, item) in items.iter().enumerate() {
            let vehicle_id = v.integer(
                &format!("items[{i}].vehicle"),
                item.vehicle.as_ref(),
                1,
                "Vehicle id is required",
            );
            let quantity = v.integer(
                &format!("items[{i}].quantity"),
                item.quantity.as_ref(),
                1,
                "Quantity must be a positive whole number",
            );
            if let (Some(vehicle_id), Some(quantity)) = (vehicle_id, quantity) {
                lines.push(OrderLine {
                    vehicle_id,
                    quantity,
                });
            }
        }

        let shipping = self.shipping_info.unwrap_or_default();
        let address = v.required(
            "shippingInfo.address",
            shipping.address.as_deref(),
            "Address is required",
        );
        let city = v.required("shippingInfo.city", shipping.city.as_deref(), "City is required");
        let phone_no = v.required(
            "shippingInfo.phoneNo",
            shipping.phone_no.as_deref(),
            "Phone number is required",
        );
        let postal_code = v.required(
            "shippingInfo.postalCode",
            shipping.postal_code.as_deref(),
            "Postal code is required",
        );
        v.finish()?;

        let (Some(address), Some(city), Some(phone_no), Some(postal_code)) =
            (address, city, phone_no, postal_code)
        else {
            return Err(Error::internal("validator accepted an order with missing fields"));
        };
        Ok(NewOrder {
            lines,
            shipping_info: ShippingInfo {
                address,
                city,
                phone_no,
                postal_code,
            },
        })
    }
}

/// Body of `PUT /api/orders/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusInput {
    /// New status label.
    pub status: Option<String>,
}

impl StatusInput {
    /// Parse the requested status.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the status is missing or unknown.
    pub fn validate(self) -> Result<OrderStatus> {
        let mut v = Validator::new();
        let status = match self.status.as_deref().map(str::parse::<OrderStatus>) {
            Some(Ok(status)) => Some(status),
            Some(Err(_)) | None => {
                let allowed: Vec<_> = OrderStatus::ALL.iter().map(OrderStatus::as_str).collect();
                v.fail(
                    "status",
                    &format!("Status must be one of: {}", allowed.join(", ")),
                );
                None
            }
        };
        v.finish()?;
        status.ok_or_else(|| Error::internal("validator accepted a missing status"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shipping_json() -> &'static str {
        r#""shippingInfo":{"address":"12 Lê Lợi","city":"Huế","phoneNo":"0900000000","postalCode":"530000"}"#
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Cancelled).unwrap(),
            "\"Đã hủy\""
        );
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("Shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_validate_order() {
        let body = format!(
            r#"{{"items":[{{"vehicle":3,"quantity":2}},{{"vehicle":"4","quantity":1}}],{}}}"#,
            shipping_json()
        );
        let input: OrderInput = serde_json::from_str(&body).unwrap();
        let order = input.validate().unwrap();
        assert_eq!(
            order.lines,
            vec![
                OrderLine {
                    vehicle_id: 3,
                    quantity: 2
                },
                OrderLine {
                    vehicle_id: 4,
                    quantity: 1
                },
            ]
        );
        assert_eq!(order.shipping_info.city, "Huế");
    }

    #[test]
    fn test_validate_empty_items() {
        let input: OrderInput = serde_json::from_str(r#"{"items":[]}"#).unwrap();
        let err = input.validate().unwrap_err();
        assert_eq!(err.to_string(), "No order items provided");

        let err = OrderInput::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "No order items provided");
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let body = format!(
            r#"{{"items":[{{"vehicle":3,"quantity":0}},{{"vehicle":3,"quantity":-2}}],{}}}"#,
            shipping_json()
        );
        let input: OrderInput = serde_json::from_str(&body).unwrap();
        let Err(Error::Validation(errors)) = input.validate() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].path, "items[0].quantity");
    }

    #[test]
    fn test_validate_requires_shipping() {
        let input: OrderInput =
            serde_json::from_str(r#"{"items":[{"vehicle":1,"quantity":1}]}"#).unwrap();
        let Err(Error::Validation(errors)) = input.validate() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_status_input() {
        let ok = StatusInput {
            status: Some("Đang giao".to_string()),
        };
        assert_eq!(ok.validate().unwrap(), OrderStatus::Shipping);
        assert!(StatusInput::default().validate().is_err());
    }

    #[test]
    fn test_order_customer_serialization() {
        let id = serde_json::to_value(OrderCustomer::Id(5)).unwrap();
        assert_eq!(id, serde_json::json!(5));

        let populated = serde_json::to_value(OrderCustomer::Populated(CustomerSummary {
            id: 5,
            name: "Lan".to_string(),
            email: "lan@x.vn".to_string(),
        }))
        .unwrap();
        assert_eq!(populated["_id"], 5);
        assert_eq!(populated["email"], "lan@x.vn");
    }

    #[test]
    fn test_order_ownership_and_line_total() {
        let order = Order {
            id: 1,
            user: Some(OrderCustomer::Id(9)),
            order_items: vec![OrderItem {
                vehicle: 1,
                name: "A".to_string(),
                image: "/a.png".to_string(),
                quantity: 2,
                price: 50,
            }],
            shipping_info: ShippingInfo::default(),
            total_price: 100,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };
        assert!(order.is_owned_by(9));
        assert!(!order.is_owned_by(1));
        assert_eq!(order.order_items[0].line_total(), Some(100));

        let overflow = OrderItem {
            price: i64::MAX,
            ..order.order_items[0].clone()
        };
        assert_eq!(overflow.line_total(), None);
    }
}
