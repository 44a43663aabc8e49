//! Order placement and management.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Params, Row, TransactionBehavior};
use tracing::{debug, info, warn};

use super::vehicles::row_to_vehicle;
use super::{format_timestamp, parse_timestamp, Storage};
use crate::error::{Error, Result};
use crate::model::{
    CustomerSummary, NewOrder, Order, OrderCustomer, OrderItem, OrderStatus, ShippingInfo,
};

const ORDER_SELECT: &str = r"
    SELECT o.id, o.user_id, o.address, o.city, o.phone_no, o.postal_code,
           o.total_price, o.status, o.created_at, u.id, u.name, u.email
    FROM orders o LEFT JOIN users u ON u.id = o.user_id
";

/// How the `user` field of a loaded order is filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Customer {
    /// Bare user id.
    Id,
    /// Name and email, or `null` if the account is gone.
    Populated,
}

impl Storage {
    /// Place an order for `user_id`.
    ///
    /// Every line is checked against live stock, snapshotted at the current
    /// name, image and price, and its stock decremented. All of it happens in
    /// one transaction: on any error no stock changes and no order is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VehicleNotFound`] or [`Error::InsufficientStock`] for
    /// the first line that can't be filled, a bad request error if the order
    /// is empty or its total overflows, or an error if the database fails.
    pub fn place_order(&mut self, user_id: i64, order: &NewOrder) -> Result<Order> {
        if order.lines.is_empty() {
            return Err(Error::bad_request("No order items provided"));
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut items = Vec::with_capacity(order.lines.len());
        let mut total_price: i64 = 0;
        for line in &order.lines {
            if line.quantity <= 0 {
                return Err(Error::bad_request("Quantity must be a positive whole number"));
            }

            let vehicle = tx
                .query_row(
                    "SELECT id, name, brand, vehicle_type, price, year, description, image, \
                     quantity, created_at FROM vehicles WHERE id = ?1",
                    [line.vehicle_id],
                    row_to_vehicle,
                )
                .optional()?
                .ok_or(Error::VehicleNotFound(line.vehicle_id))?;

            if !vehicle.has_stock(line.quantity) {
                return Err(Error::InsufficientStock {
                    name: vehicle.name,
                    available: vehicle.quantity,
                });
            }

            let item = OrderItem {
                vehicle: vehicle.id,
                name: vehicle.name,
                image: vehicle.image,
                quantity: line.quantity,
                price: vehicle.price,
            };
            total_price = item
                .line_total()
                .and_then(|line_total| total_price.checked_add(line_total))
                .ok_or_else(|| Error::bad_request("Order total is too large"))?;

            let decremented = tx.execute(
                "UPDATE vehicles SET quantity = quantity - ?1 WHERE id = ?2 AND quantity >= ?1",
                params![line.quantity, line.vehicle_id],
            )?;
            if decremented == 0 {
                return Err(Error::InsufficientStock {
                    name: item.name,
                    available: vehicle.quantity,
                });
            }
            items.push(item);
        }

        let created_at = Utc::now();
        let shipping = &order.shipping_info;
        tx.execute(
            r"
            INSERT INTO orders
                (user_id, address, city, phone_no, postal_code, total_price, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
            params![
                user_id,
                shipping.address,
                shipping.city,
                shipping.phone_no,
                shipping.postal_code,
                total_price,
                OrderStatus::Pending.as_str(),
                format_timestamp(created_at),
            ],
        )?;
        let order_id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                r"
                INSERT INTO order_items (order_id, position, vehicle_id, name, image, quantity, price)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ",
            )?;
            for (position, item) in items.iter().enumerate() {
                stmt.execute(params![
                    order_id,
                    i64::try_from(position).unwrap_or(i64::MAX),
                    item.vehicle,
                    item.name,
                    item.image,
                    item.quantity,
                    item.price,
                ])?;
            }
        }

        tx.commit()?;
        info!(
            order_id,
            user_id,
            items = items.len(),
            total_price,
            "Order placed"
        );

        Ok(Order {
            id: order_id,
            user: Some(OrderCustomer::Id(user_id)),
            order_items: items,
            shipping_info: shipping.clone(),
            total_price,
            status: OrderStatus::Pending,
            created_at: parse_timestamp(&format_timestamp(created_at)),
        })
    }

    /// Every order, newest first, with the customer populated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_orders(&self) -> Result<Vec<Order>> {
        let sql = format!("{ORDER_SELECT} ORDER BY o.created_at DESC, o.id DESC");
        self.query_orders(&sql, [], Customer::Populated)
    }

    /// Orders placed by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let sql =
            format!("{ORDER_SELECT} WHERE o.user_id = ?1 ORDER BY o.created_at DESC, o.id DESC");
        self.query_orders(&sql, [user_id], Customer::Id)
    }

    /// Get an order by ID with the customer populated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_order(&self, id: i64) -> Result<Option<Order>> {
        self.find_order(id, Customer::Populated)
    }

    /// Change an order's status.
    ///
    /// Returns the updated order, or `None` if no order has that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_order_status(&self, id: i64, status: OrderStatus) -> Result<Option<Order>> {
        let affected = self.conn.execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )?;
        if affected == 0 {
            return Ok(None);
        }
        debug!("Order {} is now {}", id, status);
        self.find_order(id, Customer::Id)
    }

    /// Delete an order and its items. Stock is not restored.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_order(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM orders WHERE id = ?1", [id])?;
        if affected > 0 {
            debug!("Deleted order {}", id);
        }
        Ok(affected > 0)
    }

    fn find_order(&self, id: i64, customer: Customer) -> Result<Option<Order>> {
        let sql = format!("{ORDER_SELECT} WHERE o.id = ?1");
        Ok(self.query_orders(&sql, [id], customer)?.into_iter().next())
    }

    fn query_orders<P: Params>(&self, sql: &str, params: P, customer: Customer) -> Result<Vec<Order>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut orders = stmt
            .query_map(params, |row| row_to_order(row, customer))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        for order in &mut orders {
            order.order_items = load_items(&self.conn, order.id)?;
        }
        Ok(orders)
    }
}

fn load_items(conn: &Connection, order_id: i64) -> Result<Vec<OrderItem>> {
    let mut stmt = conn.prepare_cached(
        r"
        SELECT vehicle_id, name, image, quantity, price
        FROM order_items WHERE order_id = ?1 ORDER BY position ASC
        ",
    )?;
    let items = stmt
        .query_map([order_id], |row| {
            Ok(OrderItem {
                vehicle: row.get(0)?,
                name: row.get(1)?,
                image: row.get(2)?,
                quantity: row.get(3)?,
                price: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(items)
}

/// Convert a row of `ORDER_SELECT` to an Order without its items.
fn row_to_order(row: &Row, customer: Customer) -> rusqlite::Result<Order> {
    let user_id: i64 = row.get(1)?;
    let user = match customer {
        Customer::Id => Some(OrderCustomer::Id(user_id)),
        Customer::Populated => {
            let joined: Option<i64> = row.get(9)?;
            match joined {
                Some(id) => Some(OrderCustomer::Populated(CustomerSummary {
                    id,
                    name: row.get(10)?,
                    email: row.get(11)?,
                })),
                None => None,
            }
        }
    };

    let status_str: String = row.get(7)?;
    let status = status_str.parse().unwrap_or_else(|_| {
        warn!("Unknown order status: {}, defaulting to pending", status_str);
        OrderStatus::Pending
    });
    let created_at: String = row.get(8)?;

    Ok(Order {
        id: row.get(0)?,
        user,
        order_items: Vec::new(),
        shipping_info: ShippingInfo {
            address: row.get(2)?,
            city: row.get(3)?,
            phone_no: row.get(4)?,
            postal_code: row.get(5)?,
        },
        total_price: row.get(6)?,
        status,
        created_at: parse_timestamp(&created_at),
    })
}
