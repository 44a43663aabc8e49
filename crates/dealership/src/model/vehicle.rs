//! Vehicle inventory records.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{Numeric, Validator};

/// Earliest accepted model year.
const FIRST_MODEL_YEAR: i64 = 1886;

/// The kind of vehicle on sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleType {
    /// A car.
    #[serde(rename = "ô tô")]
    Car,
    /// A motorbike.
    #[serde(rename = "xe máy")]
    Motorbike,
}

impl VehicleType {
    /// The stored and serialized label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "ô tô",
            Self::Motorbike => "xe máy",
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VehicleType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "ô tô" => Ok(Self::Car),
            "xe máy" => Ok(Self::Motorbike),
            other => Err(format!("unknown vehicle type: {other}")),
        }
    }
}

/// A vehicle in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    /// Storage-assigned identifier.
    #[serde(rename = "_id")]
    pub id: i64,
    /// Model name.
    pub name: String,
    /// Manufacturer.
    pub brand: String,
    /// Car or motorbike.
    #[serde(rename = "type")]
    pub vehicle_type: VehicleType,
    /// Unit price in whole currency units.
    pub price: i64,
    /// Year of manufacture.
    pub year: i32,
    /// Free-form description.
    pub description: String,
    /// Image URL or path.
    pub image: String,
    /// Units in stock.
    pub quantity: i64,
    /// When the vehicle was added.
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Whether at least `quantity` units are available.
    #[must_use]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.quantity >= quantity
    }
}

/// A validated vehicle ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVehicle {
    /// Model name.
    pub name: String,
    /// Manufacturer.
    pub brand: String,
    /// Car or motorbike.
    pub vehicle_type: VehicleType,
    /// Unit price.
    pub price: i64,
    /// Year of manufacture.
    pub year: i32,
    /// Free-form description.
    pub description: String,
    /// Image URL or path.
    pub image: String,
    /// Initial stock.
    pub quantity: i64,
}

/// A validated partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VehiclePatch {
    /// New name.
    pub name: Option<String>,
    /// New brand.
    pub brand: Option<String>,
    /// New type.
    pub vehicle_type: Option<VehicleType>,
    /// New price.
    pub price: Option<i64>,
    /// New year.
    pub year: Option<i32>,
    /// New description.
    pub description: Option<String>,
    /// New image.
    pub image: Option<String>,
    /// New stock level.
    pub quantity: Option<i64>,
}

impl VehiclePatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Raw vehicle fields from a request body, seed file, or multipart form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInput {
    /// Model name.
    pub name: Option<String>,
    /// Manufacturer.
    pub brand: Option<String>,
    /// `"ô tô"` or `"xe máy"`.
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    /// Unit price.
    pub price: Option<Numeric>,
    /// Year of manufacture.
    pub year: Option<Numeric>,
    /// Free-form description.
    pub description: Option<String>,
    /// Image URL or path.
    pub image: Option<String>,
    /// Units in stock.
    pub quantity: Option<Numeric>,
}

fn max_model_year() -> i64 {
    i64::from(Utc::now().year()) + 1
}

impl VehicleInput {
    /// Set a field from a multipart text part. Unknown names are ignored.
    pub fn set_text_field(&mut self, name: &str, value: String) {
        match name {
            "name" => self.name = Some(value),
            "brand" => self.brand = Some(value),
            "type" => self.vehicle_type = Some(value),
            "price" => self.price = Some(Numeric::Text(value)),
            "year" => self.year = Some(Numeric::Text(value)),
            "description" => self.description = Some(value),
            "image" => self.image = Some(value),
            "quantity" => self.quantity = Some(Numeric::Text(value)),
            _ => {}
        }
    }

    /// Validate every field required to create a vehicle.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing each missing or invalid field.
    pub fn into_new(self) -> Result<NewVehicle> {
        let mut v = Validator::new();
        let name = v.required("name", self.name.as_deref(), "Please add a name");
        let brand = v.required("brand", self.brand.as_deref(), "Please add a brand");
        let vehicle_type = parse_type(&mut v, self.vehicle_type.as_deref(), true);
        let price = v.integer("price", self.price.as_ref(), 0, "Please add a price");
        let year = v.integer_in(
            "year",
            self.year.as_ref(),
            FIRST_MODEL_YEAR..=max_model_year(),
            "Please add the year of manufacture",
        );
        let description = v.required(
            "description",
            self.description.as_deref(),
            "Please add a description",
        );
        let image = v.required("image", self.image.as_deref(), "Please add an image URL");
        let quantity = match self.quantity.as_ref() {
            None => Some(0),
            Some(q) => v.integer("quantity", Some(q), 0, "Please add the stock quantity"),
        };
        v.finish()?;

        let (
            Some(name),
            Some(brand),
            Some(vehicle_type),
            Some(price),
            Some(year),
            Some(description),
            Some(image),
            Some(quantity),
        ) = (name, brand, vehicle_type, price, year, description, image, quantity)
        else {
            return Err(Error::internal("validator accepted a vehicle with missing fields"));
        };

        Ok(NewVehicle {
            name,
            brand,
            vehicle_type,
            price,
            year: narrow_year(year),
            description,
            image,
            quantity,
        })
    }

    /// Validate the fields present in a partial update.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing each invalid field.
    pub fn into_patch(self) -> Result<VehiclePatch> {
        let mut v = Validator::new();
        let patch = VehiclePatch {
            name: v.optional("name", self.name.as_deref(), "Please add a name"),
            brand: v.optional("brand", self.brand.as_deref(), "Please add a brand"),
            vehicle_type: parse_type(&mut v, self.vehicle_type.as_deref(), false),
            price: self
                .price
                .as_ref()
                .and_then(|p| v.integer("price", Some(p), 0, "Price must be a non-negative number")),
            year: self
                .year
                .as_ref()
                .and_then(|y| {
                    v.integer_in(
                        "year",
                        Some(y),
                        FIRST_MODEL_YEAR..=max_model_year(),
                        "Year of manufacture is out of range",
                    )
                })
                .map(narrow_year),
            description: v.optional(
                "description",
                self.description.as_deref(),
                "Please add a description",
            ),
            image: v.optional("image", self.image.as_deref(), "Please add an image URL"),
            quantity: self.quantity.as_ref().and_then(|q| {
                v.integer("quantity", Some(q), 0, "Quantity must be a non-negative number")
            }),
        };
        v.finish()?;
        Ok(patch)
    }
}

fn parse_type(v: &mut Validator, raw: Option<&str>, required: bool) -> Option<VehicleType> {
    match raw {
        None if !required => None,
        None => {
            v.fail("type", "Please specify the type (ô tô / xe máy)");
            None
        }
        Some(s) => match s.parse() {
            Ok(t) => Some(t),
            Err(_) => {
                v.fail("type", "Please specify the type (ô tô / xe máy)");
                None
            }
        },
    }
}

// Years are range-checked before narrowing.
#[allow(clippy::cast_possible_truncation)]
fn narrow_year(year: i64) -> i32 {
    year as i32
}
