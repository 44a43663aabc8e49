//! Vehicle catalog operations.

use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::{debug, info, warn};

use super::{format_timestamp, parse_timestamp, sql_limit, Storage, UNICODE_LOWER};
use crate::error::{Error, Result};
use crate::model::{NewVehicle, Vehicle, VehiclePatch, VehicleType};

const VEHICLE_COLUMNS: &str =
    "id, name, brand, vehicle_type, price, year, description, image, quantity, created_at";

impl Storage {
    /// Insert a vehicle and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle> {
        let id = insert_vehicle_row(&self.conn, vehicle)?;
        debug!("Inserted vehicle with id {}", id);
        self.require_vehicle(id)
    }

    /// Get a vehicle by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_vehicle(&self, id: i64) -> Result<Option<Vehicle>> {
        let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = ?1");
        let vehicle = self
            .conn
            .query_row(&sql, [id], row_to_vehicle)
            .optional()?;
        Ok(vehicle)
    }

    /// List vehicles in catalog order.
    ///
    /// `keyword` matches a case-insensitive substring of the name or the
    /// brand. A `limit` of `None` or `Some(0)` returns every match.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_vehicles(&self, keyword: Option<&str>, limit: Option<usize>) -> Result<Vec<Vehicle>> {
        let keyword = keyword.map(str::trim).filter(|k| !k.is_empty());
        let vehicles = if let Some(keyword) = keyword {
            let sql = format!(
                r"
                SELECT {VEHICLE_COLUMNS} FROM vehicles
                WHERE instr({UNICODE_LOWER}(name), ?1) > 0
                   OR instr({UNICODE_LOWER}(brand), ?1) > 0
                ORDER BY id ASC LIMIT ?2
                "
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params![keyword.to_lowercase(), sql_limit(limit)], row_to_vehicle)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        } else {
            let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles ORDER BY id ASC LIMIT ?1");
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt
                .query_map([sql_limit(limit)], row_to_vehicle)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows
        };
        Ok(vehicles)
    }

    /// Apply a partial update.
    ///
    /// Returns the updated vehicle, or `None` if no vehicle has that id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_vehicle(&self, id: i64, patch: &VehiclePatch) -> Result<Option<Vehicle>> {
        let Some(current) = self.get_vehicle(id)? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(current));
        }

        let merged = Vehicle {
            name: patch.name.clone().unwrap_or(current.name),
            brand: patch.brand.clone().unwrap_or(current.brand),
            vehicle_type: patch.vehicle_type.unwrap_or(current.vehicle_type),
            price: patch.price.unwrap_or(current.price),
            year: patch.year.unwrap_or(current.year),
            description: patch.description.clone().unwrap_or(current.description),
            image: patch.image.clone().unwrap_or(current.image),
            quantity: patch.quantity.unwrap_or(current.quantity),
            ..current
        };

        self.conn.execute(
            r"
            UPDATE vehicles
            SET name = ?1, brand = ?2, vehicle_type = ?3, price = ?4, year = ?5,
                description = ?6, image = ?7, quantity = ?8
            WHERE id = ?9
            ",
            params![
                merged.name,
                merged.brand,
                merged.vehicle_type.as_str(),
                merged.price,
                merged.year,
                merged.description,
                merged.image,
                merged.quantity,
                id,
            ],
        )?;
        debug!("Updated vehicle {}", id);
        Ok(Some(merged))
    }

    /// Delete a vehicle by ID.
    ///
    /// Returns `true` if a vehicle was deleted, `false` if not found. Orders
    /// keep their snapshot of the vehicle.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_vehicle(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM vehicles WHERE id = ?1", [id])?;
        if affected > 0 {
            debug!("Deleted vehicle {}", id);
        }
        Ok(affected > 0)
    }

    /// Delete every vehicle. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_all_vehicles(&self) -> Result<usize> {
        let affected = self.conn.execute("DELETE FROM vehicles", [])?;
        info!("Deleted {} vehicles", affected);
        Ok(affected)
    }

    /// Insert a batch of vehicles in one transaction.
    ///
    /// Either every vehicle is inserted or none is.
    ///
    /// # Errors
    ///
    /// Returns an error if any insert fails; the batch is rolled back.
    pub fn import_vehicles(&mut self, batch: &[NewVehicle]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for vehicle in batch {
            insert_vehicle_row(&tx, vehicle)?;
        }
        tx.commit()?;
        info!("Imported {} vehicles", batch.len());
        Ok(batch.len())
    }

    fn require_vehicle(&self, id: i64) -> Result<Vehicle> {
        self.get_vehicle(id)?
            .ok_or_else(|| Error::internal(format!("vehicle {id} vanished after insert")))
    }
}

fn insert_vehicle_row(conn: &rusqlite::Connection, vehicle: &NewVehicle) -> Result<i64> {
    conn.execute(
        r"
        INSERT INTO vehicles
            (name, brand, vehicle_type, price, year, description, image, quantity, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ",
        params![
            vehicle.name,
            vehicle.brand,
            vehicle.vehicle_type.as_str(),
            vehicle.price,
            vehicle.year,
            vehicle.description,
            vehicle.image,
            vehicle.quantity,
            format_timestamp(Utc::now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Convert a database row to a Vehicle struct.
pub(super) fn row_to_vehicle(row: &Row) -> rusqlite::Result<Vehicle> {
    let type_str: String = row.get(3)?;
    let vehicle_type = type_str.parse().unwrap_or_else(|_| {
        warn!("Unknown vehicle type: {}, defaulting to car", type_str);
        VehicleType::Car
    });
    let created_at: String = row.get(9)?;

    Ok(Vehicle {
        id: row.get(0)?,
        name: row.get(1)?,
        brand: row.get(2)?,
        vehicle_type,
        price: row.get(4)?,
        year: row.get(5)?,
        description: row.get(6)?,
        image: row.get(7)?,
        quantity: row.get(8)?,
        created_at: parse_timestamp(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> Storage {
        Storage::open_in_memory().expect("failed to create test storage")
    }

    fn new_vehicle(name: &str, brand: &str, quantity: i64) -> NewVehicle {
        NewVehicle {
            name: name.to_string(),
            brand: brand.to_string(),
            vehicle_type: VehicleType::Car,
            price: 1_000_000,
            year: 2024,
            description: "test vehicle".to_string(),
            image: "/images/test.png".to_string(),
            quantity,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let storage = storage();
        let vehicle = storage
            .insert_vehicle(&new_vehicle("VF8", "VinFast", 3))
            .unwrap();
        assert!(vehicle.id > 0);

        let fetched = storage.get_vehicle(vehicle.id).unwrap().unwrap();
        assert_eq!(fetched, vehicle);
        assert_eq!(fetched.quantity, 3);
    }

    #[test]
    fn test_get_missing() {
        assert!(storage().get_vehicle(999).unwrap().is_none());
    }

    #[test]
    fn test_list_keyword_matches_name_or_brand() {
        let storage = storage();
        storage.insert_vehicle(&new_vehicle("Vision", "Honda", 1)).unwrap();
        storage.insert_vehicle(&new_vehicle("VF8", "VinFast", 1)).unwrap();
        storage.insert_vehicle(&new_vehicle("Camry", "Toyota", 1)).unwrap();

        let hits = storage.list_vehicles(Some("hon"), None).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].brand, "Honda");

        let hits = storage.list_vehicles(Some("V"), None).unwrap();
        assert_eq!(hits.len(), 2);

        assert_eq!(storage.list_vehicles(Some("  "), None).unwrap().len(), 3);
    }

    #[test]
    fn test_list_keyword_wildcards_are_literal() {
        let storage = storage();
        storage.insert_vehicle(&new_vehicle("Camry", "Toyota", 1)).unwrap();
        assert!(storage.list_vehicles(Some("%"), None).unwrap().is_empty());
        assert!(storage.list_vehicles(Some("_"), None).unwrap().is_empty());
    }

    #[test]
    fn test_list_keyword_folds_unicode_case() {
        let storage = storage();
        storage.insert_vehicle(&new_vehicle("Xe Điện VF3", "VinFast", 1)).unwrap();
        storage.insert_vehicle(&new_vehicle("Camry", "Toyota", 1)).unwrap();

        for keyword in ["Điện", "điện", "ĐIỆN", "xe đ"] {
            let hits = storage.list_vehicles(Some(keyword), None).unwrap();
            assert_eq!(hits.len(), 1, "keyword {keyword:?}");
            assert_eq!(hits[0].name, "Xe Điện VF3");
        }
        assert_eq!(storage.list_vehicles(Some("VINFAST"), None).unwrap().len(), 1);
    }

    #[test]
    fn test_list_limit() {
        let storage = storage();
        for i in 0..5 {
            storage
                .insert_vehicle(&new_vehicle(&format!("Model {i}"), "Brand", 1))
                .unwrap();
        }
        assert_eq!(storage.list_vehicles(None, Some(2)).unwrap().len(), 2);
        assert_eq!(storage.list_vehicles(None, Some(0)).unwrap().len(), 5);
        assert_eq!(storage.list_vehicles(None, None).unwrap().len(), 5);
    }

    #[test]
    fn test_update_partial() {
        let storage = storage();
        let vehicle = storage.insert_vehicle(&new_vehicle("VF8", "VinFast", 3)).unwrap();

        let patch = VehiclePatch {
            price: Some(900),
            quantity: Some(7),
            ..VehiclePatch::default()
        };
        let updated = storage.update_vehicle(vehicle.id, &patch).unwrap().unwrap();
        assert_eq!(updated.price, 900);
        assert_eq!(updated.quantity, 7);
        assert_eq!(updated.name, "VF8");

        let fetched = storage.get_vehicle(vehicle.id).unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[test]
    fn test_update_missing() {
        let patch = VehiclePatch {
            price: Some(1),
            ..VehiclePatch::default()
        };
        assert!(storage().update_vehicle(42, &patch).unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let storage = storage();
        let vehicle = storage.insert_vehicle(&new_vehicle("VF8", "VinFast", 3)).unwrap();
        assert!(storage.delete_vehicle(vehicle.id).unwrap());
        assert!(!storage.delete_vehicle(vehicle.id).unwrap());
        assert!(storage.get_vehicle(vehicle.id).unwrap().is_none());
    }

    #[test]
    fn test_import_and_delete_all() {
        let mut storage = storage();
        let batch = vec![new_vehicle("A", "X", 1), new_vehicle("B", "Y", 2)];
        assert_eq!(storage.import_vehicles(&batch).unwrap(), 2);
        assert_eq!(storage.list_vehicles(None, None).unwrap().len(), 2);

        assert_eq!(storage.delete_all_vehicles().unwrap(), 2);
        assert!(storage.list_vehicles(None, None).unwrap().is_empty());
    }

    #[test]
    fn test_import_is_all_or_nothing() {
        let mut storage = storage();
        let batch = vec![new_vehicle("A", "X", 1), new_vehicle("B", "Y", -1)];
        assert!(storage.import_vehicles(&batch).is_err());
        assert!(storage.list_vehicles(None, None).unwrap().is_empty());
    }
}
