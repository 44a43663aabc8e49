//! Operator tasks behind the `admin` and `seed` subcommands.
//!
//! These work directly on a [`Storage`] and never go through HTTP.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::auth::hash_password;
use crate::error::{Error, FieldError, Result};
use crate::model::{NewUser, NewVehicle, Permissions, Role, User, UserInput, VehicleInput};
use crate::storage::Storage;

/// Email of the bootstrap administrator.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
/// Password of the bootstrap administrator.
pub const DEFAULT_ADMIN_PASSWORD: &str = "password123";
/// Display name of the bootstrap administrator.
pub const DEFAULT_ADMIN_NAME: &str = "Admin User";

/// Result of [`create_admin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    /// A new administrator was created.
    Created(User),
    /// An account with that email already existed and was left untouched.
    Existing(User),
}

/// Create an administrator unless the email is already registered.
///
/// # Errors
///
/// Returns a validation error for a bad email or short password, or an
/// error if hashing or the database operation fails.
pub fn create_admin(
    storage: &Storage,
    email: &str,
    password: &str,
    name: &str,
) -> Result<AdminOutcome> {
    let input = UserInput {
        name: Some(name.to_string()),
        email: Some(email.to_string()),
        password: Some(password.to_string()),
        role: Some(Role::Admin.as_str().to_string()),
        ..Default::default()
    };
    let new_user = NewUser {
        can_access_dashboard: true,
        permissions: Permissions::all(),
        ..input.into_new()?
    };

    if let Some(existing) = storage.find_user_by_email(&new_user.email)? {
        info!(email = %new_user.email, "Admin account already exists");
        return Ok(AdminOutcome::Existing(existing.user));
    }

    let hash = hash_password(&new_user.password)?;
    let user = storage.create_user(&new_user, &hash)?;
    info!(user_id = user.id, email = %user.email, "Created admin account");
    Ok(AdminOutcome::Created(user))
}

/// Parse a JSON array of vehicles and validate every entry.
///
/// Field errors are prefixed with the entry index, e.g. `[3].price`.
///
/// # Errors
///
/// Returns a JSON error for malformed input, or a validation error
/// listing every invalid field of every entry.
pub fn parse_vehicles(json: &str) -> Result<Vec<NewVehicle>> {
    let inputs: Vec<VehicleInput> = serde_json::from_str(json)?;
    let mut vehicles = Vec::with_capacity(inputs.len());
    let mut errors = Vec::new();
    for (i, input) in inputs.into_iter().enumerate() {
        match input.into_new() {
            Ok(vehicle) => vehicles.push(vehicle),
            Err(Error::Validation(fields)) => {
                errors.extend(fields.into_iter().map(|f| FieldError {
                    path: format!("[{i}].{}", f.path),
                    ..f
                }));
            }
            Err(other) => return Err(other),
        }
    }
    if errors.is_empty() {
        Ok(vehicles)
    } else {
        Err(Error::Validation(errors))
    }
}

/// Import the vehicles in a JSON file. Nothing is written unless every
/// entry is valid.
///
/// # Errors
///
/// Returns an error if the file can't be read, fails validation, or the
/// database operation fails.
pub fn import_vehicles_file(storage: &mut Storage, path: &Path) -> Result<usize> {
    let json = fs::read_to_string(path)?;
    let vehicles = parse_vehicles(&json)?;
    let imported = storage.import_vehicles(&vehicles)?;
    info!(count = imported, file = %path.display(), "Imported vehicles");
    Ok(imported)
}

/// Remove every vehicle.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub fn destroy_vehicles(storage: &Storage) -> Result<usize> {
    let removed = storage.delete_all_vehicles()?;
    info!(count = removed, "Destroyed vehicle data");
    Ok(removed)
}
