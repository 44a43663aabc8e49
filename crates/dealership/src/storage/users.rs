//! User account operations.
//!
//! Storage never sees plaintext passwords: callers hash them first and pass
//! the PHC string in.

use chrono::Utc;
use rusqlite::{params, ErrorCode, OptionalExtension, Row};
use tracing::{debug, warn};

use super::{format_timestamp, parse_timestamp, Storage};
use crate::error::{Error, Result};
use crate::model::{NewUser, Permissions, Role, User, UserPatch};

const USER_COLUMNS: &str = "id, name, email, role, can_access_dashboard, \
                            can_create, can_update, can_delete, created_at, password_hash";

/// A user together with the stored password hash, for login checks.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    /// The account.
    pub user: User,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl Storage {
    /// Create a user account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEmail`] if the email is taken, or an error
    /// if the database operation fails.
    pub fn create_user(&self, user: &NewUser, password_hash: &str) -> Result<User> {
        self.conn
            .execute(
                r"
                INSERT INTO users
                    (name, email, password_hash, role, can_access_dashboard,
                     can_create, can_update, can_delete, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
                params![
                    user.name,
                    user.email,
                    password_hash,
                    user.role.as_str(),
                    user.can_access_dashboard,
                    user.permissions.can_create,
                    user.permissions.can_update,
                    user.permissions.can_delete,
                    format_timestamp(Utc::now()),
                ],
            )
            .map_err(map_unique_email)?;

        let id = self.conn.last_insert_rowid();
        debug!("Created {} account with id {}", user.role, id);
        self.get_user(id)?
            .ok_or_else(|| Error::internal(format!("user {id} vanished after insert")))
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
        let user = self.conn.query_row(&sql, [id], row_to_user).optional()?;
        Ok(user)
    }

    /// Look up an account and its password hash by (normalized) email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
        let credentials = self
            .conn
            .query_row(&sql, [email], |row| {
                Ok(UserCredentials {
                    user: row_to_user(row)?,
                    password_hash: row.get(9)?,
                })
            })
            .optional()?;
        Ok(credentials)
    }

    /// List every account in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY id ASC");
        let mut stmt = self.conn.prepare(&sql)?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(users)
    }

    /// Apply a partial update.
    ///
    /// `patch.password` is ignored; pass the new hash as `password_hash`.
    /// Returns `None` if no user has that id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateEmail`] if the new email is taken, or an
    /// error if the database operation fails.
    pub fn update_user(
        &self,
        id: i64,
        patch: &UserPatch,
        password_hash: Option<&str>,
    ) -> Result<Option<User>> {
        let Some(current) = self.get_user(id)? else {
            return Ok(None);
        };

        let permissions = patch
            .permissions
            .map_or(current.permissions, |p| p.apply(current.permissions));
        let merged = User {
            name: patch.name.clone().unwrap_or(current.name),
            email: patch.email.clone().unwrap_or(current.email),
            role: patch.role.unwrap_or(current.role),
            can_access_dashboard: patch
                .can_access_dashboard
                .unwrap_or(current.can_access_dashboard),
            permissions,
            ..current
        };

        self.conn
            .execute(
                r"
                UPDATE users
                SET name = ?1, email = ?2, role = ?3, can_access_dashboard = ?4,
                    can_create = ?5, can_update = ?6, can_delete = ?7,
                    password_hash = COALESCE(?8, password_hash)
                WHERE id = ?9
                ",
                params![
                    merged.name,
                    merged.email,
                    merged.role.as_str(),
                    merged.can_access_dashboard,
                    merged.permissions.can_create,
                    merged.permissions.can_update,
                    merged.permissions.can_delete,
                    password_hash,
                    id,
                ],
            )
            .map_err(map_unique_email)?;
        debug!("Updated user {}", id);
        Ok(Some(merged))
    }

    /// Delete a user by ID. Their orders are kept.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        if affected > 0 {
            debug!("Deleted user {}", id);
        }
        Ok(affected > 0)
    }
}

fn map_unique_email(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateEmail
        }
        _ => err.into(),
    }
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    let role_str: String = row.get(3)?;
    let role = role_str.parse().unwrap_or_else(|_| {
        warn!("Unknown role: {}, defaulting to customer", role_str);
        Role::Customer
    });
    let created_at: String = row.get(8)?;

    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role,
        can_access_dashboard: row.get(4)?,
        permissions: Permissions {
            can_create: row.get(5)?,
            can_update: row.get(6)?,
            can_delete: row.get(7)?,
        },
        created_at: parse_timestamp(&created_at),
    })
}
