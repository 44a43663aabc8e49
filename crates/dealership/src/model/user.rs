//! User accounts, roles and staff permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::validation::{escape_html, Validator};

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access to every administrative route.
    Admin,
    /// Staff member; access is governed by [`Permissions`].
    User,
    /// Storefront customer.
    #[default]
    Customer,
}

impl Role {
    /// The stored and serialized label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
            Self::Customer => "customer",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            "customer" => Ok(Self::Customer),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// A named staff permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Add vehicles.
    Create,
    /// Edit vehicles.
    Update,
    /// Remove vehicles.
    Delete,
}

impl Permission {
    /// The JSON key of this permission.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Create => "canCreate",
            Self::Update => "canUpdate",
            Self::Delete => "canDelete",
        }
    }
}

/// Permission flags granted to a staff account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Permissions {
    /// May add vehicles.
    pub can_create: bool,
    /// May edit vehicles.
    pub can_update: bool,
    /// May remove vehicles.
    pub can_delete: bool,
}

impl Permissions {
    /// Every permission granted.
    #[must_use]
    pub fn all() -> Self {
        Self {
            can_create: true,
            can_update: true,
            can_delete: true,
        }
    }

    /// Whether `permission` is granted.
    #[must_use]
    pub fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::Create => self.can_create,
            Permission::Update => self.can_update,
            Permission::Delete => self.can_delete,
        }
    }
}

/// Partial permission update; absent flags keep their value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsInput {
    /// New `canCreate`.
    pub can_create: Option<bool>,
    /// New `canUpdate`.
    pub can_update: Option<bool>,
    /// New `canDelete`.
    pub can_delete: Option<bool>,
}

impl PermissionsInput {
    /// Apply this update on top of `current`.
    #[must_use]
    pub fn apply(&self, current: Permissions) -> Permissions {
        Permissions {
            can_create: self.can_create.unwrap_or(current.can_create),
            can_update: self.can_update.unwrap_or(current.can_update),
            can_delete: self.can_delete.unwrap_or(current.can_delete),
        }
    }
}

/// A user account as exposed over the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Storage-assigned identifier.
    #[serde(rename = "_id")]
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Normalized email address.
    pub email: String,
    /// Account role.
    pub role: Role,
    /// Whether a staff account may open the admin dashboard.
    pub can_access_dashboard: bool,
    /// Staff permission flags.
    pub permissions: Permissions,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this user is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A validated account ready to insert. The password is still plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Display name.
    pub name: String,
    /// Normalized email.
    pub email: String,
    /// Plaintext password, hashed before storage.
    pub password: String,
    /// Account role.
    pub role: Role,
    /// Dashboard access flag.
    pub can_access_dashboard: bool,
    /// Staff permissions.
    pub permissions: Permissions,
}

/// A validated partial account update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    /// New name.
    pub name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New plaintext password, hashed before storage.
    pub password: Option<String>,
    /// New role.
    pub role: Option<Role>,
    /// New dashboard access flag.
    pub can_access_dashboard: Option<bool>,
    /// Permission changes.
    pub permissions: Option<PermissionsInput>,
}

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterInput {
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Requested role. Self-registration always yields a customer.
    pub role: Option<String>,
}

impl RegisterInput {
    /// Validate a self-registration.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing each invalid field.
    pub fn validate(self) -> Result<NewUser> {
        let mut v = Validator::new();
        let name = v.required("name", self.name.as_deref(), "Name is required");
        let email = v.email("email", self.email.as_deref(), "Please include a valid email");
        let password = v.min_len(
            "password",
            self.password.as_deref(),
            MIN_PASSWORD_LEN,
            "Password must be 6 or more characters",
        );
        v.finish()?;

        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(Error::internal("validator accepted a registration with missing fields"));
        };
        Ok(NewUser {
            name: escape_html(&name),
            email,
            password,
            role: Role::Customer,
            can_access_dashboard: false,
            permissions: Permissions::default(),
        })
    }
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginInput {
    /// Email address.
    pub email: Option<String>,
    /// Password.
    pub password: Option<String>,
}

impl LoginInput {
    /// Validate credentials, returning the normalized email and the password.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing each invalid field.
    pub fn validate(self) -> Result<(String, String)> {
        let mut v = Validator::new();
        let email = v.email("email", self.email.as_deref(), "Please include a valid email");
        v.check(self.password.is_some(), "password", "Password is required");
        v.finish()?;

        match (email, self.password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(Error::internal("validator accepted a login with missing fields")),
        }
    }
}

/// Body of the admin user routes (`POST /api/users`, `PUT /api/users/{id}`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Role label.
    pub role: Option<String>,
    /// Dashboard access flag.
    pub can_access_dashboard: Option<bool>,
    /// Permission flags.
    pub permissions: Option<PermissionsInput>,
}

impl UserInput {
    /// Validate an account created by an administrator.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing each invalid field.
    pub fn into_new(self) -> Result<NewUser> {
        let mut v = Validator::new();
        let name = v.required("name", self.name.as_deref(), "Name is required");
        let email = v.email("email", self.email.as_deref(), "Please include a valid email");
        let password = v.min_len(
            "password",
            self.password.as_deref(),
            MIN_PASSWORD_LEN,
            "Password must be 6 or more characters",
        );
        let role = parse_role(&mut v, self.role.as_deref()).unwrap_or_default();
        v.finish()?;

        let (Some(name), Some(email), Some(password)) = (name, email, password) else {
            return Err(Error::internal("validator accepted a user with missing fields"));
        };
        Ok(NewUser {
            name: escape_html(&name),
            email,
            password,
            role,
            can_access_dashboard: self.can_access_dashboard.unwrap_or(false),
            permissions: self
                .permissions
                .map(|p| p.apply(Permissions::default()))
                .unwrap_or_default(),
        })
    }

    /// Validate an administrator's partial update.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing each invalid field.
    pub fn into_patch(self) -> Result<UserPatch> {
        let mut v = Validator::new();
        let patch = UserPatch {
            name: v
                .optional("name", self.name.as_deref(), "Name is required")
                .map(|n| escape_html(&n)),
            email: self
                .email
                .as_deref()
                .and_then(|e| v.email("email", Some(e), "Please include a valid email")),
            password: self.password.as_deref().and_then(|p| {
                v.min_len(
                    "password",
                    Some(p),
                    MIN_PASSWORD_LEN,
                    "Password must be 6 or more characters",
                )
            }),
            role: parse_role(&mut v, self.role.as_deref()),
            can_access_dashboard: self.can_access_dashboard,
            permissions: self.permissions,
        };
        v.finish()?;
        Ok(patch)
    }
}

/// Body of `PUT /api/users/profile`. Only identity fields are editable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// New password.
    pub password: Option<String>,
}

impl ProfileInput {
    /// Validate a self-service profile update.
    ///
    /// # Errors
    ///
    /// Returns a validation error listing each invalid field.
    pub fn into_patch(self) -> Result<UserPatch> {
        UserInput {
            name: self.name,
            email: self.email,
            password: self.password.filter(|p| !p.is_empty()),
            ..UserInput::default()
        }
        .into_patch()
    }
}

fn parse_role(v: &mut Validator, raw: Option<&str>) -> Option<Role> {
    let raw = raw?;
    match raw.parse() {
        Ok(role) => Some(role),
        Err(_) => {
            v.fail("role", "Role must be one of admin, user, customer");
            None
        }
    }
}
