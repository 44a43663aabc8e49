//! The authenticated-user extractor and its role and permission checks.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

use crate::error::{Error, Result};
use crate::http::AppState;
use crate::model::{Permission, Role, User};

/// The caller of a protected route.
///
/// Extraction reads `Authorization: Bearer <token>`, verifies the token and
/// loads the account. Any failure rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(Error::not_authorized)?;

        let claims = state.tokens.verify(token)?;
        let user = state.storage()?.get_user(claims.id)?;
        match user {
            Some(user) => Ok(Self(user)),
            None => {
                debug!(user_id = claims.id, "token refers to a deleted account");
                Err(Error::not_authorized())
            }
        }
    }
}

impl AuthUser {
    /// Require one of `roles`.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error naming the caller's role otherwise.
    pub fn authorize(&self, roles: &[Role]) -> Result<()> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "User role '{}' is not authorized to access this route",
                self.0.role
            )))
        }
    }

    /// Require `permission`: admins always pass, staff pass when the flag is set.
    ///
    /// # Errors
    ///
    /// Returns a forbidden error naming the permission otherwise.
    pub fn check_permission(&self, permission: Permission) -> Result<()> {
        let allowed = match self.0.role {
            Role::Admin => true,
            Role::User => self.0.permissions.allows(permission),
            Role::Customer => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "User does not have the '{}' permission.",
                permission.key()
            )))
        }
    }

    /// The caller's user id.
    #[must_use]
    pub fn id(&self) -> i64 {
        self.0.id
    }

    /// Whether the caller is an admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.0.is_admin()
    }
}
