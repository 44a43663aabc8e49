//! Authentication and authorization.
//!
//! Passwords are stored as Argon2 hashes, sessions are stateless signed
//! tokens, and [`AuthUser`] guards protected routes.

mod guard;
pub mod password;
pub mod token;

pub use guard::AuthUser;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenSigner};
