//! `dealership` - Backend for a vehicle dealership storefront and back office
//!
//! This library provides the storage, authentication and HTTP API behind the
//! `dealerd` binary: a vehicle catalog, customer orders with stock
//! accounting, staff accounts with role and permission checks, and a contact
//! form.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod model;
pub mod seed;
pub mod storage;
pub mod validation;

pub use config::Config;
pub use error::{Error, Result};
pub use http::{build_router, serve, AppState};
pub use logging::init_logging;
pub use storage::{Storage, StorageStats};
