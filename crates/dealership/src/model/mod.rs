//! Core domain types for dealership.
//!
//! Records returned by storage serialize to the JSON shape the storefront
//! frontend consumes (`_id`, camelCase fields). The `*Input` types are the
//! raw request bodies; they validate into the `New*`/`*Patch` types that
//! storage accepts.

pub mod feedback;
pub mod order;
pub mod user;
pub mod vehicle;

pub use feedback::{Feedback, FeedbackInput, NewFeedback};
pub use order::{
    CustomerSummary, NewOrder, Order, OrderCustomer, OrderInput, OrderItem, OrderLine,
    OrderStatus, ShippingInfo, StatusInput,
};
pub use user::{
    LoginInput, NewUser, Permission, Permissions, PermissionsInput, ProfileInput, RegisterInput, Role,
    User, UserInput, UserPatch,
};
pub use vehicle::{NewVehicle, Vehicle, VehicleInput, VehiclePatch, VehicleType};
