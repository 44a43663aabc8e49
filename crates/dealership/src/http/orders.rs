use axum::extract::State;
use tracing::info;

use super::response::{ApiResponse, Empty, JsonBody, PathId};
use super::AppState;
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::model::{Order, OrderInput, Role, StatusInput};

/// `GET /api/orders`
pub(super) async fn list_orders(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<ApiResponse<Vec<Order>>> {
    caller.authorize(&[Role::Admin])?;
    let orders = state.storage()?.list_orders()?;
    Ok(ApiResponse::list(orders))
}

/// `POST /api/orders`
///
/// Only customers place orders. Stock for every line is checked and
/// decremented in one transaction.
pub(super) async fn create_order(
    State(state): State<AppState>,
    caller: AuthUser,
    JsonBody(input): JsonBody<OrderInput>,
) -> Result<ApiResponse<Order>> {
    caller.authorize(&[Role::Customer])?;
    let new_order = input.validate()?;
    let order = state.storage()?.place_order(caller.id(), &new_order)?;
    Ok(ApiResponse::created(order))
}

/// `GET /api/orders/my-orders`
pub(super) async fn my_orders(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<ApiResponse<Vec<Order>>> {
    let orders = state.storage()?.list_orders_for_user(caller.id())?;
    Ok(ApiResponse::list(orders))
}

/// `GET /api/orders/{id}`
///
/// Admins see any order. Everyone else only their own.
pub(super) async fn get_order(
    State(state): State<AppState>,
    caller: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<Order>> {
    let order = state.storage()?.get_order(id)?;
    let order = order.ok_or(Error::NotFound("Order"))?;
    if !caller.is_admin() && !order.is_owned_by(caller.id()) {
        return Err(Error::forbidden("Not authorized to view this order"));
    }
    Ok(ApiResponse::ok(order))
}

/// `PUT /api/orders/{id}`
pub(super) async fn update_order(
    State(state): State<AppState>,
    caller: AuthUser,
    PathId(id): PathId,
    JsonBody(input): JsonBody<StatusInput>,
) -> Result<ApiResponse<Order>> {
    caller.authorize(&[Role::Admin])?;
    let status = input.validate()?;
    let order = state.storage()?.update_order_status(id, status)?;
    let order = order.ok_or(Error::NotFound("Order"))?;
    info!(order_id = id, status = %status, "Order status updated");
    Ok(ApiResponse::ok(order))
}

/// `DELETE /api/orders/{id}`
pub(super) async fn delete_order(
    State(state): State<AppState>,
    caller: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<Empty>> {
    caller.authorize(&[Role::Admin])?;
    let deleted = state.storage()?.delete_order(id)?;
    if !deleted {
        return Err(Error::NotFound("Order"));
    }
    info!(order_id = id, by = caller.id(), "Order deleted");
    Ok(ApiResponse::ok(Empty {}))
}
