//! Response envelopes and request extractors.
//!
//! Successful responses are `{success: true, data}` (plus `count` for lists).
//! Extractor rejections are turned into the crate [`Error`] so malformed
//! input gets the same `{success: false, message}` body as everything else.

use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Role;

/// The success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<usize>,
    data: T,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// `200 {success, data}`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
            status: StatusCode::OK,
        }
    }

    /// `201 {success, data}`.
    pub fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::ok(data)
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// `200 {success, count, data}`.
    pub fn list(items: Vec<T>) -> Self {
        Self {
            count: Some(items.len()),
            ..Self::ok(items)
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// `{success, token, role}`, returned by register and login.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    success: bool,
    token: String,
    role: Role,
    #[serde(skip)]
    status: StatusCode,
}

impl TokenResponse {
    /// A token response with the given status.
    pub fn new(status: StatusCode, token: String, role: Role) -> Self {
        Self {
            success: true,
            token,
            role,
            status,
        }
    }
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// The empty object returned by deletes.
#[derive(Debug, Serialize)]
pub struct Empty {}

/// A JSON request body whose rejection is a 400 with the parser message.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(Error::bad_request(rejection.body_text())),
        }
    }
}

/// A positive integer `{id}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for PathId {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| Error::bad_request(rejection.body_text()))?;
        parse_id(&raw).map(Self)
    }
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| Error::bad_request(format!("Invalid id: {raw}")))
}
