use std::path::Path;

use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Query, Request, State};
use axum::http::header::CONTENT_TYPE;
use serde::Deserialize;
use tracing::{debug, info};

use super::response::{ApiResponse, Empty, JsonBody, PathId};
use super::AppState;
use crate::auth::AuthUser;
use crate::error::{Error, Result};
use crate::model::{Permission, Role, Vehicle, VehicleInput};

/// Accepted image extensions for uploads.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Query string of `GET /api/vehicles`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ListQuery {
    keyword: Option<String>,
    limit: Option<String>,
}

/// `GET /api/vehicles`
pub(super) async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<ApiResponse<Vec<Vehicle>>> {
    let limit = match query.limit.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<usize>()
                .map_err(|_| Error::bad_request(format!("Invalid limit: {raw}")))?,
        ),
    };
    let vehicles = state
        .storage()?
        .list_vehicles(query.keyword.as_deref(), limit)?;
    Ok(ApiResponse::list(vehicles))
}

/// `GET /api/vehicles/{id}`
pub(super) async fn get_vehicle(
    State(state): State<AppState>,
    PathId(id): PathId,
) -> Result<ApiResponse<Vehicle>> {
    let vehicle = state.storage()?.get_vehicle(id)?;
    vehicle
        .map(ApiResponse::ok)
        .ok_or(Error::NotFound("Vehicle"))
}

/// An image file received in a multipart form.
struct Upload {
    extension: String,
    bytes: Bytes,
}

impl Upload {
    /// Content-addressed file name, so re-uploading the same image reuses it.
    fn file_name(&self) -> String {
        let digest = blake3::hash(&self.bytes).to_hex();
        format!("vehicle-{}.{}", &digest.as_str()[..16], self.extension)
    }
}

/// `POST /api/vehicles`
///
/// Accepts `multipart/form-data` with an `image` file part, or JSON whose
/// `image` is an existing URL.
pub(super) async fn create_vehicle(
    State(state): State<AppState>,
    caller: AuthUser,
    request: Request,
) -> Result<ApiResponse<Vehicle>> {
    caller.authorize(&[Role::Admin])?;

    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));

    let (mut input, upload) = if is_multipart {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|rejection| Error::bad_request(rejection.body_text()))?;
        read_vehicle_form(multipart).await?
    } else {
        let JsonBody(input) = JsonBody::<VehicleInput>::from_request(request, &state).await?;
        (input, None)
    };

    let file_name = upload.as_ref().map(Upload::file_name);
    if let Some(file_name) = &file_name {
        input.image = Some(format!("/images/{file_name}"));
    }
    let has_image = input
        .image
        .as_deref()
        .is_some_and(|image| !image.trim().is_empty());
    if !has_image {
        return Err(Error::bad_request("Please upload an image"));
    }
    let new_vehicle = input.into_new()?;

    if let (Some(upload), Some(file_name)) = (upload, file_name) {
        save_upload(&state.uploads_dir(), &file_name, &upload.bytes).await?;
    }

    let vehicle = state.storage()?.insert_vehicle(&new_vehicle)?;
    info!(vehicle_id = vehicle.id, name = %vehicle.name, "Vehicle created");
    Ok(ApiResponse::created(vehicle))
}

async fn read_vehicle_form(mut multipart: Multipart) -> Result<(VehicleInput, Option<Upload>)> {
    let mut input = VehicleInput::default();
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" && field.file_name().is_some() {
            let extension = field
                .file_name()
                .and_then(|f| Path::new(f).extension())
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase)
                .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
                .ok_or_else(|| {
                    Error::bad_request(format!(
                        "Images only ({})",
                        IMAGE_EXTENSIONS.join(", ")
                    ))
                })?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| Error::bad_request(e.body_text()))?;
            if bytes.is_empty() {
                return Err(Error::bad_request("Please upload an image"));
            }
            upload = Some(Upload { extension, bytes });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| Error::bad_request(e.body_text()))?;
            input.set_text_field(&name, value);
        }
    }
    Ok((input, upload))
}

async fn save_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| Error::DirectoryCreate {
            path: dir.to_path_buf(),
            source,
        })?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await?;
    debug!(path = %path.display(), size = bytes.len(), "Stored uploaded image");
    Ok(())
}

/// `PUT /api/vehicles/{id}`
pub(super) async fn update_vehicle(
    State(state): State<AppState>,
    caller: AuthUser,
    PathId(id): PathId,
    JsonBody(input): JsonBody<VehicleInput>,
) -> Result<ApiResponse<Vehicle>> {
    caller.check_permission(Permission::Update)?;
    let patch = input.into_patch()?;
    let vehicle = state.storage()?.update_vehicle(id, &patch)?;
    vehicle
        .map(ApiResponse::ok)
        .ok_or(Error::NotFound("Vehicle"))
}

/// `DELETE /api/vehicles/{id}`
pub(super) async fn delete_vehicle(
    State(state): State<AppState>,
    caller: AuthUser,
    PathId(id): PathId,
) -> Result<ApiResponse<Empty>> {
    caller.check_permission(Permission::Delete)?;
    let deleted = state.storage()?.delete_vehicle(id)?;
    if !deleted {
        return Err(Error::NotFound("Vehicle"));
    }
    info!(vehicle_id = id, by = caller.id(), "Vehicle deleted");
    Ok(ApiResponse::ok(Empty {}))
}
