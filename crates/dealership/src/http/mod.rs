//! HTTP API for dealership.
//!
//! [`build_router`] assembles every `/api` route, static image serving, CORS
//! and request tracing around a shared [`AppState`]. [`serve`] binds it and
//! runs until Ctrl-C or SIGTERM.

mod auth;
mod feedback;
mod middleware;
mod orders;
mod response;
mod users;
mod vehicles;

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::auth::TokenSigner;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::Storage;

pub use response::{JsonBody, PathId};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    storage: Arc<Mutex<Storage>>,
    /// Issues and verifies bearer tokens.
    pub tokens: Arc<TokenSigner>,
    /// Effective configuration.
    pub config: Arc<Config>,
    request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    /// Build the state from an open store and a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no usable signing secret is set.
    pub fn new(storage: Storage, config: Config) -> Result<Self> {
        let tokens = TokenSigner::new(config.jwt_secret()?, config.token_ttl());
        Ok(Self {
            storage: Arc::new(Mutex::new(storage)),
            tokens: Arc::new(tokens),
            config: Arc::new(config),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        })
    }

    /// Lock the store.
    ///
    /// The guard must not be held across an `.await`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if a previous holder panicked.
    pub fn storage(&self) -> Result<MutexGuard<'_, Storage>> {
        self.storage
            .lock()
            .map_err(|_| Error::internal("storage lock poisoned"))
    }

    /// Directory uploaded images are written to and served from.
    #[must_use]
    pub fn uploads_dir(&self) -> PathBuf {
        self.config.uploads_dir()
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route(
            "/vehicles",
            get(vehicles::list_vehicles).post(vehicles::create_vehicle),
        )
        .route(
            "/vehicles/{id}",
            get(vehicles::get_vehicle)
                .put(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/profile", put(users::update_profile))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/orders",
            get(orders::list_orders).post(orders::create_order),
        )
        .route("/orders/my-orders", get(orders::my_orders))
        .route(
            "/orders/{id}",
            get(orders::get_order)
                .put(orders::update_order)
                .delete(orders::delete_order),
        )
        .route("/feedback", post(feedback::create_feedback))
        .route("/feedback/admin", get(feedback::list_feedback));

    Router::new()
        .route("/", get(root))
        .nest("/api", api)
        .nest_service("/images", ServeDir::new(state.uploads_dir()))
        .layer(DefaultBodyLimit::max(state.config.uploads.max_bytes))
        .layer(cors_layer(&state.config))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::request_tracing,
        ))
        .with_state(state)
}

async fn root() -> &'static str {
    "API is running..."
}

/// Run CPU-heavy work (password hashing) off the async workers.
async fn blocking<T, F>(work: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| Error::internal(format!("blocking task failed: {e}")))?
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Bind the configured address and serve until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the address can't be bound, the upload directory
/// can't be created, or the server fails.
pub async fn serve(state: AppState) -> Result<()> {
    let uploads = state.uploads_dir();
    std::fs::create_dir_all(&uploads).map_err(|source| Error::DirectoryCreate {
        path: uploads.clone(),
        source,
    })?;

    let addr = state.config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(
        addr = %listener.local_addr()?,
        uploads = %uploads.display(),
        "Server is running"
    );

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("failed to install signal handlers, falling back to Ctrl-C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("Shutdown signal received");
}
