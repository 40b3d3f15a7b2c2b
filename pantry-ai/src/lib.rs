//! pantry-ai library interface
//!
//! Multi-modal recipe orchestration: temporary assets, inference
//! capabilities, modality processors, agent tools, the orchestrator, and the
//! HTTP surface around them.

pub mod api;
pub mod assets;
pub mod config;
pub mod db;
pub mod error;
pub mod inference;
pub mod orchestrator;
pub mod processors;
pub mod services;
pub mod tools;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use chrono::{DateTime, Utc};
use pantry_common::auth::Authenticator;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::orchestrator::Orchestrator;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    pub orchestrator: Arc<Orchestrator>,
    pub authenticator: Arc<dyn Authenticator>,
    /// Largest accepted request body in bytes
    pub max_request_bytes: usize,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        orchestrator: Arc<Orchestrator>,
        authenticator: Arc<dyn Authenticator>,
        max_request_bytes: usize,
    ) -> Self {
        Self {
            db,
            orchestrator,
            authenticator,
            max_request_bytes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_request_bytes);

    Router::new()
        .merge(api::ai_routes())
        .merge(api::recipe_routes())
        .merge(api::preference_routes())
        .merge(api::health_routes())
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the web client origins; invalid origins are skipped
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
