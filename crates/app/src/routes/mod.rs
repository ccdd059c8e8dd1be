//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health               - Liveness
//! GET    /health/ready         - Readiness (pings the database)
//!
//! # Styles
//! GET    /app/styles           - Styles page (HTML)
//! POST   /app/styles           - Create / update / delete (form `_action`), redirects back
//! GET    /api/styles           - List styles (JSON)
//!
//! # Product base variants
//! GET    /app/variants         - Variants page (HTML)
//! GET    /api/variants         - List variants (JSON)
//! POST   /api/variants         - Create variant
//! PATCH  /api/variants/{id}    - Update variant
//! DELETE /api/variants/{id}    - Delete variant
//!
//! # Uploads
//! POST   /api/uploads          - Upload an example image
//! ```
//!
//! Every route except the health checks requires a Shopify session token.

pub mod styles;
pub mod uploads;
pub mod variants;

use axum::{Router, extract::State, http::StatusCode, http::Uri, routing::get};

use crate::error::AppError;
use crate::state::AppState;

/// Build the application router (without outer layers).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(styles::router())
        .merge(variants::router())
        .merge(uploads::router())
        .fallback(not_found)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };
    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_owned())
}
