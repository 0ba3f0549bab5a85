//! Papersmith HTTP API Server
//!
//! Registers HTML templates and exports them as PDF documents.
//!
//! - `POST /templates`: multipart form with `template` (name) and `file`
//! - `POST /export`: JSON `{template, file_name, data}`, responds with a PDF
//! - `GET /health`

use axum::{Router, extract::DefaultBodyLimit};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;

pub use state::AppState;

/// Create the main application router
pub fn create_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::templates::router())
        .merge(routes::export::router())
        .method_not_allowed_fallback(error::method_not_allowed)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit_bytes)),
        )
        .with_state(state)
}
