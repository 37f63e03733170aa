// crates/server/src/lib.rs
//! Peek-a-Boo Boxing tracker server library.
//!
//! This crate provides the Axum-based HTTP server: a JSON API over the
//! training plan, the progress log, settings, exports and database backups.

pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::*;
pub use metrics::{init_metrics, render_metrics};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes under `/api`
/// - The Prometheus `/metrics` endpoint
/// - CORS (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state.clone()))
        .merge(routes::metrics::router().with_state(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
