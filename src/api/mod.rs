//! HTTP API: routing, request binding and error mapping.
//!
//! Request bodies are validated here, before they reach the planner.

pub mod error;
mod health;
mod shifts;
mod workers;

pub use error::{ApiError, ErrorBody};
pub use shifts::ListShiftsQuery;
pub use workers::ListWorkersQuery;

use std::future::Future;

use axum::{Router, http::StatusCode};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::planner::Planner;
use crate::repository::Repository;

/// Create the API router with all routes and middleware.
pub fn create_router<R: Repository>(planner: Planner<R>) -> Router {
    Router::new()
        .merge(health::routes::<R>())
        .merge(workers::routes::<R>())
        .merge(shifts::routes::<R>())
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        .with_state(planner)
}

/// Serve the API until `shutdown` resolves, then drain in-flight requests.
pub async fn serve<R: Repository>(
    listener: TcpListener,
    planner: Planner<R>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, create_router(planner))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn not_found() -> ApiError {
    ApiError::not_found("404 page not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed")
}
