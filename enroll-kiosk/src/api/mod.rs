//! HTTP API handlers for enroll-kiosk
//!
//! Presentation boundary: every workflow action returns the fresh
//! [`WorkflowView`](crate::workflow::WorkflowView).

pub mod health;
pub mod results;
pub mod sse;
pub mod workflow;

pub use health::health_routes;
pub use results::results_routes;
pub use sse::event_stream;
pub use workflow::workflow_routes;

use crate::ApiError;
use axum::http::Uri;

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}
