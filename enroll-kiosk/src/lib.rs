//! enroll-kiosk library interface
//!
//! Enrollment capture and submission workflow: camera capture session,
//! roster-autofilled form, multipart submission pipeline, and the workflow
//! controller behind the kiosk's HTTP presentation boundary.

pub mod api;
pub mod capture;
pub mod error;
pub mod form;
pub mod results;
pub mod submission;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use enroll_common::events::EventBus;
use results::ResultsClient;
use std::sync::Arc;
use workflow::Workflow;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub workflow: Workflow,
    pub results: Arc<ResultsClient>,
    /// Event bus feeding the SSE stream
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(workflow: Workflow, results: ResultsClient, event_bus: EventBus) -> Self {
        Self {
            workflow,
            results: Arc::new(results),
            event_bus,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .merge(api::workflow_routes())
        .merge(api::results_routes())
        .merge(api::health_routes())
        .route("/events", get(api::event_stream))
        .fallback(api::not_found)
        .with_state(state)
}
