//! Workflow action endpoints
//!
//! Actions not available in the current state are inert: the handler still
//! answers 200 with the unchanged view.

use crate::form::FieldName;
use crate::workflow::WorkflowView;
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use enroll_common::config::Facing;
use serde::Deserialize;
use tracing::debug;

/// `{"name": "matricula", "value": "001122"}`
#[derive(Debug, Deserialize)]
pub struct SetFieldRequest {
    pub name: String,
    pub value: String,
}

/// `{"facing": "back"}`
#[derive(Debug, Deserialize)]
pub struct FacingRequest {
    pub facing: Facing,
}

/// GET /api/workflow
pub async fn get_view(State(state): State<AppState>) -> Json<WorkflowView> {
    Json(state.workflow.view().await)
}

/// POST /api/workflow/snapshot
pub async fn snapshot(State(state): State<AppState>) -> Json<WorkflowView> {
    if !state.workflow.snapshot().await {
        debug!("snapshot not applied");
    }
    Json(state.workflow.view().await)
}

/// POST /api/workflow/discard
pub async fn discard(State(state): State<AppState>) -> Json<WorkflowView> {
    if !state.workflow.discard().await {
        debug!("discard not applied");
    }
    Json(state.workflow.view().await)
}

/// POST /api/workflow/field
///
/// **Errors:** 400 for a field name other than nome/cpf/matricula/curso
pub async fn set_field(
    State(state): State<AppState>,
    Json(request): Json<SetFieldRequest>,
) -> ApiResult<Json<WorkflowView>> {
    let name: FieldName = request.name.parse().map_err(ApiError::BadRequest)?;
    if !state.workflow.set_field(name, request.value).await {
        debug!(field = %name, "field edit not applied");
    }
    Ok(Json(state.workflow.view().await))
}

/// POST /api/workflow/submit
///
/// Answers once the submission resolved (or was refused by validation).
pub async fn submit(State(state): State<AppState>) -> Json<WorkflowView> {
    let outcome = state.workflow.submit().await;
    debug!(?outcome, "submit handled");
    Json(state.workflow.view().await)
}

/// POST /api/workflow/acknowledge
pub async fn acknowledge(State(state): State<AppState>) -> Json<WorkflowView> {
    if !state.workflow.acknowledge_result().await {
        debug!("acknowledge not applied");
    }
    Json(state.workflow.view().await)
}

/// POST /api/workflow/facing
pub async fn switch_facing(
    State(state): State<AppState>,
    Json(request): Json<FacingRequest>,
) -> Json<WorkflowView> {
    if !state.workflow.switch_facing(request.facing).await {
        debug!(facing = %request.facing, "facing switch not applied");
    }
    Json(state.workflow.view().await)
}

pub fn workflow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/workflow", get(get_view))
        .route("/api/workflow/snapshot", post(snapshot))
        .route("/api/workflow/discard", post(discard))
        .route("/api/workflow/field", post(set_field))
        .route("/api/workflow/submit", post(submit))
        .route("/api/workflow/acknowledge", post(acknowledge))
        .route("/api/workflow/facing", post(switch_facing))
}
