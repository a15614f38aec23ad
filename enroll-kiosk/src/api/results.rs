//! Read-only results and program catalogue endpoints

use crate::{ApiError, ApiResult, AppState};
use axum::{extract::State, routing::get, Json, Router};
use enroll_common::programs::{DEFAULT_PROGRAM, PROGRAMS};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct ProgramsResponse {
    pub programs: Vec<&'static str>,
    pub default: &'static str,
}

/// GET /api/programs
pub async fn list_programs() -> Json<ProgramsResponse> {
    Json(ProgramsResponse {
        programs: PROGRAMS.to_vec(),
        default: DEFAULT_PROGRAM,
    })
}

/// GET /api/results - participant count per program
///
/// **Errors:** 502 when the results service is unreachable or misbehaves
pub async fn participant_counts(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, u64>>> {
    state.results.fetch_counts().await.map(Json).map_err(|e| {
        warn!(error = %e, "Participant counts unavailable");
        ApiError::Upstream(e.to_string())
    })
}

pub fn results_routes() -> Router<AppState> {
    Router::new()
        .route("/api/programs", get(list_programs))
        .route("/api/results", get(participant_counts))
}
