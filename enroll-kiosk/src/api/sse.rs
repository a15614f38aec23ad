//! Server-Sent Events for workflow observers

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE stream of workflow events
///
/// Streams WorkflowStateChanged, CaptureUnavailable and SubmissionResolved.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    enroll_common::sse::create_event_sse_stream(&state.event_bus)
}
