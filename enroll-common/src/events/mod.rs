//! Event types for the enrollment workflow
//!
//! Provides the shared event definitions and the EventBus used to observe
//! the workflow (SSE, logging, tests).

mod workflow_types;

pub use workflow_types::WorkflowPhase;

use crate::config::Facing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Enrollment workflow events
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EnrollmentEvent {
    /// Workflow moved between phases
    WorkflowStateChanged {
        old_state: WorkflowPhase,
        new_state: WorkflowPhase,
        timestamp: DateTime<Utc>,
    },

    /// Camera could not be acquired
    ///
    /// Non-fatal: the form stays usable, capture is disabled until a later
    /// start succeeds.
    CaptureUnavailable {
        facing: Facing,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A submission attempt reached its terminal result
    SubmissionResolved {
        attempt_id: Uuid,
        success: bool,
        /// Failure description (None on success)
        message: Option<String>,
        timestamp: DateTime<Utc>,
    },
}

impl EnrollmentEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            EnrollmentEvent::WorkflowStateChanged { .. } => "WorkflowStateChanged",
            EnrollmentEvent::CaptureUnavailable { .. } => "CaptureUnavailable",
            EnrollmentEvent::SubmissionResolved { .. } => "SubmissionResolved",
        }
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use enroll_common::events::{EnrollmentEvent, EventBus, WorkflowPhase};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(EnrollmentEvent::WorkflowStateChanged {
///     old_state: WorkflowPhase::Capturing,
///     new_state: WorkflowPhase::Captured,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(rx.try_recv().is_ok());
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EnrollmentEvent>,
}

impl EventBus {
    /// Creates a new EventBus buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<EnrollmentEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: EnrollmentEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
