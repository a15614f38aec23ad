//! Workflow-related event payload types

use serde::{Deserialize, Serialize};

/// Coarse workflow phase, as reported to observers
///
/// Mirrors the controller's states without their payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    /// Live preview, no image held
    Capturing,
    /// Image held, form editable
    Captured,
    /// Submission in flight
    Submitting,
    /// Last submission accepted
    Succeeded,
    /// Last submission rejected or failed in transport
    Failed,
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            WorkflowPhase::Capturing => "capturing",
            WorkflowPhase::Captured => "captured",
            WorkflowPhase::Submitting => "submitting",
            WorkflowPhase::Succeeded => "succeeded",
            WorkflowPhase::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}
