//! # Enrollment Common Library
//!
//! Shared code for the enrollment kiosk:
//! - Error and result types
//! - Configuration loading (TOML + environment + compiled defaults)
//! - Roster Index (registration id → participant record)
//! - Program catalogue
//! - Workflow event types and the broadcast EventBus
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod programs;
pub mod roster;
pub mod sse;

pub use error::{Error, Result};
pub use roster::{ParticipantRecord, RosterIndex};
