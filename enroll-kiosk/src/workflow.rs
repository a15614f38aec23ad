//! Workflow Controller
//!
//! Top-level enrollment state machine binding the Capture Session, the
//! Enrollment Form Model and the Submission Pipeline:
//!
//! ```text
//! Capturing --snapshot--> Captured --discard--> Capturing
//! Captured --submit (valid)--> Submitting --resolve--> Result(Success | Failure)
//! Result(Success) --acknowledge--> Capturing   (full reset)
//! Result(Failure) --acknowledge--> Captured    (form and image kept)
//! ```
//!
//! The workflow never terminates; it loops across enrollments for the life
//! of the kiosk. Actions not offered in the current state are inert.
//!
//! At most one submission is in flight. The controller lock is held for each
//! state change but not across the network call or a camera acquisition, so
//! observers can read the view meanwhile. The submission runs on its own
//! task: once issued it always resolves, even if the caller goes away.
//! Camera acquisitions are serialized on a separate lock so only one stream
//! is ever being opened.

use crate::capture::{CaptureSession, CaptureState, CapturedImage, StreamStatus};
use crate::form::{EnrollmentForm, FieldName, FormFields, ValidationErrors};
use crate::submission::{SubmissionResult, Submitter};
use chrono::Utc;
use enroll_common::config::Facing;
use enroll_common::events::{EnrollmentEvent, EventBus, WorkflowPhase};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const SUCCESS_NOTICE: &str = "Inscrição enviada com sucesso!";

/// Controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    /// Live preview, no image yet
    Capturing,
    /// Image held, form editable
    Captured,
    /// Submission in flight, form disabled
    Submitting { attempt_id: Uuid },
    /// Terminal result of the last attempt, awaiting acknowledgement
    Result(SubmissionResult),
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            WorkflowState::Capturing => WorkflowPhase::Capturing,
            WorkflowState::Captured => WorkflowPhase::Captured,
            WorkflowState::Submitting { .. } => WorkflowPhase::Submitting,
            WorkflowState::Result(SubmissionResult::Success) => WorkflowPhase::Succeeded,
            WorkflowState::Result(SubmissionResult::Failure { .. }) => WorkflowPhase::Failed,
        }
    }
}

/// Actions the presentation layer may offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Snapshot,
    Discard,
    SetField,
    Submit,
    AcknowledgeResult,
    SwitchFacing,
}

/// What the media area should render
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Preview {
    /// Live camera feed
    Live,
    /// No feed (camera unavailable)
    Blank,
    /// The held still image
    Captured { data_url: String },
}

/// Result modal content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultNotice {
    pub success: bool,
    pub message: String,
}

/// Everything the presentation layer needs for one render
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowView {
    pub state: WorkflowPhase,
    pub preview: Preview,
    pub fields: FormFields,
    pub errors: ValidationErrors,
    pub form_editable: bool,
    pub submit_enabled: bool,
    pub notice: Option<ResultNotice>,
    pub camera_notice: Option<String>,
    pub facing: Facing,
    pub actions: Vec<Action>,
}

/// Outcome of a submit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Not available in the current state (e.g. already submitting)
    Ignored,
    /// Validation failed; errors are surfaced and nothing was sent
    Invalid(ValidationErrors),
    /// The submission ran and resolved
    Resolved(SubmissionResult),
}

/// State owned behind the workflow lock
pub struct WorkflowController {
    state: WorkflowState,
    capture: CaptureSession,
    form: EnrollmentForm,
    errors: ValidationErrors,
    camera_notice: Option<String>,
    events: EventBus,
}

impl WorkflowController {
    fn new(capture: CaptureSession, form: EnrollmentForm, events: EventBus) -> Self {
        Self {
            state: WorkflowState::Capturing,
            capture,
            form,
            errors: ValidationErrors::default(),
            camera_notice: None,
            events,
        }
    }

    fn transition_to(&mut self, new_state: WorkflowState) {
        let old_phase = self.state.phase();
        let new_phase = new_state.phase();
        self.state = new_state;

        if old_phase != new_phase {
            info!(from = %old_phase, to = %new_phase, "Workflow transition");
            self.events.emit_lossy(EnrollmentEvent::WorkflowStateChanged {
                old_state: old_phase,
                new_state: new_phase,
                timestamp: Utc::now(),
            });
        }
    }

    fn record_stream_status(&mut self, status: StreamStatus) {
        match status {
            StreamStatus::Live => self.camera_notice = None,
            StreamStatus::Unavailable(message) => {
                self.events.emit_lossy(EnrollmentEvent::CaptureUnavailable {
                    facing: self.capture.facing(),
                    message: message.clone(),
                    timestamp: Utc::now(),
                });
                self.camera_notice = Some(message);
            }
        }
    }

    /// Re-run validation if errors are showing; image changes affect them
    fn refresh_errors(&mut self) {
        if !self.errors.is_empty() {
            self.errors = self.form.validate(self.capture.has_image());
        }
    }

    fn is_form_editable(&self) -> bool {
        matches!(self.state, WorkflowState::Capturing | WorkflowState::Captured)
    }

    fn available_actions(&self) -> Vec<Action> {
        match self.state {
            WorkflowState::Capturing => {
                let mut actions = Vec::new();
                if self.capture.state() == CaptureState::Streaming {
                    actions.push(Action::Snapshot);
                }
                actions.extend([Action::SetField, Action::Submit, Action::SwitchFacing]);
                actions
            }
            WorkflowState::Captured => vec![
                Action::Discard,
                Action::SetField,
                Action::Submit,
                Action::SwitchFacing,
            ],
            WorkflowState::Submitting { .. } => Vec::new(),
            WorkflowState::Result(_) => vec![Action::AcknowledgeResult],
        }
    }

    fn view(&self) -> WorkflowView {
        let preview = match (&self.state, self.capture.captured()) {
            (WorkflowState::Capturing, _) | (_, None) => {
                if self.capture.state() == CaptureState::Streaming {
                    Preview::Live
                } else {
                    Preview::Blank
                }
            }
            (_, Some(image)) => Preview::Captured {
                data_url: image.to_data_url(),
            },
        };

        let notice = match &self.state {
            WorkflowState::Result(SubmissionResult::Success) => Some(ResultNotice {
                success: true,
                message: SUCCESS_NOTICE.to_string(),
            }),
            WorkflowState::Result(SubmissionResult::Failure { message }) => Some(ResultNotice {
                success: false,
                message: message.clone(),
            }),
            _ => None,
        };

        let actions = self.available_actions();

        WorkflowView {
            state: self.state.phase(),
            preview,
            fields: self.form.fields().clone(),
            errors: self.errors.clone(),
            form_editable: self.is_form_editable(),
            submit_enabled: actions.contains(&Action::Submit),
            notice,
            camera_notice: self.camera_notice.clone(),
            facing: self.capture.facing(),
            actions,
        }
    }

    /// Validate and, when clean, enter `Submitting` with a snapshot of the inputs
    fn begin_submit(&mut self) -> Result<(Uuid, FormFields, CapturedImage), SubmitOutcome> {
        if !self.is_form_editable() {
            debug!(state = %self.state.phase(), "Submit ignored");
            return Err(SubmitOutcome::Ignored);
        }

        let errors = self.form.validate(self.capture.has_image());
        self.errors = errors.clone();
        if !errors.is_empty() {
            debug!(errors = errors.len(), "Submit blocked by validation");
            return Err(SubmitOutcome::Invalid(errors));
        }

        let image = match self.capture.captured() {
            Some(image) => image.clone(),
            None => return Err(SubmitOutcome::Invalid(errors)),
        };

        let attempt_id = Uuid::new_v4();
        self.transition_to(WorkflowState::Submitting { attempt_id });
        Ok((attempt_id, self.form.fields().clone(), image))
    }

    fn finish_submit(&mut self, attempt_id: Uuid, result: SubmissionResult) {
        match self.state {
            WorkflowState::Submitting { attempt_id: current } if current == attempt_id => {}
            _ => {
                error!(%attempt_id, "Submission resolved outside its attempt, dropping result");
                return;
            }
        }

        self.events.emit_lossy(EnrollmentEvent::SubmissionResolved {
            attempt_id,
            success: result.is_success(),
            message: result.failure_message().map(str::to_string),
            timestamp: Utc::now(),
        });
        self.transition_to(WorkflowState::Result(result));
    }
}

/// Shared handle to the enrollment workflow
#[derive(Clone)]
pub struct Workflow {
    inner: Arc<Mutex<WorkflowController>>,
    acquiring: Arc<Mutex<()>>,
    submitter: Arc<dyn Submitter>,
}

impl Workflow {
    /// Wire the collaborators together. Starts in `Capturing`; call
    /// [`Workflow::start`] to open the camera.
    pub fn new(
        capture: CaptureSession,
        form: EnrollmentForm,
        submitter: Arc<dyn Submitter>,
        events: EventBus,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WorkflowController::new(capture, form, events))),
            acquiring: Arc::new(Mutex::new(())),
            submitter,
        }
    }

    /// Open the camera with the session's facing preference
    ///
    /// Only applies while `Capturing`; a held image is never dropped by it.
    /// Capture-unavailable is non-fatal and leaves the preview blank.
    pub async fn start(&self) -> bool {
        let facing = self.inner.lock().await.capture.facing();
        self.restart_stream(facing).await
    }

    /// (Re)open the live stream without holding the controller lock across
    /// the acquisition. Inert unless `Capturing`, both before and after.
    async fn restart_stream(&self, facing: Facing) -> bool {
        let _acquiring = self.acquiring.lock().await;

        let backend = {
            let mut ctl = self.inner.lock().await;
            if ctl.state != WorkflowState::Capturing {
                return false;
            }
            match ctl.capture.prepare_start(facing) {
                Some(backend) => backend,
                None => return false,
            }
        };

        let outcome = backend.acquire(facing).await;

        let mut ctl = self.inner.lock().await;
        if ctl.state != WorkflowState::Capturing {
            if let Ok(mut stream) = outcome {
                stream.release();
            }
            debug!(state = %ctl.state.phase(), "Stream acquired after leaving Capturing, released");
            return false;
        }
        let status = ctl.capture.finish_start(facing, outcome);
        ctl.record_stream_status(status);
        true
    }

    pub async fn state(&self) -> WorkflowState {
        self.inner.lock().await.state.clone()
    }

    pub async fn view(&self) -> WorkflowView {
        self.inner.lock().await.view()
    }

    /// Capture a still from the live preview. Returns whether it was taken.
    pub async fn snapshot(&self) -> bool {
        let mut ctl = self.inner.lock().await;
        if ctl.state != WorkflowState::Capturing {
            return false;
        }

        match ctl.capture.snapshot() {
            Ok(_) => {
                ctl.camera_notice = None;
                ctl.refresh_errors();
                ctl.transition_to(WorkflowState::Captured);
                true
            }
            Err(e) => {
                warn!(error = %e, "Snapshot failed");
                ctl.camera_notice = Some(e.to_string());
                false
            }
        }
    }

    /// Drop the held image and go back to live preview
    pub async fn discard(&self) -> bool {
        let facing = {
            let mut ctl = self.inner.lock().await;
            if ctl.state != WorkflowState::Captured {
                return false;
            }
            ctl.capture.clear_image();
            ctl.refresh_errors();
            ctl.transition_to(WorkflowState::Capturing);
            ctl.capture.facing()
        };

        self.restart_stream(facing).await;
        true
    }

    /// Edit one field (inert while submitting or showing a result)
    pub async fn set_field(&self, name: FieldName, value: impl Into<String>) -> bool {
        let mut ctl = self.inner.lock().await;
        if !ctl.is_form_editable() {
            return false;
        }
        ctl.form.set_field(name, value);
        true
    }

    /// Change camera facing
    ///
    /// Restarts the live stream when previewing; while an image is held the
    /// preference is only recorded and used on the next discard.
    pub async fn switch_facing(&self, facing: Facing) -> bool {
        {
            let mut ctl = self.inner.lock().await;
            let phase = ctl.state.phase();
            match phase {
                WorkflowPhase::Capturing => {}
                WorkflowPhase::Captured => {
                    ctl.capture.set_facing(facing);
                    return true;
                }
                _ => return false,
            }
        }

        self.restart_stream(facing).await
    }

    /// Validate and submit
    ///
    /// Resolves once the submission's terminal result is recorded. A request
    /// made while another submission is in flight is ignored.
    pub async fn submit(&self) -> SubmitOutcome {
        let (attempt_id, fields, image) = {
            let mut ctl = self.inner.lock().await;
            match ctl.begin_submit() {
                Ok(ticket) => ticket,
                Err(outcome) => return outcome,
            }
        };

        info!(%attempt_id, "Submission started");

        let inner = self.inner.clone();
        let submitter = self.submitter.clone();
        let task = tokio::spawn(async move {
            let result = submitter.submit(&fields, &image).await;
            inner.lock().await.finish_submit(attempt_id, result.clone());
            result
        });

        match task.await {
            Ok(result) => SubmitOutcome::Resolved(result),
            Err(e) => {
                error!(%attempt_id, error = %e, "Submission task failed");
                let result = SubmissionResult::Failure {
                    message: "Falha no envio: erro interno.".to_string(),
                };
                self.inner
                    .lock()
                    .await
                    .finish_submit(attempt_id, result.clone());
                SubmitOutcome::Resolved(result)
            }
        }
    }

    /// Dismiss the result notice
    ///
    /// Success resets everything for the next participant; failure returns
    /// to the held image and form so the user can correct and retry.
    pub async fn acknowledge_result(&self) -> bool {
        let facing = {
            let mut ctl = self.inner.lock().await;
            let phase = ctl.state.phase();
            match phase {
                WorkflowPhase::Succeeded => {
                    ctl.form.reset();
                    ctl.errors = ValidationErrors::default();
                    ctl.capture.clear_image();
                    ctl.transition_to(WorkflowState::Capturing);
                }
                WorkflowPhase::Failed => {
                    ctl.transition_to(WorkflowState::Captured);
                    return true;
                }
                _ => return false,
            }
            ctl.capture.facing()
        };

        self.restart_stream(facing).await;
        true
    }

    /// Release the camera on teardown
    pub async fn shutdown(&self) {
        self.inner.lock().await.capture.stop();
    }
}
