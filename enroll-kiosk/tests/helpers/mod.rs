//! Shared fakes for enroll-kiosk integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use enroll_common::config::Facing;
use enroll_common::events::EventBus;
use enroll_common::roster::RosterEntry;
use enroll_common::RosterIndex;
use enroll_kiosk::capture::{
    CameraBackend, CaptureError, CaptureSession, CapturedImage, VideoStream,
};
use enroll_kiosk::form::{EnrollmentForm, FormFields};
use enroll_kiosk::submission::{SubmissionResult, Submitter};
use enroll_kiosk::workflow::Workflow;
use image::{Rgb, RgbImage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Camera whose availability can be toggled; counts open streams
pub struct ScriptedCamera {
    pub available: AtomicBool,
    pub open_streams: Arc<AtomicUsize>,
    pub acquisitions: AtomicUsize,
    pub last_facing: Mutex<Option<Facing>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedCamera {
    pub fn new(available: bool) -> Arc<Self> {
        Arc::new(Self {
            available: AtomicBool::new(available),
            open_streams: Arc::new(AtomicUsize::new(0)),
            acquisitions: AtomicUsize::new(0),
            last_facing: Mutex::new(None),
            gate: Mutex::new(None),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Hold every later acquisition until `gate.notify_one()`
    pub fn hold_acquisitions(&self, gate: Arc<Notify>) {
        *self.gate.lock().unwrap() = Some(gate);
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    pub fn last_facing(&self) -> Option<Facing> {
        *self.last_facing.lock().unwrap()
    }
}

struct ScriptedStream {
    open_streams: Arc<AtomicUsize>,
    released: bool,
}

#[async_trait]
impl CameraBackend for ScriptedCamera {
    async fn acquire(&self, facing: Facing) -> Result<Box<dyn VideoStream>, CaptureError> {
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        *self.last_facing.lock().unwrap() = Some(facing);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(CaptureError::Unavailable("NotAllowedError".to_string()));
        }
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedStream {
            open_streams: self.open_streams.clone(),
            released: false,
        }))
    }
}

impl VideoStream for ScriptedStream {
    fn grab_frame(&mut self) -> Result<RgbImage, CaptureError> {
        Ok(RgbImage::from_fn(640, 480, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Submitter returning a fixed result after an optional gate
pub struct ScriptedSubmitter {
    result: Mutex<SubmissionResult>,
    gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub last_fields: Mutex<Option<FormFields>>,
}

impl ScriptedSubmitter {
    pub fn resolving(result: SubmissionResult) -> Arc<Self> {
        Arc::new(Self::build(result, None))
    }

    /// Holds every submission until `gate.notify_one()`
    pub fn gated(result: SubmissionResult, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self::build(result, Some(gate)))
    }

    fn build(result: SubmissionResult, gate: Option<Arc<Notify>>) -> Self {
        Self {
            result: Mutex::new(result),
            gate,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_fields: Mutex::new(None),
        }
    }

    pub fn set_result(&self, result: SubmissionResult) {
        *self.result.lock().unwrap() = result;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Submitter for ScriptedSubmitter {
    async fn submit(&self, fields: &FormFields, _image: &CapturedImage) -> SubmissionResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        *self.last_fields.lock().unwrap() = Some(fields.clone());

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.result.lock().unwrap().clone()
    }
}

pub fn test_roster() -> Arc<RosterIndex> {
    Arc::new(RosterIndex::from_entries(vec![
        RosterEntry {
            registration_id: Some("001122".to_string()),
            full_name: Some("Ana Silva".to_string()),
            program: Some("Direito".to_string()),
        },
        RosterEntry {
            registration_id: Some("556677".to_string()),
            full_name: Some("Bruno Costa".to_string()),
            program: Some("Hotelaria".to_string()),
        },
    ]))
}

/// Workflow over the given fakes, camera already started
pub async fn started_workflow(
    camera: Arc<ScriptedCamera>,
    submitter: Arc<dyn Submitter>,
    events: EventBus,
) -> Workflow {
    let capture = CaptureSession::new(camera, Facing::Front);
    let form = EnrollmentForm::new(test_roster());
    let workflow = Workflow::new(capture, form, submitter, events);
    workflow.start().await;
    workflow
}
