//! Capture Session
//!
//! Owns the camera lifecycle and the most recent still image.
//!
//! State machine: `Idle → Streaming (start) → Captured (snapshot) →
//! Streaming (discard)`. `stop` is reachable from any state and is terminal.
//!
//! Only one video stream is open at a time: starting a stream releases the
//! previous one first, and taking a snapshot releases the live stream (the
//! preview is suspended while an image is held).

pub mod frame_file;

pub use frame_file::FrameFileCamera;

use async_trait::async_trait;
use base64::Engine;
use enroll_common::config::Facing;
use image::imageops::FilterType;
use image::{ImageFormat, RgbImage};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Width of the still raster
pub const STILL_WIDTH: u32 = 320;
/// Height of the still raster
pub const STILL_HEIGHT: u32 = 240;

const STOPPED_NOTICE: &str = "capture session stopped";

/// Capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("No active video stream")]
    NoActiveStream,

    #[error("Frame grab failed: {0}")]
    Frame(String),

    #[error("Image encode failed: {0}")]
    Encode(String),
}

/// Source of live video streams (hardware camera, frame files, test fakes)
#[async_trait]
pub trait CameraBackend: Send + Sync {
    /// Acquire a stream for the requested facing
    async fn acquire(&self, facing: Facing) -> Result<Box<dyn VideoStream>, CaptureError>;
}

/// An open video stream
pub trait VideoStream: Send {
    /// Current frame of the live feed
    fn grab_frame(&mut self) -> Result<RgbImage, CaptureError>;

    /// Release the underlying device. Must be idempotent.
    fn release(&mut self);
}

/// Encoded still image held for the current enrollment
///
/// Cheap to clone; clones share the encoded bytes.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    png: Arc<[u8]>,
}

impl CapturedImage {
    /// Render `frame` into the fixed-size still raster and PNG-encode it
    pub fn from_frame(frame: &RgbImage) -> Result<Self, CaptureError> {
        let raster = if frame.dimensions() == (STILL_WIDTH, STILL_HEIGHT) {
            frame.clone()
        } else {
            image::imageops::resize(frame, STILL_WIDTH, STILL_HEIGHT, FilterType::Triangle)
        };

        let mut png = Vec::new();
        raster
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| CaptureError::Encode(e.to_string()))?;

        Ok(Self { png: png.into() })
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    /// `data:image/png;base64,...` form for display
    pub fn to_data_url(&self) -> String {
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Capture session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureState {
    /// No stream (not started yet, or the last start failed)
    Idle,
    /// Live preview running
    Streaming,
    /// Still image held, preview suspended
    Captured,
    /// Session torn down
    Stopped,
}

/// Result of trying to (re)start the live stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Live,
    /// Capture-unavailable: the rest of the workflow stays usable
    Unavailable(String),
}

/// Camera lifecycle plus the held still image
pub struct CaptureSession {
    backend: Arc<dyn CameraBackend>,
    facing: Facing,
    state: CaptureState,
    stream: Option<Box<dyn VideoStream>>,
    captured: Option<CapturedImage>,
}

impl CaptureSession {
    pub fn new(backend: Arc<dyn CameraBackend>, facing: Facing) -> Self {
        Self {
            backend,
            facing,
            state: CaptureState::Idle,
            stream: None,
            captured: None,
        }
    }

    /// Acquire a live stream with the given facing
    ///
    /// Failure is reported as [`StreamStatus::Unavailable`] and logged; the
    /// session stays `Idle` until a later start succeeds.
    pub async fn start(&mut self, facing: Facing) -> StreamStatus {
        let backend = match self.prepare_start(facing) {
            Some(backend) => backend,
            None => return StreamStatus::Unavailable(STOPPED_NOTICE.to_string()),
        };
        let outcome = backend.acquire(facing).await;
        self.finish_start(facing, outcome)
    }

    /// First half of [`CaptureSession::start`]: record the facing and release
    /// the current stream. Returns the backend to acquire from, or `None`
    /// once stopped.
    ///
    /// Lets a caller run the acquisition without holding a borrow of the
    /// session.
    pub fn prepare_start(&mut self, facing: Facing) -> Option<Arc<dyn CameraBackend>> {
        if self.state == CaptureState::Stopped {
            return None;
        }
        self.facing = facing;
        self.release_stream();
        if self.state == CaptureState::Streaming {
            self.state = CaptureState::Idle;
        }
        Some(self.backend.clone())
    }

    /// Second half of [`CaptureSession::start`]: install the acquired stream
    ///
    /// A stream arriving after `stop`, or for a facing that has since been
    /// replaced, is released straight away.
    pub fn finish_start(
        &mut self,
        facing: Facing,
        outcome: Result<Box<dyn VideoStream>, CaptureError>,
    ) -> StreamStatus {
        match outcome {
            Ok(mut stream) => {
                if self.state == CaptureState::Stopped || facing != self.facing {
                    stream.release();
                    debug!(%facing, "Late stream released");
                    return StreamStatus::Unavailable(STOPPED_NOTICE.to_string());
                }
                self.release_stream();
                info!(%facing, "Camera stream started");
                self.stream = Some(stream);
                self.captured = None;
                self.state = CaptureState::Streaming;
                StreamStatus::Live
            }
            Err(e) => {
                warn!(%facing, error = %e, "Camera unavailable");
                StreamStatus::Unavailable(e.to_string())
            }
        }
    }

    /// Grab the current frame and hold it as the still image
    ///
    /// Requires a live stream. Suspends the preview (the stream is released).
    pub fn snapshot(&mut self) -> Result<CapturedImage, CaptureError> {
        if self.state != CaptureState::Streaming {
            return Err(CaptureError::NoActiveStream);
        }
        let stream = self.stream.as_mut().ok_or(CaptureError::NoActiveStream)?;

        let frame = stream.grab_frame()?;
        let image = CapturedImage::from_frame(&frame)?;

        self.release_stream();
        self.captured = Some(image.clone());
        self.state = CaptureState::Captured;
        debug!(bytes = image.png_bytes().len(), "Still image captured");

        Ok(image)
    }

    /// Drop the held image and restart the live stream with the same facing
    pub async fn discard(&mut self) -> StreamStatus {
        self.clear_image();
        self.start(self.facing).await
    }

    /// Drop the held image without touching the stream
    pub fn clear_image(&mut self) {
        self.captured = None;
        if self.state == CaptureState::Captured {
            self.state = CaptureState::Idle;
        }
    }

    /// Release the stream and any held image. Terminal.
    pub fn stop(&mut self) {
        self.release_stream();
        self.captured = None;
        self.state = CaptureState::Stopped;
        info!("Capture session stopped");
    }

    /// Remember a facing preference without touching the stream
    pub fn set_facing(&mut self, facing: Facing) {
        self.facing = facing;
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn captured(&self) -> Option<&CapturedImage> {
        self.captured.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.captured.is_some()
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            debug!("Camera stream released");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release_stream();
    }
}
