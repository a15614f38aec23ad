//! Frame-file camera backend
//!
//! Serves a still image file as the "live" feed for each facing. Used on
//! headless kiosks and for demos where no capture device is attached. A
//! facing with no configured file, or a file that cannot be decoded, is
//! reported as capture-unavailable.

use super::{CameraBackend, CaptureError, VideoStream};
use async_trait::async_trait;
use enroll_common::config::{CameraConfig, Facing};
use image::RgbImage;
use std::path::PathBuf;
use tracing::debug;

pub struct FrameFileCamera {
    front: Option<PathBuf>,
    back: Option<PathBuf>,
}

impl FrameFileCamera {
    pub fn new(front: Option<PathBuf>, back: Option<PathBuf>) -> Self {
        Self { front, back }
    }

    pub fn from_config(config: &CameraConfig) -> Self {
        Self::new(config.front_frame.clone(), config.back_frame.clone())
    }

    fn path_for(&self, facing: Facing) -> Option<&PathBuf> {
        match facing {
            Facing::Front => self.front.as_ref(),
            Facing::Back => self.back.as_ref(),
        }
    }
}

#[async_trait]
impl CameraBackend for FrameFileCamera {
    async fn acquire(&self, facing: Facing) -> Result<Box<dyn VideoStream>, CaptureError> {
        let path = self.path_for(facing).ok_or_else(|| {
            CaptureError::Unavailable(format!("no {} camera configured", facing))
        })?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            CaptureError::Unavailable(format!("{}: {}", path.display(), e))
        })?;
        let frame = image::load_from_memory(&bytes)
            .map_err(|e| CaptureError::Unavailable(format!("{}: {}", path.display(), e)))?
            .to_rgb8();

        debug!(
            path = %path.display(),
            width = frame.width(),
            height = frame.height(),
            "Frame file opened"
        );

        Ok(Box::new(FrameFileStream {
            frame,
            released: false,
        }))
    }
}

struct FrameFileStream {
    frame: RgbImage,
    released: bool,
}

impl VideoStream for FrameFileStream {
    fn grab_frame(&mut self) -> Result<RgbImage, CaptureError> {
        if self.released {
            return Err(CaptureError::Frame("stream released".to_string()));
        }
        Ok(self.frame.clone())
    }

    fn release(&mut self) {
        self.released = true;
    }
}
