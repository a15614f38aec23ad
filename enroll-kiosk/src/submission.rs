//! Submission Pipeline
//!
//! Turns validated form fields plus the held still image into one multipart
//! POST to the enrollment endpoint, and classifies the outcome.
//!
//! Every fault (non-2xx status, network error, timeout, unreadable response)
//! is caught here and collapsed into [`SubmissionResult::Failure`]. Nothing
//! is retried; the caller re-invokes `submit` to try again.

use crate::capture::CapturedImage;
use crate::form::FormFields;
use async_trait::async_trait;
use enroll_common::config::KioskConfig;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const USER_AGENT: &str = concat!("enroll-kiosk/", env!("CARGO_PKG_VERSION"));

/// Multipart part carrying the still image
pub const IMAGE_PART: &str = "imagem";
const IMAGE_FILE_NAME: &str = "captured.png";
const IMAGE_MIME: &str = "image/png";

/// Terminal outcome of one submission attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmissionResult {
    Success,
    Failure { message: String },
}

impl SubmissionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionResult::Success)
    }

    pub fn failure_message(&self) -> Option<&str> {
        match self {
            SubmissionResult::Success => None,
            SubmissionResult::Failure { message } => Some(message),
        }
    }
}

/// Anything able to carry a submission to the enrollment service
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Issue exactly one submission and resolve to its terminal result
    async fn submit(&self, fields: &FormFields, image: &CapturedImage) -> SubmissionResult;
}

/// Faults inside the pipeline, before classification
#[derive(Debug, Error)]
enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("invalid payload: {0}")]
    Payload(String),
}

impl TransportError {
    /// User-facing text for the result notice
    fn user_message(&self) -> String {
        match self {
            TransportError::Status(code) => {
                format!("Falha no envio: o servidor respondeu com status {}.", code)
            }
            TransportError::Network(detail) => {
                format!("Falha no envio: erro de comunicação com o servidor ({}).", detail)
            }
            TransportError::Payload(detail) => {
                format!("Falha no envio: não foi possível montar os dados ({}).", detail)
            }
        }
    }
}

/// Pipeline construction errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

/// HTTP multipart submission to the configured enrollment endpoint
pub struct SubmissionPipeline {
    http_client: reqwest::Client,
    endpoint: String,
}

impl SubmissionPipeline {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PipelineError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Client(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &KioskConfig) -> Result<Self, PipelineError> {
        Self::new(
            config.enrollment_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One multipart body: the image part plus the four text fields
    fn build_form(fields: &FormFields, image: &CapturedImage) -> Result<Form, TransportError> {
        let image_part = Part::bytes(image.png_bytes().to_vec())
            .file_name(IMAGE_FILE_NAME)
            .mime_str(IMAGE_MIME)
            .map_err(|e| TransportError::Payload(e.to_string()))?;

        Ok(Form::new()
            .part(IMAGE_PART, image_part)
            .text("nome", fields.full_name.clone())
            .text("cpf", fields.tax_id.clone())
            .text("matricula", fields.registration_id.clone())
            .text("curso", fields.program.clone()))
    }

    async fn send(&self, fields: &FormFields, image: &CapturedImage) -> Result<(), TransportError> {
        let form = Self::build_form(fields, image)?;

        let response = self
            .http_client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!(status = status.as_u16(), body = %body, "Enrollment service response");

        Ok(())
    }
}

#[async_trait]
impl Submitter for SubmissionPipeline {
    async fn submit(&self, fields: &FormFields, image: &CapturedImage) -> SubmissionResult {
        info!(
            endpoint = %self.endpoint,
            registration_id = %fields.registration_id,
            image_bytes = image.png_bytes().len(),
            "Submitting enrollment"
        );

        match self.send(fields, image).await {
            Ok(()) => {
                info!(registration_id = %fields.registration_id, "Enrollment accepted");
                SubmissionResult::Success
            }
            Err(e) => {
                warn!(registration_id = %fields.registration_id, error = %e, "Enrollment failed");
                SubmissionResult::Failure {
                    message: e.user_message(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_message_mentions_code() {
        let message = TransportError::Status(503).user_message();
        assert!(message.contains("503"));
    }

    #[test]
    fn test_result_accessors() {
        assert!(SubmissionResult::Success.is_success());
        let failure = SubmissionResult::Failure {
            message: "boom".to_string(),
        };
        assert!(!failure.is_success());
        assert_eq!(failure.failure_message(), Some("boom"));
    }

    #[test]
    fn test_result_serialization() {
        let json = serde_json::to_value(SubmissionResult::Failure {
            message: "x".to_string(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["message"], "x");
    }

    #[test]
    fn test_pipeline_from_config() {
        let config = KioskConfig::default();
        let pipeline = SubmissionPipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.endpoint(), config.enrollment_url);
    }
}
