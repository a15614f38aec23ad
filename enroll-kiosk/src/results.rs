//! Results aggregate client
//!
//! Read-only fetch of program → participant counts from the results service.

use enroll_common::config::KioskConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("enroll-kiosk/", env!("CARGO_PKG_VERSION"));

/// Results client errors
#[derive(Debug, Error)]
pub enum ResultsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}")]
    ApiError(u16),

    #[error("Parse error: {0}")]
    ParseError(String),
}

pub struct ResultsClient {
    http_client: reqwest::Client,
    url: String,
}

impl ResultsClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ResultsError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ResultsError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &KioskConfig) -> Result<Self, ResultsError> {
        Self::new(
            config.results_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Participant count per program
    pub async fn fetch_counts(&self) -> Result<BTreeMap<String, u64>, ResultsError> {
        tracing::debug!(url = %self.url, "Fetching participant counts");

        let response = self
            .http_client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ResultsError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResultsError::ApiError(status.as_u16()));
        }

        response
            .json::<BTreeMap<String, u64>>()
            .await
            .map_err(|e| ResultsError::ParseError(e.to_string()))
    }
}
