//! Configuration loading and config file resolution
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `ENROLL_KIOSK_CONFIG` environment variable
//! 3. `<user config dir>/enroll/kiosk.toml`
//! 4. Compiled defaults (fallback)
//!
//! A file named explicitly (tiers 1 and 2) must load; failures there are
//! errors. The user config file is best-effort: a missing or broken file
//! logs a warning and the compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "ENROLL_KIOSK_CONFIG";

/// Camera facing preference
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// User-facing camera
    #[default]
    Front,
    /// Environment-facing camera
    Back,
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

/// Kiosk configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KioskConfig {
    /// HTTP listen address for the presentation boundary
    pub bind_addr: String,
    /// Enrollment endpoint receiving the multipart submission
    pub enrollment_url: String,
    /// Aggregate endpoint returning program → participant counts
    pub results_url: String,
    /// Transport timeout for outbound requests (seconds)
    pub request_timeout_secs: u64,
    /// Roster dataset (JSON array). Absent means an empty roster.
    pub roster_path: Option<PathBuf>,
    /// Broadcast capacity of the workflow event bus
    pub event_capacity: usize,
    pub camera: CameraConfig,
    pub logging: LoggingConfig,
}

/// Camera section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Still frame served by the front-facing source
    pub front_frame: Option<PathBuf>,
    /// Still frame served by the back-facing source
    pub back_frame: Option<PathBuf>,
    pub default_facing: Facing,
}

/// Logging section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive (overridden by `RUST_LOG`)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5780".to_string(),
            enrollment_url: "http://localhost:5000/upload".to_string(),
            results_url: "http://localhost:3005/contar-alunos".to_string(),
            request_timeout_secs: 30,
            roster_path: None,
            event_capacity: 100,
            camera: CameraConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl KioskConfig {
    /// Reject values the kiosk cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.bind_addr.trim().is_empty() {
            return Err(Error::Config("bind_addr must not be empty".to_string()));
        }
        for (key, url) in [
            ("enrollment_url", &self.enrollment_url),
            ("results_url", &self.results_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    key, url
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(Error::Config(
                "event_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Read and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<KioskConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: KioskConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))?;
    config.validate()?;
    Ok(config)
}

/// Per-user config file location (`~/.config/enroll/kiosk.toml` on Linux)
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("enroll").join("kiosk.toml"))
}

/// Resolves which config file to load, following the priority order above
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
    user_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self {
            cli_path,
            user_path: user_config_path(),
        }
    }

    /// Override the per-user config location (tests, packaging)
    pub fn with_user_path(mut self, user_path: Option<PathBuf>) -> Self {
        self.user_path = user_path;
        self
    }

    pub fn resolve(&self) -> Result<KioskConfig> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            info!("Loading config from command line: {}", path.display());
            return load_toml_config(path);
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                info!("Loading config from {}: {}", CONFIG_ENV_VAR, path);
                return load_toml_config(Path::new(&path));
            }
        }

        // Priority 3: User config file
        if let Some(path) = &self.user_path {
            if path.exists() {
                match load_toml_config(path) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        return Ok(config);
                    }
                    Err(e) => warn!("Ignoring user config file: {}", e),
                }
            } else {
                debug!("No user config file at {}", path.display());
            }
        }

        // Priority 4: Compiled defaults
        warn!("No usable config file found, using compiled defaults");
        Ok(KioskConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = KioskConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.camera.default_facing, Facing::Front);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: KioskConfig = toml::from_str(
            r#"
            enrollment_url = "http://10.0.0.5:5000/upload"

            [camera]
            default_facing = "back"
            "#,
        )
        .unwrap();

        assert_eq!(config.enrollment_url, "http://10.0.0.5:5000/upload");
        assert_eq!(config.camera.default_facing, Facing::Back);
        assert_eq!(config.bind_addr, KioskConfig::default().bind_addr);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let config = KioskConfig {
            enrollment_url: "ftp://example.org/upload".to_string(),
            ..KioskConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = KioskConfig {
            request_timeout_secs: 0,
            ..KioskConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
