//! enroll-kiosk - Enrollment capture kiosk
//!
//! Captures a participant's still image, fills the identity form from the
//! roster, and submits both to the enrollment service. The workflow is
//! driven over a local HTTP API (see `enroll_kiosk::api`).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use enroll_common::config::ConfigResolver;
use enroll_common::events::EventBus;
use enroll_common::RosterIndex;
use enroll_kiosk::capture::{CaptureSession, FrameFileCamera};
use enroll_kiosk::form::EnrollmentForm;
use enroll_kiosk::results::ResultsClient;
use enroll_kiosk::submission::SubmissionPipeline;
use enroll_kiosk::workflow::Workflow;
use enroll_kiosk::AppState;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for enroll-kiosk
#[derive(Parser, Debug)]
#[command(name = "enroll-kiosk")]
#[command(about = "Enrollment capture and submission kiosk")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides config)
    #[arg(short, long, env = "ENROLL_KIOSK_BIND")]
    bind: Option<String>,

    /// Enrollment endpoint URL (overrides config)
    #[arg(long, env = "ENROLL_KIOSK_ENROLLMENT_URL")]
    enrollment_url: Option<String>,

    /// Roster JSON file (overrides config)
    #[arg(short, long, env = "ENROLL_KIOSK_ROSTER")]
    roster: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is resolved before tracing so the log level can come from it
    let mut config = ConfigResolver::new(args.config.clone())
        .resolve()
        .context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(url) = args.enrollment_url {
        config.enrollment_url = url;
    }
    if let Some(roster) = args.roster {
        config.roster_path = Some(roster);
    }
    config.validate().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting enroll-kiosk {}", env!("CARGO_PKG_VERSION"));

    let roster = match &config.roster_path {
        Some(path) => RosterIndex::from_path(path)
            .with_context(|| format!("Failed to load roster {}", path.display()))?,
        None => {
            warn!("No roster configured; registration ids will not autofill");
            RosterIndex::empty()
        }
    };
    info!("Roster: {} participants", roster.len());

    let event_bus = EventBus::new(config.event_capacity);

    let camera = Arc::new(FrameFileCamera::from_config(&config.camera));
    let capture = CaptureSession::new(camera, config.camera.default_facing);
    let form = EnrollmentForm::new(Arc::new(roster));
    let pipeline = SubmissionPipeline::from_config(&config)
        .context("Failed to build submission pipeline")?;
    info!("Enrollment endpoint: {}", pipeline.endpoint());
    let results =
        ResultsClient::from_config(&config).context("Failed to build results client")?;

    let workflow = Workflow::new(capture, form, Arc::new(pipeline), event_bus.clone());
    workflow.start().await;

    let state = AppState::new(workflow.clone(), results, event_bus);
    let app = enroll_kiosk::build_router(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    workflow.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down");
        },
    }
}
