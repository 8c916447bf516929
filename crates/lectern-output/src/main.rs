//! Lectern output surface entry point.
//!
//! Started by the control surface, one process per projection window.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::parse()              -- URL, placement, drift thresholds
//!  └─ OutputAppState::new()     -- stores + media sync engine
//!  └─ run_link()                -- WebSocket to the control surface
//!  └─ link event loop
//!       ├─ Connected     -> status "Connected"
//!       ├─ Envelope      -> OutputSession::handle_envelope
//!       └─ Disconnected  -> exit
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lectern_core::drift::{DriftPolicy, DRIFT_RATE_THRESHOLD, MAX_DRIFT_THRESHOLD, RATE_NUDGE};
use lectern_core::ResourceScope;
use lectern_output::application::media_sync::MediaSyncEngine;
use lectern_output::application::output_session::OutputSession;
use lectern_output::infrastructure::control_link::{run_link, ControlLinkConfig};
use lectern_output::infrastructure::player::ClockPlayer;
use lectern_output::infrastructure::ui_bridge::{self, OutputAppState, SurfaceGeometry};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Lectern output surface.
#[derive(Debug, Parser)]
#[command(
    name = "lectern-output",
    about = "Projection window kept in sync with the Lectern control surface",
    version
)]
struct Cli {
    /// WebSocket URL of the control surface, including `/surface/<uuid>`.
    #[arg(long, env = "LECTERN_CONTROL_URL")]
    control_url: String,

    /// Window origin on the virtual desktop.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    x: i32,

    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    y: i32,

    #[arg(long, default_value_t = 1920)]
    width: u32,

    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Origin of the local resource server that serves media files.
    #[arg(long, default_value = "http://127.0.0.1:24901", env = "LECTERN_RESOURCE_URL")]
    resource_url: String,

    /// Drift in seconds above which playback seeks instead of nudging.
    #[arg(long, default_value_t = MAX_DRIFT_THRESHOLD, env = "LECTERN_MAX_DRIFT")]
    max_drift: f64,

    /// Drift in seconds at or below which no correction is made.
    #[arg(long, default_value_t = DRIFT_RATE_THRESHOLD, env = "LECTERN_RATE_THRESHOLD")]
    rate_threshold: f64,

    /// Relative playback rate change while nudging.
    #[arg(long, default_value_t = RATE_NUDGE, env = "LECTERN_RATE_NUDGE")]
    rate_nudge: f64,

    /// Attempts to reach the control surface before giving up.
    #[arg(long, default_value_t = 10)]
    connect_attempts: u32,
}

impl Cli {
    /// # Errors
    ///
    /// Returns an error if the drift thresholds are not ordered or the nudge
    /// is outside (0, 1).
    fn drift_policy(&self) -> anyhow::Result<DriftPolicy> {
        let policy = DriftPolicy {
            max_drift_secs: self.max_drift,
            rate_threshold_secs: self.rate_threshold,
            rate_nudge: self.rate_nudge,
        };
        if !policy.is_valid() {
            bail!(
                "invalid drift thresholds: need 0 <= rate-threshold < max-drift and 0 < rate-nudge < 1 (got {policy:?})"
            );
        }
        Ok(policy)
    }

    fn geometry(&self) -> SurfaceGeometry {
        SurfaceGeometry {
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let policy = cli.drift_policy()?;
    let geometry = cli.geometry();
    info!(?geometry, "Lectern output surface starting");

    let engine = MediaSyncEngine::new(Arc::new(ClockPlayer::new()), policy);
    let session = OutputSession::new(engine, cli.resource_url.clone());
    let (state, uplink_rx) = OutputAppState::new(session, geometry, cli.resource_url.clone());

    let running = Arc::new(AtomicBool::new(true));
    let mut scope = ResourceScope::new();

    // ── Control link ──────────────────────────────────────────────────────────
    let (link_tx, mut link_rx) = mpsc::unbounded_channel();
    let link_config = ControlLinkConfig {
        url: cli.control_url,
        connect_attempts: cli.connect_attempts,
        retry_interval: Duration::from_millis(500),
    };
    let link = tokio::spawn(run_link(
        link_config,
        link_tx,
        uplink_rx,
        Arc::clone(&running),
    ));
    let abort = link.abort_handle();
    scope.acquire("control link", move || abort.abort());

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // ── Link event loop ───────────────────────────────────────────────────────
    while let Some(event) = link_rx.recv().await {
        if !ui_bridge::handle_link_event(&state, event).await {
            break;
        }
    }

    running.store(false, Ordering::Relaxed);
    let result = link.await;
    scope.release_all();

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error!("control link failed: {e:#}");
            return Err(e);
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => error!("control link task panicked: {e}"),
    }

    info!("Lectern output surface stopped");
    Ok(())
}
