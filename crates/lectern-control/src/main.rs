//! Lectern control surface entry point.
//!
//! Wires together the infrastructure services and starts the Tokio runtime.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML config, defaults on first run
//!  └─ AppState::new()          -- control session + surface lifecycle
//!  └─ start services
//!       ├─ surface bridge      (WebSocket accept loop)
//!       ├─ bridge event pump   (connect/disconnect → lifecycle, requests → session)
//!       ├─ lifecycle pump      (opened → resync)
//!       └─ resource server     (media files for the output surface)
//! ```

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use lectern_control::application::settings::{InMemorySettings, SettingsStore};
use lectern_control::infrastructure::display::display_enumerator;
use lectern_control::infrastructure::storage::config::{config_dir, load_config};
use lectern_control::infrastructure::storage::settings::FileSettingsStore;
use lectern_control::infrastructure::surface::ProcessSurfaceFactory;
use lectern_control::infrastructure::surface_bridge::{self, SurfaceBridge};
use lectern_control::infrastructure::ui_bridge::{self, AppParts, AppState};
use lectern_core::ResourceScope;
use lectern_resource::domain::ResourceServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match load_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to load config ({e}); using defaults");
            Default::default()
        }
    };

    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.control.log_level)),
        )
        .init();

    info!("Lectern control surface starting");

    // ── Collaborators ─────────────────────────────────────────────────────────
    let settings: Arc<dyn SettingsStore> = match config_dir() {
        Ok(dir) => Arc::new(FileSettingsStore::open(dir.join("settings.json"))),
        Err(e) => {
            warn!("{e}; settings will not be persisted");
            Arc::new(InMemorySettings::new())
        }
    };

    let bridge_addr = format!(
        "{}:{}",
        config.surface.bridge_address, config.surface.bridge_port
    );
    let listener = surface_bridge::bind(&bridge_addr).await?;
    let bridge = Arc::new(SurfaceBridge::new());

    let output_binary = config
        .surface
        .output_binary
        .clone()
        .or_else(ProcessSurfaceFactory::sibling_binary)
        .unwrap_or_else(|| PathBuf::from("lectern-output"));
    let resource_config = ResourceServerConfig::new(config.resources.root.clone())
        .with_bind_addr(SocketAddr::from((Ipv4Addr::LOCALHOST, config.resources.port)));
    let policy = config.sync.drift_policy();
    let factory = Arc::new(
        ProcessSurfaceFactory::new(output_binary, format!("ws://{bridge_addr}")).with_args([
            "--resource-url".to_string(),
            format!("http://{}", resource_config.bind_addr),
            "--max-drift".to_string(),
            policy.max_drift_secs.to_string(),
            "--rate-threshold".to_string(),
            policy.rate_threshold_secs.to_string(),
            "--rate-nudge".to_string(),
            policy.rate_nudge.to_string(),
        ]),
    );
    let displays = display_enumerator(&config.surface);

    let (state, mut lifecycle_rx) = AppState::new(AppParts {
        config,
        transport: Arc::clone(&bridge) as _,
        settings,
        displays,
        factory,
    });

    // Shutdown flag shared across all background services.
    let running = Arc::new(AtomicBool::new(true));
    let mut scope = ResourceScope::new();

    // ── Surface bridge ────────────────────────────────────────────────────────
    let (bridge_tx, mut bridge_rx) = mpsc::unbounded_channel();
    let bridge_task = tokio::spawn(surface_bridge::run_bridge(
        listener,
        Arc::clone(&bridge),
        Arc::clone(&state) as _,
        bridge_tx,
        Arc::clone(&running),
    ));
    let abort = bridge_task.abort_handle();
    scope.acquire("surface bridge", move || abort.abort());

    // ── Resource server ───────────────────────────────────────────────────────
    if let Err(e) = std::fs::create_dir_all(&resource_config.root) {
        warn!("cannot create media directory {}: {e}", resource_config.root.display());
    }
    let resource_task = tokio::spawn(lectern_resource::infrastructure::run_server(
        resource_config,
        Arc::clone(&running),
    ));
    let abort = resource_task.abort_handle();
    scope.acquire("resource server", move || abort.abort());

    // ── Bridge event pump ─────────────────────────────────────────────────────
    let state_clone = Arc::clone(&state);
    let pump = tokio::spawn(async move {
        while let Some(event) = bridge_rx.recv().await {
            ui_bridge::handle_bridge_event(&state_clone, event).await;
        }
    });
    scope.acquire("bridge event pump", move || pump.abort());

    // ── Lifecycle pump ────────────────────────────────────────────────────────
    let state_clone = Arc::clone(&state);
    let pump = tokio::spawn(async move {
        while let Some(event) = lifecycle_rx.recv().await {
            ui_bridge::handle_lifecycle_event(&state_clone, event).await;
        }
    });
    scope.acquire("lifecycle pump", move || pump.abort());

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            running_clone.store(false, Ordering::Relaxed);
        }
    });

    // Open the projection right away when a second display is present.
    let status = ui_bridge::open_projection(Arc::clone(&state)).await;
    match (status.data, status.error) {
        (Some(dto), _) => info!("output surface: {}", dto.state),
        (None, Some(reason)) => info!("running without output surface: {reason}"),
        (None, None) => {}
    }

    info!("Lectern control surface ready.  Press Ctrl-C to exit.");

    while running.load(Ordering::Relaxed) {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    ui_bridge::close_projection(Arc::clone(&state)).await;
    match bridge_task.await {
        Ok(Err(e)) => error!("surface bridge failed: {e:#}"),
        Err(e) if !e.is_cancelled() => error!("surface bridge task panicked: {e}"),
        _ => {}
    }
    match resource_task.await {
        Ok(Err(e)) => error!("resource server failed: {e:#}"),
        Err(e) if !e.is_cancelled() => error!("resource server task panicked: {e}"),
        _ => {}
    }
    scope.release_all();

    info!("Lectern control surface stopped");
    Ok(())
}
