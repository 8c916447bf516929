//! Command bridge: exposes application-layer operations to the operator UI.
//!
//! Every command function here takes the shared [`AppState`] and delegates to
//! the control session or the surface lifecycle manager.  The UI layer is the
//! only consumer of this module; it must NOT be imported by the application
//! layer.
//!
//! # Data Transfer Objects (DTOs)
//!
//! Commands return plain serde structs (`SurfaceStatusDto`, `ProjectionDto`)
//! containing only JSON-friendly fields, so the UI never sees internal types
//! such as `Uuid` or the store structs.
//!
//! # `CommandResult<T>` wrapper
//!
//! All commands return `CommandResult<T>` rather than `Result<T, E>`, so every
//! response has the same shape: `{ success, data, error }`.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

use lectern_core::channel::Transport;
use lectern_core::protocol::messages::{MediaKind, PlaybackAction, TimerMode, TimerState, ViewKind};
use lectern_core::protocol::requests::SurfaceRequest;

use crate::application::content_forwarding::{forward_content, BibleVersion, TextContentProvider};
use crate::application::control_session::{ControlSession, SessionError};
use crate::application::playback_reporter::PlaybackReporter;
use crate::application::settings::SettingsStore;
use crate::application::surface_lifecycle::{
    DisplayEnumerator, EnsureOutcome, LifecycleEvent, SurfaceFactory, SurfaceId,
    SurfaceLifecycleManager, SurfaceState,
};
use crate::infrastructure::storage::config::AppConfig;
use crate::infrastructure::surface_bridge::{BridgeEvent, SurfaceGate};

// ── Shared application state ──────────────────────────────────────────────────

/// Application state shared between commands and background event pumps.
///
/// All fields are `tokio::sync::Mutex` because commands run in async
/// context; waiting for the lock suspends the task instead of blocking the
/// thread.
pub struct AppState {
    pub session: Mutex<ControlSession>,
    pub lifecycle: Mutex<SurfaceLifecycleManager>,
    pub config: Mutex<AppConfig>,
}

/// Collaborators needed to build an [`AppState`].
pub struct AppParts {
    pub config: AppConfig,
    pub transport: Arc<dyn Transport>,
    pub settings: Arc<dyn SettingsStore>,
    pub displays: Arc<dyn DisplayEnumerator>,
    pub factory: Arc<dyn SurfaceFactory>,
}

impl AppState {
    /// Builds the state and returns the lifecycle event receiver that the
    /// caller must pump through [`handle_lifecycle_event`].
    pub fn new(parts: AppParts) -> (Arc<Self>, mpsc::UnboundedReceiver<LifecycleEvent>) {
        let reporter = PlaybackReporter::new(parts.config.sync.report_interval());
        let session = ControlSession::new(parts.transport, parts.settings, reporter);
        let (lifecycle, events) = SurfaceLifecycleManager::new(parts.displays, parts.factory);
        (
            Arc::new(Self {
                session: Mutex::new(session),
                lifecycle: Mutex::new(lifecycle),
                config: Mutex::new(parts.config),
            }),
            events,
        )
    }
}

// ── Event pumps ───────────────────────────────────────────────────────────────

/// Applies a surface bridge event.
///
/// Connection changes go to the lifecycle manager.  Inbound envelopes are
/// answered by the control session, but only while their sender is the
/// attached surface.
pub async fn handle_bridge_event(state: &AppState, event: BridgeEvent) {
    match event {
        BridgeEvent::Connected(id) => {
            if !state.lifecycle.lock().await.mark_loaded(id) {
                debug!(surface_id = %id, "connection from a surface that is not opening");
            }
        }
        BridgeEvent::Disconnected(id) => {
            state.lifecycle.lock().await.surface_lost(id);
        }
        BridgeEvent::Envelope(id, envelope) => {
            let attached = {
                let lifecycle = state.lifecycle.lock().await;
                lifecycle.is_attached() && lifecycle.current_surface() == Some(id)
            };
            if !attached {
                debug!(surface_id = %id, "envelope from a surface that is not attached");
                return;
            }
            let Some(request) = SurfaceRequest::from_envelope(&envelope) else {
                warn!(
                    surface_id = %id,
                    message_type = %envelope.message_type,
                    "unsupported message from output surface"
                );
                return;
            };
            let mut session = state.session.lock().await;
            if let Err(e) = session.handle_surface_request(request) {
                warn!("failed to answer {request:?}: {e}");
            }
        }
    }
}

#[async_trait]
impl SurfaceGate for AppState {
    /// Only the surface the lifecycle manager spawned may attach.
    async fn admits(&self, surface_id: SurfaceId) -> bool {
        self.lifecycle.lock().await.expects(surface_id)
    }
}

/// Forwards a lifecycle event to the control session.
pub async fn handle_lifecycle_event(state: &AppState, event: LifecycleEvent) {
    let mut session = state.session.lock().await;
    if let Err(e) = session.handle_lifecycle_event(&event) {
        warn!("failed to handle lifecycle event {event:?}: {e}");
    }
}

// ── Data Transfer Objects ─────────────────────────────────────────────────────

/// Output surface status for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceStatusDto {
    /// `"absent"`, `"opening"`, `"attached"` or `"no_second_display"`.
    pub state: String,
    pub surface_id: Option<String>,
}

/// Snapshot of what the projection currently shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionDto {
    pub view: ViewKind,
    pub content_visible: bool,
    pub locale: String,
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub current_verse: u32,
    pub font_size: u32,
    pub media_path: Option<String>,
    pub zoom_level: f64,
    pub timer_message: String,
}

/// Timer settings from the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerDto {
    pub mode: TimerMode,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub is_running: bool,
}

/// Unified response wrapper used by commands.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResult<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

fn state_name(state: SurfaceState) -> &'static str {
    match state {
        SurfaceState::Absent => "absent",
        SurfaceState::Opening => "opening",
        SurfaceState::Attached => "attached",
        SurfaceState::NoSecondDisplay => "no_second_display",
    }
}

/// Turns a session result into a command result; an unclaimed intent is
/// reported as an error so the UI can revert its optimistic change.
fn claimed(result: Result<bool, SessionError>, what: &str) -> CommandResult<()> {
    match result {
        Ok(true) => CommandResult::ok(()),
        Ok(false) => CommandResult::err(format!("{what} was rejected")),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

// ── Commands: surface ─────────────────────────────────────────────────────────

/// Opens the output surface on the secondary display.
pub async fn open_projection(state: Arc<AppState>) -> CommandResult<SurfaceStatusDto> {
    let mut lifecycle = state.lifecycle.lock().await;
    match lifecycle.ensure() {
        EnsureOutcome::CreationFailed(reason) => CommandResult::err(reason),
        EnsureOutcome::NoSecondDisplay => CommandResult::err("no secondary display connected"),
        EnsureOutcome::Opening(_) | EnsureOutcome::AlreadyPresent(_) => {
            CommandResult::ok(status_of(&lifecycle))
        }
    }
}

/// Closes the output surface.
pub async fn close_projection(state: Arc<AppState>) -> CommandResult<SurfaceStatusDto> {
    let mut lifecycle = state.lifecycle.lock().await;
    lifecycle.close();
    CommandResult::ok(status_of(&lifecycle))
}

pub async fn get_surface_status(state: Arc<AppState>) -> CommandResult<SurfaceStatusDto> {
    let lifecycle = state.lifecycle.lock().await;
    CommandResult::ok(status_of(&lifecycle))
}

fn status_of(lifecycle: &SurfaceLifecycleManager) -> SurfaceStatusDto {
    SurfaceStatusDto {
        state: state_name(lifecycle.check()).to_string(),
        surface_id: lifecycle.current_surface().map(|id| id.to_string()),
    }
}

// ── Commands: projection state ────────────────────────────────────────────────

pub async fn get_projection(state: Arc<AppState>) -> CommandResult<ProjectionDto> {
    let session = state.session.lock().await;
    let d = session.dispatcher();
    let view = d.view().state();
    let bible = d.bible().state();
    let media = d.media().state();
    CommandResult::ok(ProjectionDto {
        view: view.view,
        content_visible: view.content_visible,
        locale: view.locale.clone(),
        book: bible.selected_book.map(str::to_string),
        chapter: bible.selected_chapter,
        current_verse: bible.current_verse,
        font_size: bible.verse_font_size,
        media_path: media.source.as_ref().map(|s| s.resource_path.clone()),
        zoom_level: media.zoom_level,
        timer_message: d.timer().state().message.clone(),
    })
}

pub async fn set_view(state: Arc<AppState>, view: ViewKind) -> CommandResult<()> {
    claimed(state.session.lock().await.set_view(view), "view change")
}

pub async fn toggle_content(state: Arc<AppState>) -> CommandResult<()> {
    claimed(state.session.lock().await.toggle_content(), "visibility toggle")
}

pub async fn set_locale(state: Arc<AppState>, locale: String) -> CommandResult<()> {
    claimed(state.session.lock().await.set_locale(&locale), "locale")
}

pub async fn select_verse(state: Arc<AppState>, position: u32) -> CommandResult<()> {
    claimed(state.session.lock().await.select_verse(position), "verse")
}

pub async fn set_font_size(state: Arc<AppState>, font_size: u32) -> CommandResult<()> {
    claimed(state.session.lock().await.set_font_size(font_size), "font size")
}

pub async fn select_media(
    state: Arc<AppState>,
    resource_path: String,
    kind: MediaKind,
) -> CommandResult<()> {
    claimed(
        state.session.lock().await.select_media(&resource_path, kind),
        "media selection",
    )
}

pub async fn clear_media(state: Arc<AppState>) -> CommandResult<()> {
    claimed(state.session.lock().await.clear_media(), "media clear")
}

pub async fn set_zoom(state: Arc<AppState>, zoom_level: f64) -> CommandResult<()> {
    claimed(state.session.lock().await.set_zoom(zoom_level), "zoom")
}

pub async fn set_pan(state: Arc<AppState>, x: f64, y: f64) -> CommandResult<()> {
    claimed(state.session.lock().await.set_pan(x, y), "pan")
}

/// Called by the UI's video element on every time update.
pub async fn report_video_time(state: Arc<AppState>, current_time: f64) -> CommandResult<bool> {
    let result = state
        .session
        .lock()
        .await
        .report_playback(PlaybackAction::Sync, current_time, Instant::now());
    match result {
        Ok(sent) => CommandResult::ok(sent),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

pub async fn set_timer(state: Arc<AppState>, timer: TimerDto) -> CommandResult<()> {
    claimed(
        state.session.lock().await.set_timer(TimerState {
            mode: timer.mode,
            duration_seconds: timer.duration_seconds,
            remaining_seconds: timer.remaining_seconds,
            is_running: timer.is_running,
        }),
        "timer",
    )
}

pub async fn set_timer_message(state: Arc<AppState>, message: String) -> CommandResult<()> {
    claimed(
        state.session.lock().await.set_timer_message(&message),
        "timer message",
    )
}

// ── Commands: content ─────────────────────────────────────────────────────────

/// Versions the text-content provider can stream.
pub async fn list_bible_versions(
    provider: Arc<dyn TextContentProvider>,
) -> CommandResult<Vec<BibleVersion>> {
    match provider.fetch_versions().await {
        Ok(versions) => CommandResult::ok(versions),
        Err(e) => CommandResult::err(e.to_string()),
    }
}

/// Streams a Bible version from `provider` to the output surface.
///
/// The session lock is released before streaming starts, so other commands
/// keep working during a long transfer.  Returns the number of chunks sent.
pub async fn forward_bible_content(
    state: Arc<AppState>,
    provider: Arc<dyn TextContentProvider>,
    version_id: String,
) -> CommandResult<u32> {
    let transport = state.session.lock().await.transport();
    match forward_content(transport.as_ref(), provider.as_ref(), &version_id).await {
        Ok(chunks) => CommandResult::ok(chunks),
        Err(e) => {
            warn!(version_id = %version_id, "content forwarding failed: {e}");
            CommandResult::err(e.to_string())
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
