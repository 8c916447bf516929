//! Command bridge for the output renderer.
//!
//! The renderer (the web view that actually paints verses, media and the
//! timer) never touches the stores directly.  It polls these commands, or
//! waits on [`OutputAppState::subscribe`], and paints whatever they return.
//!
//! # DTOs
//!
//! `RenderStateDto` flattens all four stores into one JSON-friendly snapshot
//! so the renderer needs a single call per repaint.
//!
//! # `CommandResult<T>`
//!
//! All commands return the same `{ success, data, error }` shape:
//! ```json
//! { "success": true,  "data": {...}, "error": null  }
//! { "success": false, "data": null,  "error": "..."  }
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{info, warn};

use lectern_core::protocol::messages::{Envelope, MediaKind, TimerMode, Verse, ViewKind};
use lectern_core::protocol::requests::SurfaceRequest;

use crate::application::output_session::{resource_url, OutputSession};
use crate::infrastructure::control_link::LinkEvent;

// ── Shared application state ──────────────────────────────────────────────────

/// Link state as seen by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkStatus {
    /// Still trying to reach the control surface.
    Connecting,
    /// Receiving state from the control surface.
    Connected,
    /// The control surface closed the link; the process is about to exit.
    Disconnected,
}

/// Where the window should be placed, from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceGeometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Runtime state shared between commands and the link event pump.
pub struct OutputAppState {
    pub session: Mutex<OutputSession>,
    pub link_status: Mutex<LinkStatus>,
    pub geometry: SurfaceGeometry,
    resource_base: String,
    revision: watch::Receiver<u64>,
    uplink: mpsc::UnboundedSender<Envelope>,
}

impl OutputAppState {
    /// Builds the state and returns the uplink receiver that the caller
    /// must hand to the control link.
    pub fn new(
        session: OutputSession,
        geometry: SurfaceGeometry,
        resource_base: impl Into<String>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Envelope>) {
        let revision = session.dispatcher().subscribe();
        let (uplink, uplink_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Self {
            session: Mutex::new(session),
            link_status: Mutex::new(LinkStatus::Connecting),
            geometry,
            resource_base: resource_base.into(),
            revision,
            uplink,
        });
        (state, uplink_rx)
    }

    /// A receiver that changes after every applied message.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.clone()
    }
}

// ── Event pump ────────────────────────────────────────────────────────────────

/// Applies one link event.  Returns `false` once the link is gone.
pub async fn handle_link_event(state: &OutputAppState, event: LinkEvent) -> bool {
    match event {
        LinkEvent::Connected => {
            *state.link_status.lock().await = LinkStatus::Connected;
            true
        }
        LinkEvent::Envelope(envelope) => {
            let mut session = state.session.lock().await;
            if !session.handle_envelope(&envelope) {
                warn!(message_type = %envelope.message_type, "envelope not claimed");
            }
            true
        }
        LinkEvent::Disconnected => {
            info!("control surface went away");
            *state.link_status.lock().await = LinkStatus::Disconnected;
            false
        }
    }
}

// ── DTOs ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderStateDto {
    pub view: ViewKind,
    pub content_visible: bool,
    pub locale: String,
    pub bible: BibleDto,
    pub media: MediaDto,
    pub timer: TimerDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BibleDto {
    pub book: Option<String>,
    pub chapter: Option<u32>,
    pub verses: Vec<Verse>,
    pub current_verse: u32,
    pub second_version_verses: Vec<Verse>,
    pub font_size: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaDto {
    /// HTTP URL on the resource server; `None` when nothing is selected.
    pub url: Option<String>,
    pub kind: Option<MediaKind>,
    pub is_playing: bool,
    pub zoom_level: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerDto {
    pub mode: TimerMode,
    pub remaining_seconds: u64,
    pub is_running: bool,
    pub message: String,
}

/// Unified response wrapper for output commands.
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

// ── Commands ──────────────────────────────────────────────────────────────────

/// Everything the renderer needs for one repaint.
pub async fn get_render_state(state: Arc<OutputAppState>) -> CommandResult<RenderStateDto> {
    let session = state.session.lock().await;
    let d = session.dispatcher();
    let view = d.view().state();
    let bible = d.bible().state();
    let media = d.media().state();
    let timer = d.timer().state();

    CommandResult::ok(RenderStateDto {
        view: view.view,
        content_visible: view.content_visible,
        locale: view.locale.clone(),
        bible: BibleDto {
            book: bible.selected_book.map(str::to_string),
            chapter: bible.selected_chapter,
            verses: bible.chapter_verses.clone(),
            current_verse: bible.current_verse,
            second_version_verses: bible.second_version_chapter_verses.clone(),
            font_size: bible.verse_font_size,
        },
        media: MediaDto {
            url: media
                .source
                .as_ref()
                .map(|s| resource_url(&state.resource_base, &s.resource_path)),
            kind: media.source.as_ref().map(|s| s.kind),
            is_playing: media.playback.is_playing,
            zoom_level: media.zoom_level,
            pan_x: media.pan.x,
            pan_y: media.pan.y,
        },
        timer: TimerDto {
            mode: timer.mode,
            remaining_seconds: timer.remaining_seconds,
            is_running: timer.is_running,
            message: timer.message.clone(),
        },
    })
}

/// Downloaded Bible text, once the control surface marked it complete.
pub async fn get_bible_content(state: Arc<OutputAppState>) -> CommandResult<Vec<u8>> {
    let session = state.session.lock().await;
    match session.dispatcher().bible().content() {
        Some(buffer) if buffer.is_complete() => CommandResult::ok(buffer.bytes()),
        Some(_) => CommandResult::err("content transfer in progress"),
        None => CommandResult::err("no content received"),
    }
}

pub async fn get_link_status(state: Arc<OutputAppState>) -> CommandResult<String> {
    let status = state.link_status.lock().await;
    CommandResult::ok(format!("{status:?}"))
}

pub async fn get_geometry(state: Arc<OutputAppState>) -> CommandResult<SurfaceGeometry> {
    CommandResult::ok(state.geometry)
}

/// Asks the control surface to replay its full state, e.g. after the
/// renderer reloaded and lost what it had painted.
pub async fn request_resync(state: Arc<OutputAppState>) -> CommandResult<()> {
    if *state.link_status.lock().await == LinkStatus::Disconnected {
        return CommandResult::err("control surface is not connected");
    }
    match state.uplink.send(SurfaceRequest::Resync.to_envelope()) {
        Ok(()) => {
            info!("resync requested");
            CommandResult::ok(())
        }
        Err(_) => CommandResult::err("control link is closed"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
