//! Control session: turns operator intents into local state changes and
//! outbound envelopes.
//!
//! # Flow (for beginners)
//!
//! ```text
//! operator intent ──► typed SyncMessage ──► local Dispatcher (claimed?)
//!                                                  │ yes
//!                                                  ▼
//!                                  encode_message ──► Transport::send
//! ```
//!
//! The local store is always updated first, so the control surface shows
//! the change even when no output surface is attached.  Sends while detached
//! are dropped by the transport; when the output surface (re)attaches, the
//! session replays [`Dispatcher::snapshot`] so the output catches up.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use lectern_core::channel::Transport;
use lectern_core::domain::media::{MAX_ZOOM, MIN_ZOOM, PAN_LIMIT};
use lectern_core::domain::BibleStore;
use lectern_core::protocol::codec::{encode_message, ProtocolError};
use lectern_core::protocol::messages::{
    BibleContent, BibleMessage, ContentVisibility, FontSize, LocaleUpdate, MediaKind,
    MediaMessage, MediaSelection, PanOffset, PlaybackAction, PlaybackControl, SyncMessage,
    TimerCaption, TimerMessage, TimerState, VerseSelection, ViewChange, ViewKind, ViewMessage,
    ZoomLevel,
};
use lectern_core::protocol::requests::SurfaceRequest;
use lectern_core::Dispatcher;

use super::playback_reporter::PlaybackReporter;
use super::settings::{SettingsStore, FONT_SIZE_KEY};
use super::surface_lifecycle::LifecycleEvent;

/// Error type for control session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot encode outbound message: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Operator-facing session on the control surface.
pub struct ControlSession {
    dispatcher: Dispatcher,
    transport: Arc<dyn Transport>,
    settings: Arc<dyn SettingsStore>,
    reporter: PlaybackReporter,
}

impl ControlSession {
    /// Creates a session whose Bible font size is seeded from `settings`.
    pub fn new(
        transport: Arc<dyn Transport>,
        settings: Arc<dyn SettingsStore>,
        reporter: PlaybackReporter,
    ) -> Self {
        let bible = match settings
            .load(FONT_SIZE_KEY)
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
        {
            Some(size) => BibleStore::with_font_size(size),
            None => BibleStore::new(),
        };
        Self {
            dispatcher: Dispatcher::new(bible),
            transport,
            settings,
            reporter,
        }
    }

    /// Read access to the local stores.
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// The outbound channel, for senders that run outside the session lock.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::clone(&self.transport)
    }

    // ── View ─────────────────────────────────────────────────────────────────

    pub fn set_view(&mut self, view: ViewKind) -> Result<bool, SessionError> {
        self.apply(ViewMessage::Change(ViewChange { view }).into())
    }

    pub fn set_content_visible(&mut self, is_visible: bool) -> Result<bool, SessionError> {
        self.apply(ViewMessage::ToggleContent(ContentVisibility { is_visible }).into())
    }

    /// Flips content visibility.
    pub fn toggle_content(&mut self) -> Result<bool, SessionError> {
        let visible = self.dispatcher.view().state().content_visible;
        self.set_content_visible(!visible)
    }

    pub fn set_locale(&mut self, locale: &str) -> Result<bool, SessionError> {
        self.apply(
            ViewMessage::Locale(LocaleUpdate {
                locale: locale.to_string(),
            })
            .into(),
        )
    }

    // ── Bible ────────────────────────────────────────────────────────────────

    pub fn sync_bible_content(&mut self, content: BibleContent) -> Result<bool, SessionError> {
        self.apply(BibleMessage::SyncContent(content).into())
    }

    /// Selects a verse by 1-based position.  Out-of-range positions are not
    /// claimed and nothing is sent.
    pub fn select_verse(&mut self, position: u32) -> Result<bool, SessionError> {
        self.apply(
            BibleMessage::UpdateVerse(VerseSelection {
                current_verse: position,
            })
            .into(),
        )
    }

    pub fn next_verse(&mut self) -> Result<bool, SessionError> {
        let current = self.dispatcher.bible().state().current_verse;
        self.select_verse(current.saturating_add(1))
    }

    pub fn previous_verse(&mut self) -> Result<bool, SessionError> {
        let current = self.dispatcher.bible().state().current_verse;
        self.select_verse(current.saturating_sub(1))
    }

    /// Changes the verse font size and persists the clamped value.
    pub fn set_font_size(&mut self, font_size: u32) -> Result<bool, SessionError> {
        let claimed = self.apply(BibleMessage::UpdateFontSize(FontSize { font_size }).into())?;
        if claimed {
            let stored = self.dispatcher.bible().state().verse_font_size;
            if let Err(e) = self.settings.save(FONT_SIZE_KEY, json!(stored)) {
                warn!("failed to persist font size: {e}");
            }
        }
        Ok(claimed)
    }

    // ── Media ────────────────────────────────────────────────────────────────

    pub fn select_media(
        &mut self,
        resource_path: &str,
        kind: MediaKind,
    ) -> Result<bool, SessionError> {
        self.reporter.reset();
        self.apply(
            MediaMessage::Select(MediaSelection {
                resource_path: resource_path.to_string(),
                kind,
            })
            .into(),
        )
    }

    pub fn clear_media(&mut self) -> Result<bool, SessionError> {
        self.reporter.reset();
        self.apply(MediaMessage::Clear.into())
    }

    /// Sets the zoom level; the value sent is the clamped one.
    pub fn set_zoom(&mut self, zoom_level: f64) -> Result<bool, SessionError> {
        if !zoom_level.is_finite() {
            return Ok(false);
        }
        self.apply(
            MediaMessage::UpdateZoom(ZoomLevel {
                zoom_level: zoom_level.clamp(MIN_ZOOM, MAX_ZOOM),
            })
            .into(),
        )
    }

    /// Sets the pan offset; the values sent are the clamped ones.
    pub fn set_pan(&mut self, x: f64, y: f64) -> Result<bool, SessionError> {
        if !x.is_finite() || !y.is_finite() {
            return Ok(false);
        }
        self.apply(
            MediaMessage::UpdatePan(PanOffset {
                x: x.clamp(-PAN_LIMIT, PAN_LIMIT),
                y: y.clamp(-PAN_LIMIT, PAN_LIMIT),
            })
            .into(),
        )
    }

    pub fn play(&mut self, current_time: f64, now: Instant) -> Result<bool, SessionError> {
        self.report_playback(PlaybackAction::Play, current_time, now)
    }

    pub fn pause(&mut self, current_time: f64, now: Instant) -> Result<bool, SessionError> {
        self.report_playback(PlaybackAction::Pause, current_time, now)
    }

    pub fn seek(&mut self, current_time: f64, now: Instant) -> Result<bool, SessionError> {
        self.report_playback(PlaybackAction::Seek, current_time, now)
    }

    /// Sends a playback action for the selected video.
    ///
    /// `sync` reports are throttled by the [`PlaybackReporter`]; a throttled
    /// report returns `Ok(false)` and changes nothing.  Nothing is sent
    /// unless the selected source is a video.
    pub fn report_playback(
        &mut self,
        action: PlaybackAction,
        current_time: f64,
        now: Instant,
    ) -> Result<bool, SessionError> {
        let timed = self
            .dispatcher
            .media()
            .state()
            .source
            .as_ref()
            .map(|s| s.kind.is_timed())
            .unwrap_or(false);
        if !timed {
            debug!(?action, "no video selected; playback report skipped");
            return Ok(false);
        }
        if !current_time.is_finite() || current_time < 0.0 {
            return Ok(false);
        }
        if !self.reporter.should_report(action, now) {
            return Ok(false);
        }
        self.apply(
            MediaMessage::Control(PlaybackControl {
                action,
                current_time,
            })
            .into(),
        )
    }

    // ── Timer ────────────────────────────────────────────────────────────────

    pub fn set_timer(&mut self, state: TimerState) -> Result<bool, SessionError> {
        self.apply(TimerMessage::SyncState(state).into())
    }

    pub fn set_timer_message(&mut self, message: &str) -> Result<bool, SessionError> {
        self.apply(
            TimerMessage::UpdateMessage(TimerCaption {
                message: message.to_string(),
            })
            .into(),
        )
    }

    // ── Sync ─────────────────────────────────────────────────────────────────

    /// Sends every store's snapshot to the output surface, in dispatch order.
    ///
    /// Returns the number of envelopes sent (0 when detached).
    pub fn resync(&self) -> Result<usize, SessionError> {
        if !self.transport.is_attached() {
            debug!("resync skipped; no output surface attached");
            return Ok(0);
        }
        let snapshot = self.dispatcher.snapshot();
        let envelopes = snapshot
            .iter()
            .map(encode_message)
            .collect::<Result<Vec<_>, _>>()?;
        let count = envelopes.len();
        for envelope in envelopes {
            self.transport.send(envelope);
        }
        info!(messages = count, "output surface resynchronized");
        Ok(count)
    }

    /// Reacts to a surface lifecycle change.
    pub fn handle_lifecycle_event(&mut self, event: &LifecycleEvent) -> Result<(), SessionError> {
        match event {
            LifecycleEvent::Opened { surface_id } => {
                debug!(%surface_id, "output surface opened; resyncing");
                self.reporter.reset();
                self.resync()?;
            }
            LifecycleEvent::Closed { surface_id } => {
                debug!(%surface_id, "output surface closed");
                self.reporter.reset();
            }
            LifecycleEvent::NoSecondDisplay | LifecycleEvent::CreationFailed { .. } => {}
        }
        Ok(())
    }

    /// Answers a request the attached output surface sent back.
    pub fn handle_surface_request(&mut self, request: SurfaceRequest) -> Result<(), SessionError> {
        match request {
            SurfaceRequest::Resync => {
                debug!("output surface asked for a resync");
                self.reporter.reset();
                self.resync()?;
            }
        }
        Ok(())
    }

    /// Applies a message locally and, if claimed, sends it.
    fn apply(&mut self, msg: SyncMessage) -> Result<bool, SessionError> {
        // A message that cannot be encoded must not change local state.
        let envelope = encode_message(&msg)?;
        if !self.dispatcher.dispatch_message(&msg) {
            return Ok(false);
        }
        self.transport.send(envelope);
        Ok(true)
    }
}
