//! OutputSession: applies inbound envelopes on the output surface.
//!
//! Every envelope from the control surface goes through the dispatcher
//! first.  Media messages the media store claimed are then mirrored onto the
//! video player:
//!
//! - `MEDIA_SELECT` of a video loads it from the resource server.
//! - `MEDIA_SELECT` of an image/PDF, or `MEDIA_CLEAR`, unloads any video.
//! - `MEDIA_CONTROL` drives the [`MediaSyncEngine`] while a video is selected.
//!
//! Zoom and pan are plain store state; the renderer reads them as-is.

use lectern_core::domain::media::MediaSource;
use lectern_core::protocol::messages::{Envelope, MediaMessage, SyncMessage};
use lectern_core::{decode_message, Dispatcher};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tracing::{debug, warn};

use crate::application::media_sync::{MediaSyncEngine, SyncOutcome};

/// Scheme prefix that selections may carry.
const RESOURCE_SCHEME: &str = "local-resource://";

/// Characters escaped inside one URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Builds the HTTP URL for a resource path on the resource server at `base`.
///
/// # Examples
///
/// ```rust
/// use lectern_output::application::output_session::resource_url;
///
/// assert_eq!(
///     resource_url("http://127.0.0.1:24901", "local-resource://media/my clip.mp4"),
///     "http://127.0.0.1:24901/media/my%20clip.mp4"
/// );
/// ```
pub fn resource_url(base: &str, resource_path: &str) -> String {
    let relative = resource_path
        .strip_prefix(RESOURCE_SCHEME)
        .unwrap_or(resource_path)
        .trim_start_matches('/');
    let encoded = relative
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/");
    format!("{}/{encoded}", base.trim_end_matches('/'))
}

pub struct OutputSession {
    dispatcher: Dispatcher,
    engine: MediaSyncEngine,
    resource_base: String,
}

impl OutputSession {
    /// `resource_base` is the resource server's origin, e.g.
    /// `http://127.0.0.1:24901`.
    pub fn new(engine: MediaSyncEngine, resource_base: impl Into<String>) -> Self {
        Self {
            dispatcher: Dispatcher::default(),
            engine,
            resource_base: resource_base.into(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn engine(&self) -> &MediaSyncEngine {
        &self.engine
    }

    /// Decodes and applies one envelope.  Returns `true` if a store claimed it.
    pub fn handle_envelope(&mut self, envelope: &Envelope) -> bool {
        match decode_message(envelope) {
            Ok(msg) => self.handle_message(&msg),
            Err(e) => {
                debug!("dropping envelope {}: {e}", envelope.message_type);
                false
            }
        }
    }

    /// Applies one typed message.  Returns `true` if a store claimed it.
    pub fn handle_message(&mut self, msg: &SyncMessage) -> bool {
        let previous = self.dispatcher.media().state().source.clone();
        if !self.dispatcher.dispatch_message(msg) {
            return false;
        }
        if let SyncMessage::Media(m) = msg {
            self.follow_media(m, previous);
        }
        true
    }

    fn follow_media(&mut self, msg: &MediaMessage, previous: Option<MediaSource>) {
        match msg {
            MediaMessage::Select(_) | MediaMessage::Clear => {
                let current = self.dispatcher.media().state().source.clone();
                match current {
                    Some(source) if source.kind.is_timed() => {
                        let url = resource_url(&self.resource_base, &source.resource_path);
                        if let Err(e) = self.engine.load(&url) {
                            warn!("cannot load {url}: {e}");
                        }
                    }
                    _ => {
                        if previous.is_some_and(|p| p.kind.is_timed()) {
                            self.engine.unload();
                        }
                    }
                }
            }
            MediaMessage::Control(control) => {
                let timed = self
                    .dispatcher
                    .media()
                    .state()
                    .source
                    .as_ref()
                    .is_some_and(|s| s.kind.is_timed());
                if !timed {
                    debug!("playback control without a video; ignored by the player");
                    return;
                }
                let outcome = self.engine.handle_control(control);
                if outcome == SyncOutcome::Failed {
                    debug!(action = ?control.action, "correction failed; waiting for next report");
                }
            }
            MediaMessage::UpdateZoom(_) | MediaMessage::UpdatePan(_) => {}
        }
    }
}
