//! Media domain store: the selected resource, its playback state, and the
//! zoom/pan transform used for images and PDFs.
//!
//! Zoom and pan are plain last-write-wins values.  Out-of-range values are
//! clamped rather than rejected, so a slider dragged past its end still moves
//! both surfaces to the limit.

use crate::domain::DomainStore;
use crate::protocol::messages::{
    Domain, MediaKind, MediaMessage, MediaSelection, PanOffset, PlaybackAction, PlaybackControl,
    SyncMessage, ZoomLevel,
};

pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 5.0;
pub const DEFAULT_ZOOM: f64 = 1.0;
/// Pan offsets are fractions of the rendered size, bounded on both axes.
pub const PAN_LIMIT: f64 = 1.0;

/// The currently selected resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSource {
    pub resource_path: String,
    pub kind: MediaKind,
}

/// Last known playback state of the selected resource.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlaybackState {
    pub is_playing: bool,
    /// Seconds; the control surface's clock is authoritative.
    pub position: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pan {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaState {
    pub source: Option<MediaSource>,
    pub playback: PlaybackState,
    pub zoom_level: f64,
    pub pan: Pan,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            source: None,
            playback: PlaybackState::default(),
            zoom_level: DEFAULT_ZOOM,
            pan: Pan::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    state: MediaState,
}

impl MediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MediaState {
        &self.state
    }

    fn control(&mut self, c: &PlaybackControl) {
        let playback = &mut self.state.playback;
        match c.action {
            PlaybackAction::Play => playback.is_playing = true,
            PlaybackAction::Pause => playback.is_playing = false,
            PlaybackAction::Seek | PlaybackAction::Sync => {}
        }
        playback.position = c.current_time;
    }
}

impl DomainStore for MediaStore {
    type Message = MediaMessage;
    const DOMAIN: Domain = Domain::Media;

    fn select(message: &SyncMessage) -> Option<&MediaMessage> {
        match message {
            SyncMessage::Media(m) => Some(m),
            _ => None,
        }
    }

    fn apply(&mut self, message: &MediaMessage) -> bool {
        match message {
            MediaMessage::Select(s) => {
                // A new resource starts paused at 0 with the default transform.
                self.state = MediaState {
                    source: Some(MediaSource {
                        resource_path: s.resource_path.clone(),
                        kind: s.kind,
                    }),
                    ..MediaState::default()
                };
                true
            }
            MediaMessage::Clear => {
                self.state = MediaState::default();
                true
            }
            MediaMessage::Control(c) => {
                if !c.current_time.is_finite() || c.current_time < 0.0 {
                    return false;
                }
                self.control(c);
                true
            }
            MediaMessage::UpdateZoom(z) => {
                if !z.zoom_level.is_finite() {
                    return false;
                }
                self.state.zoom_level = z.zoom_level.clamp(MIN_ZOOM, MAX_ZOOM);
                true
            }
            MediaMessage::UpdatePan(p) => {
                if !p.x.is_finite() || !p.y.is_finite() {
                    return false;
                }
                self.state.pan = Pan {
                    x: p.x.clamp(-PAN_LIMIT, PAN_LIMIT),
                    y: p.y.clamp(-PAN_LIMIT, PAN_LIMIT),
                };
                true
            }
        }
    }

    fn snapshot(&self) -> Vec<SyncMessage> {
        let Some(source) = &self.state.source else {
            return vec![SyncMessage::Media(MediaMessage::Clear)];
        };

        let mut out = vec![
            MediaMessage::Select(MediaSelection {
                resource_path: source.resource_path.clone(),
                kind: source.kind,
            }),
            MediaMessage::UpdateZoom(ZoomLevel {
                zoom_level: self.state.zoom_level,
            }),
            MediaMessage::UpdatePan(PanOffset {
                x: self.state.pan.x,
                y: self.state.pan.y,
            }),
        ];
        if source.kind.is_timed() {
            let action = if self.state.playback.is_playing {
                PlaybackAction::Play
            } else {
                PlaybackAction::Pause
            };
            out.push(MediaMessage::Control(PlaybackControl {
                action,
                current_time: self.state.playback.position,
            }));
        }
        out.into_iter().map(SyncMessage::Media).collect()
    }
}
