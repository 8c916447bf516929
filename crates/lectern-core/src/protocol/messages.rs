//! All message types exchanged between the control surface and the output surface.
//!
//! Every message travels as an [`Envelope`]: a JSON object of the form
//! `{"type": "<MESSAGE_TYPE>", "data": {...}}`.  The `type` string selects one
//! member of the closed [`MessageType`] enumeration, and each member belongs to
//! exactly one [`Domain`].
//!
//! # Two layers (for beginners)
//!
//! - **`Envelope`** is the loose, wire-level shape.  Its `type` is kept as a
//!   plain string and its `data` as a JSON map, so that an envelope from a
//!   newer peer (with a type we have never heard of) still parses and can be
//!   dropped politely instead of failing the whole connection.
//!
//! - **`SyncMessage`** is the strongly typed model.  It is a tagged union with
//!   one variant per domain and one inner variant per message type.  Receivers
//!   decode an envelope into a `SyncMessage` exactly once and then `match` on
//!   it; the compiler checks that every message type is handled.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ── Domains ───────────────────────────────────────────────────────────────────

/// The four fixed state domains.  Messages never cross domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    View,
    Bible,
    Media,
    Timer,
}

// ── Message type codes ────────────────────────────────────────────────────────

/// Every message type understood by this protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    // View domain
    ViewChange,
    ProjectionToggleContent,
    LocaleUpdate,
    // Bible domain
    BibleSyncContent,
    BibleUpdateVerse,
    BibleUpdateFontSize,
    BibleContentChunk,
    BibleContentComplete,
    // Media domain
    MediaSelect,
    MediaClear,
    MediaControl,
    MediaUpdateZoom,
    MediaUpdatePan,
    // Timer domain
    TimerSyncState,
    TimerUpdateMessage,
}

impl MessageType {
    /// All message types, grouped by domain.
    pub const ALL: [MessageType; 15] = [
        MessageType::ViewChange,
        MessageType::ProjectionToggleContent,
        MessageType::LocaleUpdate,
        MessageType::BibleSyncContent,
        MessageType::BibleUpdateVerse,
        MessageType::BibleUpdateFontSize,
        MessageType::BibleContentChunk,
        MessageType::BibleContentComplete,
        MessageType::MediaSelect,
        MessageType::MediaClear,
        MessageType::MediaControl,
        MessageType::MediaUpdateZoom,
        MessageType::MediaUpdatePan,
        MessageType::TimerSyncState,
        MessageType::TimerUpdateMessage,
    ];

    /// The `type` string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::ViewChange => "VIEW_CHANGE",
            MessageType::ProjectionToggleContent => "PROJECTION_TOGGLE_CONTENT",
            MessageType::LocaleUpdate => "LOCALE_UPDATE",
            MessageType::BibleSyncContent => "BIBLE_SYNC_CONTENT",
            MessageType::BibleUpdateVerse => "BIBLE_UPDATE_VERSE",
            MessageType::BibleUpdateFontSize => "BIBLE_UPDATE_FONT_SIZE",
            MessageType::BibleContentChunk => "BIBLE_CONTENT_CHUNK",
            MessageType::BibleContentComplete => "BIBLE_CONTENT_COMPLETE",
            MessageType::MediaSelect => "MEDIA_SELECT",
            MessageType::MediaClear => "MEDIA_CLEAR",
            MessageType::MediaControl => "MEDIA_CONTROL",
            MessageType::MediaUpdateZoom => "MEDIA_UPDATE_ZOOM",
            MessageType::MediaUpdatePan => "MEDIA_UPDATE_PAN",
            MessageType::TimerSyncState => "TIMER_SYNC_STATE",
            MessageType::TimerUpdateMessage => "TIMER_UPDATE_MESSAGE",
        }
    }

    /// Parses a wire `type` string.  Returns `None` for unknown types.
    pub fn from_wire(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s)
    }

    /// The domain that owns this message type.
    pub fn domain(self) -> Domain {
        match self {
            MessageType::ViewChange
            | MessageType::ProjectionToggleContent
            | MessageType::LocaleUpdate => Domain::View,
            MessageType::BibleSyncContent
            | MessageType::BibleUpdateVerse
            | MessageType::BibleUpdateFontSize
            | MessageType::BibleContentChunk
            | MessageType::BibleContentComplete => Domain::Bible,
            MessageType::MediaSelect
            | MessageType::MediaClear
            | MessageType::MediaControl
            | MessageType::MediaUpdateZoom
            | MessageType::MediaUpdatePan => Domain::Media,
            MessageType::TimerSyncState | MessageType::TimerUpdateMessage => Domain::Timer,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Envelope ──────────────────────────────────────────────────────────────────

/// The wire-level message unit: `{"type": ..., "data": {...}}`.
///
/// Envelopes are values.  Sending one hands over a copy, so nothing the
/// sender does afterwards can change what the receiver observes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Wire name of the message type (see [`MessageType::as_str`]).
    #[serde(rename = "type")]
    pub message_type: String,
    /// Payload fields.  A missing `data` key decodes as an empty map.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Envelope {
    /// Builds an envelope for a known message type.
    pub fn new(message_type: MessageType, data: Map<String, Value>) -> Self {
        Self {
            message_type: message_type.as_str().to_string(),
            data,
        }
    }

    /// The typed message kind, or `None` when the type is not recognised.
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_wire(&self.message_type)
    }
}

// ── Shared payload pieces ─────────────────────────────────────────────────────

/// One verse of a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verse {
    pub number: u32,
    pub text: String,
}

/// Which full-screen view the output surface is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Bible,
    Media,
    Timer,
    #[default]
    Blank,
}

/// Kind of a selected media resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
    Pdf,
}

impl MediaKind {
    /// Whether the resource has a playback clock that needs drift correction.
    pub fn is_timed(self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

/// Playback action carried by `MEDIA_CONTROL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackAction {
    Play,
    Pause,
    Seek,
    /// Periodic position report; the receiver corrects drift.
    Sync,
}

/// Timer display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Countdown,
    Stopwatch,
    Clock,
}

// ── Per-message payload structs ───────────────────────────────────────────────

/// VIEW_CHANGE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewChange {
    pub view: ViewKind,
}

/// PROJECTION_TOGGLE_CONTENT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentVisibility {
    pub is_visible: bool,
}

/// LOCALE_UPDATE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleUpdate {
    pub locale: String,
}

/// BIBLE_SYNC_CONTENT: the full chapter currently on display.
///
/// `isMultiVersion` and `secondVersionChapterVerses` are optional on the wire
/// and default to `false` and an empty list.  The human-readable book name is
/// never read from the wire; it is derived from `bookNumber`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BibleContent {
    pub book_number: u8,
    pub chapter: u32,
    pub chapter_verses: Vec<Verse>,
    pub current_verse: u32,
    #[serde(default)]
    pub is_multi_version: bool,
    #[serde(default)]
    pub second_version_chapter_verses: Vec<Verse>,
}

/// BIBLE_UPDATE_VERSE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerseSelection {
    pub current_verse: u32,
}

/// BIBLE_UPDATE_FONT_SIZE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontSize {
    pub font_size: u32,
}

/// BIBLE_CONTENT_CHUNK: one chunk of a text-content provider stream,
/// base64-encoded so it survives a JSON string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentChunk {
    pub version_id: String,
    pub index: u32,
    pub data: String,
}

/// BIBLE_CONTENT_COMPLETE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentComplete {
    pub version_id: String,
    pub chunk_count: u32,
}

/// MEDIA_SELECT: `resourcePath` is resolved by the local resource server,
/// never as a raw filesystem path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaSelection {
    pub resource_path: String,
    pub kind: MediaKind,
}

/// MEDIA_CONTROL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackControl {
    pub action: PlaybackAction,
    /// Authoritative playback position in seconds.
    pub current_time: f64,
}

/// MEDIA_UPDATE_ZOOM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomLevel {
    pub zoom_level: f64,
}

/// MEDIA_UPDATE_PAN
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanOffset {
    pub x: f64,
    pub y: f64,
}

/// TIMER_SYNC_STATE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub mode: TimerMode,
    pub duration_seconds: u64,
    pub remaining_seconds: u64,
    pub is_running: bool,
}

/// TIMER_UPDATE_MESSAGE: free text shown under the timer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerCaption {
    pub message: String,
}

// ── Typed message model ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ViewMessage {
    Change(ViewChange),
    ToggleContent(ContentVisibility),
    Locale(LocaleUpdate),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BibleMessage {
    SyncContent(BibleContent),
    UpdateVerse(VerseSelection),
    UpdateFontSize(FontSize),
    ContentChunk(ContentChunk),
    ContentComplete(ContentComplete),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaMessage {
    Select(MediaSelection),
    Clear,
    Control(PlaybackControl),
    UpdateZoom(ZoomLevel),
    UpdatePan(PanOffset),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TimerMessage {
    SyncState(TimerState),
    UpdateMessage(TimerCaption),
}

/// A fully decoded, validated message, tagged by domain.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncMessage {
    View(ViewMessage),
    Bible(BibleMessage),
    Media(MediaMessage),
    Timer(TimerMessage),
}

impl SyncMessage {
    /// The message type this value encodes to.
    pub fn message_type(&self) -> MessageType {
        match self {
            SyncMessage::View(m) => match m {
                ViewMessage::Change(_) => MessageType::ViewChange,
                ViewMessage::ToggleContent(_) => MessageType::ProjectionToggleContent,
                ViewMessage::Locale(_) => MessageType::LocaleUpdate,
            },
            SyncMessage::Bible(m) => match m {
                BibleMessage::SyncContent(_) => MessageType::BibleSyncContent,
                BibleMessage::UpdateVerse(_) => MessageType::BibleUpdateVerse,
                BibleMessage::UpdateFontSize(_) => MessageType::BibleUpdateFontSize,
                BibleMessage::ContentChunk(_) => MessageType::BibleContentChunk,
                BibleMessage::ContentComplete(_) => MessageType::BibleContentComplete,
            },
            SyncMessage::Media(m) => match m {
                MediaMessage::Select(_) => MessageType::MediaSelect,
                MediaMessage::Clear => MessageType::MediaClear,
                MediaMessage::Control(_) => MessageType::MediaControl,
                MediaMessage::UpdateZoom(_) => MessageType::MediaUpdateZoom,
                MediaMessage::UpdatePan(_) => MessageType::MediaUpdatePan,
            },
            SyncMessage::Timer(m) => match m {
                TimerMessage::SyncState(_) => MessageType::TimerSyncState,
                TimerMessage::UpdateMessage(_) => MessageType::TimerUpdateMessage,
            },
        }
    }

    /// The domain this message belongs to.
    pub fn domain(&self) -> Domain {
        match self {
            SyncMessage::View(_) => Domain::View,
            SyncMessage::Bible(_) => Domain::Bible,
            SyncMessage::Media(_) => Domain::Media,
            SyncMessage::Timer(_) => Domain::Timer,
        }
    }
}

impl From<ViewMessage> for SyncMessage {
    fn from(m: ViewMessage) -> Self {
        SyncMessage::View(m)
    }
}

impl From<BibleMessage> for SyncMessage {
    fn from(m: BibleMessage) -> Self {
        SyncMessage::Bible(m)
    }
}

impl From<MediaMessage> for SyncMessage {
    fn from(m: MediaMessage) -> Self {
        SyncMessage::Media(m)
    }
}

impl From<TimerMessage> for SyncMessage {
    fn from(m: TimerMessage) -> Self {
        SyncMessage::Timer(m)
    }
}
