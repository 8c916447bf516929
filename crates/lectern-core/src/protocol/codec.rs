//! JSON codec for envelopes and the typed message model.
//!
//! Two conversions live here:
//!
//! ```text
//! text frame  <──decode_frame / encode_frame──>  Envelope
//! Envelope    <──decode_message / encode_message──>  SyncMessage
//! ```
//!
//! `decode_message` is where defensive payload validation happens.  A payload
//! is accepted only if every required field is present with the right JSON
//! type; optional fields fall back to their documented defaults.  Anything
//! else is a [`ProtocolError`], which receivers treat as "not claimed".

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::protocol::messages::{
    BibleMessage, Envelope, MediaMessage, MessageType, SyncMessage, TimerMessage, ViewMessage,
};

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The text frame is not a JSON envelope object.
    #[error("invalid envelope JSON: {0}")]
    InvalidJson(String),

    /// The envelope `type` is not part of this protocol version.
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    /// Required fields are missing or have the wrong type.
    #[error("malformed {message_type} payload: {reason}")]
    MalformedPayload {
        message_type: MessageType,
        reason: String,
    },

    /// A payload could not be turned into a JSON object.
    #[error("cannot serialize {message_type} payload: {reason}")]
    Serialize {
        message_type: MessageType,
        reason: String,
    },

    /// A base64 chunk contains characters outside the standard alphabet.
    #[error("invalid base64 data: {0}")]
    InvalidBase64(String),
}

// ── Frames ────────────────────────────────────────────────────────────────────

/// Serializes an envelope into one JSON text frame.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidJson`] if serialization fails.
pub fn encode_frame(envelope: &Envelope) -> Result<String, ProtocolError> {
    serde_json::to_string(envelope).map_err(|e| ProtocolError::InvalidJson(e.to_string()))
}

/// Parses one JSON text frame into an envelope.
///
/// Unknown `type` strings are accepted here; they are rejected later by
/// [`decode_message`].
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidJson`] if the frame is not a JSON object
/// with a string `type` field.
pub fn decode_frame(text: &str) -> Result<Envelope, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::InvalidJson(e.to_string()))
}

// ── Typed messages ────────────────────────────────────────────────────────────

/// Decodes and validates an envelope into a [`SyncMessage`].
///
/// # Errors
///
/// - [`ProtocolError::UnknownMessageType`] when `type` is not recognised.
/// - [`ProtocolError::MalformedPayload`] when required fields are missing,
///   have the wrong JSON type, or carry an invalid value.
///
/// # Examples
///
/// ```rust
/// use lectern_core::protocol::{decode_frame, decode_message};
/// use lectern_core::protocol::messages::{SyncMessage, ViewMessage, ViewKind};
///
/// let env = decode_frame(r#"{"type":"VIEW_CHANGE","data":{"view":"media"}}"#).unwrap();
/// match decode_message(&env).unwrap() {
///     SyncMessage::View(ViewMessage::Change(c)) => assert_eq!(c.view, ViewKind::Media),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub fn decode_message(envelope: &Envelope) -> Result<SyncMessage, ProtocolError> {
    let kind = envelope
        .kind()
        .ok_or_else(|| ProtocolError::UnknownMessageType(envelope.message_type.clone()))?;
    let data = &envelope.data;

    let msg = match kind {
        MessageType::ViewChange => ViewMessage::Change(payload(kind, data)?).into(),
        MessageType::ProjectionToggleContent => {
            ViewMessage::ToggleContent(payload(kind, data)?).into()
        }
        MessageType::LocaleUpdate => ViewMessage::Locale(payload(kind, data)?).into(),

        MessageType::BibleSyncContent => BibleMessage::SyncContent(payload(kind, data)?).into(),
        MessageType::BibleUpdateVerse => BibleMessage::UpdateVerse(payload(kind, data)?).into(),
        MessageType::BibleUpdateFontSize => {
            BibleMessage::UpdateFontSize(payload(kind, data)?).into()
        }
        MessageType::BibleContentChunk => BibleMessage::ContentChunk(payload(kind, data)?).into(),
        MessageType::BibleContentComplete => {
            BibleMessage::ContentComplete(payload(kind, data)?).into()
        }

        MessageType::MediaSelect => MediaMessage::Select(payload(kind, data)?).into(),
        MessageType::MediaClear => MediaMessage::Clear.into(),
        MessageType::MediaControl => {
            let control: crate::protocol::messages::PlaybackControl = payload(kind, data)?;
            if !control.current_time.is_finite() || control.current_time < 0.0 {
                return Err(ProtocolError::MalformedPayload {
                    message_type: kind,
                    reason: format!("currentTime out of range: {}", control.current_time),
                });
            }
            MediaMessage::Control(control).into()
        }
        MessageType::MediaUpdateZoom => MediaMessage::UpdateZoom(payload(kind, data)?).into(),
        MessageType::MediaUpdatePan => MediaMessage::UpdatePan(payload(kind, data)?).into(),

        MessageType::TimerSyncState => TimerMessage::SyncState(payload(kind, data)?).into(),
        MessageType::TimerUpdateMessage => {
            TimerMessage::UpdateMessage(payload(kind, data)?).into()
        }
    };
    Ok(msg)
}

/// Encodes a typed message into an envelope.
///
/// # Errors
///
/// Returns [`ProtocolError::Serialize`] if a payload does not serialize to
/// a JSON object (for example a non-finite float).
pub fn encode_message(msg: &SyncMessage) -> Result<Envelope, ProtocolError> {
    let kind = msg.message_type();
    let data = match msg {
        SyncMessage::View(m) => match m {
            ViewMessage::Change(p) => to_map(kind, p)?,
            ViewMessage::ToggleContent(p) => to_map(kind, p)?,
            ViewMessage::Locale(p) => to_map(kind, p)?,
        },
        SyncMessage::Bible(m) => match m {
            BibleMessage::SyncContent(p) => to_map(kind, p)?,
            BibleMessage::UpdateVerse(p) => to_map(kind, p)?,
            BibleMessage::UpdateFontSize(p) => to_map(kind, p)?,
            BibleMessage::ContentChunk(p) => to_map(kind, p)?,
            BibleMessage::ContentComplete(p) => to_map(kind, p)?,
        },
        SyncMessage::Media(m) => match m {
            MediaMessage::Select(p) => to_map(kind, p)?,
            MediaMessage::Clear => Map::new(),
            MediaMessage::Control(p) => to_map(kind, p)?,
            MediaMessage::UpdateZoom(p) => to_map(kind, p)?,
            MediaMessage::UpdatePan(p) => to_map(kind, p)?,
        },
        SyncMessage::Timer(m) => match m {
            TimerMessage::SyncState(p) => to_map(kind, p)?,
            TimerMessage::UpdateMessage(p) => to_map(kind, p)?,
        },
    };
    Ok(Envelope::new(kind, data))
}

fn payload<T: DeserializeOwned>(
    kind: MessageType,
    data: &Map<String, Value>,
) -> Result<T, ProtocolError> {
    serde_json::from_value(Value::Object(data.clone())).map_err(|e| {
        ProtocolError::MalformedPayload {
            message_type: kind,
            reason: e.to_string(),
        }
    })
}

fn to_map<T: Serialize>(kind: MessageType, value: &T) -> Result<Map<String, Value>, ProtocolError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) if map.values().all(|v| !v.is_null()) => Ok(map),
        Ok(other) => Err(ProtocolError::Serialize {
            message_type: kind,
            reason: format!("expected an object without nulls, got {other}"),
        }),
        Err(e) => Err(ProtocolError::Serialize {
            message_type: kind,
            reason: e.to_string(),
        }),
    }
}

// ── Helper: base64 ────────────────────────────────────────────────────────────

/// Encodes binary data as standard base64 (RFC 4648) with `=` padding.
///
/// Content chunks from the text provider are opaque bytes and may not be
/// valid UTF-8, so they are carried inside JSON strings in this form.
pub fn base64_encode(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Decodes standard padded base64 produced by [`base64_encode`].
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidBase64`] if the length, a character or
/// the padding is not canonical standard base64.
pub fn base64_decode(text: &str) -> Result<Vec<u8>, ProtocolError> {
    BASE64
        .decode(text)
        .map_err(|e| ProtocolError::InvalidBase64(e.to_string()))
}
