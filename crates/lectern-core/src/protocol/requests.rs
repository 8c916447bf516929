//! Requests the output surface sends back to the control surface.
//!
//! State only ever flows control → output through the [`MessageType`]
//! catalogue.  The reverse direction is much smaller: the output surface can
//! ask for things, never change them.  Requests use the same envelope shape
//! but their own type names, so a store never mistakes one for state.
//!
//! [`MessageType`]: crate::protocol::messages::MessageType

use serde_json::Map;

use crate::protocol::messages::Envelope;

/// One request from the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRequest {
    /// Replay the full state snapshot, e.g. after the renderer reloaded.
    Resync,
}

impl SurfaceRequest {
    pub const ALL: [SurfaceRequest; 1] = [SurfaceRequest::Resync];

    /// Wire name carried in the envelope `type`.
    pub fn as_str(self) -> &'static str {
        match self {
            SurfaceRequest::Resync => "SURFACE_RESYNC_REQUEST",
        }
    }

    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }

    /// Requests carry no payload.
    pub fn to_envelope(self) -> Envelope {
        Envelope {
            message_type: self.as_str().to_string(),
            data: Map::new(),
        }
    }

    /// `None` for anything that is not a request, including state messages.
    pub fn from_envelope(envelope: &Envelope) -> Option<Self> {
        Self::from_wire(&envelope.message_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::{decode_frame, encode_frame};
    use crate::protocol::messages::MessageType;

    #[test]
    fn test_request_names_never_collide_with_state_messages() {
        for request in SurfaceRequest::ALL {
            assert!(MessageType::from_wire(request.as_str()).is_none());
        }
    }

    #[test]
    fn test_resync_request_survives_a_text_frame() {
        // Arrange
        let text = encode_frame(&SurfaceRequest::Resync.to_envelope()).expect("encode");

        // Act
        let envelope = decode_frame(&text).expect("decode");

        // Assert
        assert_eq!(text, r#"{"type":"SURFACE_RESYNC_REQUEST","data":{}}"#);
        assert_eq!(SurfaceRequest::from_envelope(&envelope), Some(SurfaceRequest::Resync));
    }

    #[test]
    fn test_state_message_is_not_a_request() {
        let envelope = Envelope::new(MessageType::MediaClear, Map::new());

        assert_eq!(SurfaceRequest::from_envelope(&envelope), None);
    }
}
