//! Protocol module containing message types, surface requests, the JSON
//! codec, and frame sequencing.

pub mod codec;
pub mod messages;
pub mod requests;
pub mod sequence;

pub use codec::{
    base64_decode, base64_encode, decode_frame, decode_message, encode_frame, encode_message,
    ProtocolError,
};
pub use messages::*;
pub use requests::SurfaceRequest;
pub use sequence::SequenceCounter;
