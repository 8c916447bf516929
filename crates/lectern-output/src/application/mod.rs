//! Application layer use cases for the output surface.
//!
//! - **`output_session`** – Applies inbound envelopes to the domain stores
//!   and mirrors media changes onto the video player.
//!
//! - **`media_sync`** – Drift correction.  Compares each reported playback
//!   position with the local player and seeks or nudges the rate.  The
//!   player is a `MediaPlayer` trait object injected at construction time.

pub mod media_sync;
pub mod output_session;
