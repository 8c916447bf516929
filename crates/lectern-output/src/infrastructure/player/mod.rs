//! [`MediaPlayer`](crate::application::media_sync::MediaPlayer)
//! implementations.
//!
//! - **`clock`** – Headless player that keeps a simulated playback clock.
//! - **`mock`** – Call recorder for tests.

pub mod clock;
pub mod mock;

pub use clock::ClockPlayer;
