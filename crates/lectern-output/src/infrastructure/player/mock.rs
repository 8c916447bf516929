//! Mock media player for unit testing.
//!
//! Every call is recorded in order so tests can assert exactly which
//! corrections the engine issued.  The local position is set by the test
//! and does not advance on its own.
//!
//! # `should_fail` flag
//!
//! While `should_fail` is set, `play`, `pause`, `seek` and `set_rate` return
//! [`PlayerError::Rejected`].  It is atomic so a test can flip it between two
//! reports to check that a failed correction is retried.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::application::media_sync::{MediaPlayer, PlayerError};

/// One recorded player call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Load(String),
    Unload,
    Play,
    Pause,
    Seek(f64),
    SetRate(f64),
}

#[derive(Debug, Default)]
pub struct MockMediaPlayer {
    pub calls: Mutex<Vec<PlayerCall>>,
    /// `None` makes `current_time` fail with `NotLoaded`.
    pub position: Mutex<Option<f64>>,
    pub should_fail: AtomicBool,
}

impl MockMediaPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A player with media loaded at `position` seconds.
    pub fn at(position: f64) -> Self {
        Self {
            position: Mutex::new(Some(position)),
            ..Self::default()
        }
    }

    pub fn set_position(&self, position: f64) {
        *self.position.lock().expect("lock poisoned") = Some(position);
    }

    /// Snapshot of the recorded calls.
    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    fn record(&self, call: PlayerCall, operation: &'static str) -> Result<(), PlayerError> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(PlayerError::Rejected {
                operation,
                reason: "simulated failure".to_string(),
            });
        }
        self.calls.lock().expect("lock poisoned").push(call);
        Ok(())
    }
}

impl MediaPlayer for MockMediaPlayer {
    fn load(&self, url: &str) -> Result<(), PlayerError> {
        self.record(PlayerCall::Load(url.to_string()), "load")
    }

    fn unload(&self) {
        self.calls.lock().expect("lock poisoned").push(PlayerCall::Unload);
    }

    fn play(&self) -> Result<(), PlayerError> {
        self.record(PlayerCall::Play, "play")
    }

    fn pause(&self) -> Result<(), PlayerError> {
        self.record(PlayerCall::Pause, "pause")
    }

    fn current_time(&self) -> Result<f64, PlayerError> {
        self.position
            .lock()
            .expect("lock poisoned")
            .ok_or(PlayerError::NotLoaded)
    }

    fn seek(&self, to: f64) -> Result<(), PlayerError> {
        self.record(PlayerCall::Seek(to), "seek")
    }

    fn set_rate(&self, rate: f64) -> Result<(), PlayerError> {
        self.record(PlayerCall::SetRate(rate), "set_rate")
    }
}
