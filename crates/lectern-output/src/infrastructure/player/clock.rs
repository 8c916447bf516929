//! Headless player driven by a monotonic clock.
//!
//! Used when the output surface runs without a video renderer attached (for
//! example on a CI machine or when only text and timer views are shown).  It
//! tracks position and rate exactly like a real player would, so the drift
//! engine behaves the same, and logs every transport change.

use std::sync::{Mutex, MutexGuard};
use std::time::Instant;

use lectern_core::drift::NORMAL_RATE;
use tracing::info;

use crate::application::media_sync::{MediaPlayer, PlayerError};

#[derive(Debug)]
struct ClockState {
    url: Option<String>,
    /// Position at `anchor`, in seconds.
    base: f64,
    /// Set while playing.
    anchor: Option<Instant>,
    rate: f64,
}

impl ClockState {
    fn position(&self, now: Instant) -> f64 {
        match self.anchor {
            Some(at) => self.base + now.saturating_duration_since(at).as_secs_f64() * self.rate,
            None => self.base,
        }
    }

    /// Folds elapsed play time into `base`.
    fn rebase(&mut self, now: Instant) {
        self.base = self.position(now);
        if self.anchor.is_some() {
            self.anchor = Some(now);
        }
    }
}

#[derive(Debug)]
pub struct ClockPlayer {
    state: Mutex<ClockState>,
}

impl Default for ClockPlayer {
    fn default() -> Self {
        Self {
            state: Mutex::new(ClockState {
                url: None,
                base: 0.0,
                anchor: None,
                rate: NORMAL_RATE,
            }),
        }
    }
}

impl ClockPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn loaded(&self) -> Result<MutexGuard<'_, ClockState>, PlayerError> {
        let guard = self.guard();
        if guard.url.is_none() {
            return Err(PlayerError::NotLoaded);
        }
        Ok(guard)
    }

    pub fn rate(&self) -> f64 {
        self.guard().rate
    }

    pub fn is_playing(&self) -> bool {
        self.guard().anchor.is_some()
    }
}

impl MediaPlayer for ClockPlayer {
    fn load(&self, url: &str) -> Result<(), PlayerError> {
        let mut state = self.guard();
        *state = ClockState {
            url: Some(url.to_string()),
            base: 0.0,
            anchor: None,
            rate: NORMAL_RATE,
        };
        Ok(())
    }

    fn unload(&self) {
        let mut state = self.guard();
        if let Some(url) = state.url.take() {
            info!(url, "video unloaded");
        }
        state.anchor = None;
        state.base = 0.0;
        state.rate = NORMAL_RATE;
    }

    fn play(&self) -> Result<(), PlayerError> {
        let mut state = self.loaded()?;
        if state.anchor.is_none() {
            state.anchor = Some(Instant::now());
            info!(position = state.base, "playing");
        }
        Ok(())
    }

    fn pause(&self) -> Result<(), PlayerError> {
        let mut state = self.loaded()?;
        let now = Instant::now();
        state.rebase(now);
        if state.anchor.take().is_some() {
            info!(position = state.base, "paused");
        }
        Ok(())
    }

    fn current_time(&self) -> Result<f64, PlayerError> {
        Ok(self.loaded()?.position(Instant::now()))
    }

    fn seek(&self, to: f64) -> Result<(), PlayerError> {
        if !to.is_finite() || to < 0.0 {
            return Err(PlayerError::Rejected {
                operation: "seek",
                reason: format!("invalid position {to}"),
            });
        }
        let mut state = self.loaded()?;
        state.base = to;
        if state.anchor.is_some() {
            state.anchor = Some(Instant::now());
        }
        Ok(())
    }

    fn set_rate(&self, rate: f64) -> Result<(), PlayerError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(PlayerError::Rejected {
                operation: "set_rate",
                reason: format!("invalid rate {rate}"),
            });
        }
        let mut state = self.loaded()?;
        state.rebase(Instant::now());
        state.rate = rate;
        Ok(())
    }
}
