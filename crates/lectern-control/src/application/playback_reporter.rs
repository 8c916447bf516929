//! Throttle for periodic playback position reports.
//!
//! While a video plays, the control surface's player fires time updates many
//! times per second.  Only one `sync` report per interval goes out; explicit
//! play/pause/seek actions are never throttled and restart the interval.

use std::time::{Duration, Instant};

use lectern_core::protocol::messages::PlaybackAction;

/// Default spacing between `sync` reports.
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_millis(500);

/// Decides whether a playback action should be sent now.
#[derive(Debug, Clone)]
pub struct PlaybackReporter {
    interval: Duration,
    last_sent: Option<Instant>,
}

impl Default for PlaybackReporter {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_INTERVAL)
    }
}

impl PlaybackReporter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns `true` if `action` observed at `now` should be sent.
    ///
    /// A `true` answer records `now` as the last send time.
    pub fn should_report(&mut self, action: PlaybackAction, now: Instant) -> bool {
        if action == PlaybackAction::Sync {
            if let Some(last) = self.last_sent {
                if now.saturating_duration_since(last) < self.interval {
                    return false;
                }
            }
        }
        self.last_sent = Some(now);
        true
    }

    /// Forgets the last send time (the next `sync` goes out immediately).
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}
