//! Timer domain store.
//!
//! The control surface owns the ticking clock; it pushes a full
//! `TIMER_SYNC_STATE` whenever the timer starts, stops, is reset, or is
//! reconfigured, and the output surface renders whatever it last received.

use crate::domain::DomainStore;
use crate::protocol::messages::{
    Domain, SyncMessage, TimerCaption, TimerMessage, TimerMode, TimerState,
};

/// Synchronized timer state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimerStateSnapshot {
    pub mode: TimerMode,
    pub duration_seconds: u64,
    /// Seconds left for a countdown, seconds elapsed for a stopwatch.
    pub remaining_seconds: u64,
    pub is_running: bool,
    /// Caption shown under the clock; empty when none.
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct TimerStore {
    state: TimerStateSnapshot,
}

impl TimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TimerStateSnapshot {
        &self.state
    }
}

impl DomainStore for TimerStore {
    type Message = TimerMessage;
    const DOMAIN: Domain = Domain::Timer;

    fn select(message: &SyncMessage) -> Option<&TimerMessage> {
        match message {
            SyncMessage::Timer(m) => Some(m),
            _ => None,
        }
    }

    fn apply(&mut self, message: &TimerMessage) -> bool {
        match message {
            TimerMessage::SyncState(t) => {
                // A countdown can never have more left than it started with.
                let remaining = match t.mode {
                    TimerMode::Countdown => t.remaining_seconds.min(t.duration_seconds),
                    TimerMode::Stopwatch | TimerMode::Clock => t.remaining_seconds,
                };
                self.state.mode = t.mode;
                self.state.duration_seconds = t.duration_seconds;
                self.state.remaining_seconds = remaining;
                self.state.is_running = t.is_running;
                true
            }
            TimerMessage::UpdateMessage(c) => {
                self.state.message = c.message.clone();
                true
            }
        }
    }

    fn snapshot(&self) -> Vec<SyncMessage> {
        let mut out = vec![SyncMessage::Timer(TimerMessage::SyncState(TimerState {
            mode: self.state.mode,
            duration_seconds: self.state.duration_seconds,
            remaining_seconds: self.state.remaining_seconds,
            is_running: self.state.is_running,
        }))];
        if !self.state.message.is_empty() {
            out.push(SyncMessage::Timer(TimerMessage::UpdateMessage(TimerCaption {
                message: self.state.message.clone(),
            })));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(mode: TimerMode, duration: u64, remaining: u64, running: bool) -> TimerMessage {
        TimerMessage::SyncState(TimerState {
            mode,
            duration_seconds: duration,
            remaining_seconds: remaining,
            is_running: running,
        })
    }

    #[test]
    fn test_sync_state_replaces_clock_but_keeps_caption() {
        // Arrange
        let mut store = TimerStore::new();
        store.apply(&TimerMessage::UpdateMessage(TimerCaption {
            message: "Service starts soon".into(),
        }));

        // Act
        store.apply(&state(TimerMode::Countdown, 300, 120, true));

        // Assert
        let s = store.state();
        assert_eq!(s.remaining_seconds, 120);
        assert!(s.is_running);
        assert_eq!(s.message, "Service starts soon");
    }

    #[test]
    fn test_countdown_remaining_is_capped_at_duration() {
        let mut store = TimerStore::new();

        store.apply(&state(TimerMode::Countdown, 60, 90, false));

        assert_eq!(store.state().remaining_seconds, 60);
    }

    #[test]
    fn test_stopwatch_may_exceed_duration() {
        let mut store = TimerStore::new();

        store.apply(&state(TimerMode::Stopwatch, 60, 90, true));

        assert_eq!(store.state().remaining_seconds, 90);
    }

    #[test]
    fn test_snapshot_skips_empty_caption() {
        let snapshot = TimerStore::new().snapshot();

        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_snapshot_rebuilds_equal_state() {
        let mut source = TimerStore::new();
        source.apply(&state(TimerMode::Countdown, 600, 42, true));
        source.apply(&TimerMessage::UpdateMessage(TimerCaption { message: "Break".into() }));

        let mut replica = TimerStore::new();
        for msg in source.snapshot() {
            replica.apply(TimerStore::select(&msg).expect("timer message"));
        }

        assert_eq!(replica.state(), source.state());
    }
}
