//! MediaSyncEngine: keeps local video playback aligned with the control
//! surface's clock.
//!
//! This use case sits at the application layer and drives a [`MediaPlayer`]
//! trait object.  The player implementations live in the infrastructure
//! layer.
//!
//! # How drift correction works (for beginners)
//!
//! The control surface sends its playback position every 500 ms in a
//! `MEDIA_CONTROL` message with action `sync`.  Each report is compared with
//! the local player's position:
//!
//! ```text
//! drift = reported - local
//!
//! |drift| > 1.0 s          → seek to the reported time
//! 0.1 s < |drift| <= 1.0 s → play at 1.05× (behind) or 0.95× (ahead)
//! |drift| <= 0.1 s         → nothing; restore 1.0× if we were nudging
//! ```
//!
//! The thresholds come from [`DriftPolicy`].
//!
//! # Failures
//!
//! A player call that fails is logged and otherwise ignored.  The next report
//! re-evaluates drift from scratch, so the correction is retried.  The engine
//! only records that it is nudging after `set_rate` succeeded.

use std::sync::Arc;

use lectern_core::drift::{DriftCorrection, DriftPolicy, NORMAL_RATE};
use lectern_core::protocol::messages::{PlaybackAction, PlaybackControl};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error type for player operations.
#[derive(Debug, Error, PartialEq)]
pub enum PlayerError {
    /// No media is loaded.
    #[error("no media loaded")]
    NotLoaded,
    /// The player refused the operation.
    #[error("player rejected {operation}: {reason}")]
    Rejected {
        operation: &'static str,
        reason: String,
    },
}

/// Video player port.
///
/// Each output renderer provides an implementation in the infrastructure
/// layer.
pub trait MediaPlayer: Send + Sync {
    /// Loads the media at `url`, paused at position 0.
    fn load(&self, url: &str) -> Result<(), PlayerError>;

    /// Drops the loaded media.
    fn unload(&self);

    fn play(&self) -> Result<(), PlayerError>;

    fn pause(&self) -> Result<(), PlayerError>;

    /// Current local playback position in seconds.
    fn current_time(&self) -> Result<f64, PlayerError>;

    /// Jumps to `to` seconds.
    fn seek(&self, to: f64) -> Result<(), PlayerError>;

    /// Sets the playback rate (1.0 is normal speed).
    fn set_rate(&self, rate: f64) -> Result<(), PlayerError>;
}

/// What the engine did with one `MEDIA_CONTROL` message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncOutcome {
    /// Drift is within the soft threshold.
    InSync,
    /// Playback rate changed to `rate`.
    Nudged { rate: f64 },
    /// Drift settled; rate set back to 1.0.
    RateRestored,
    /// Jumped to `to` seconds.
    Seeked { to: f64 },
    /// A play, pause or seek command was applied.
    Applied(PlaybackAction),
    /// A player call failed; retried on the next report.
    Failed,
}

/// The Media Sync use case.
pub struct MediaSyncEngine {
    player: Arc<dyn MediaPlayer>,
    policy: DriftPolicy,
    nudging: bool,
}

impl MediaSyncEngine {
    /// Creates an engine with the given player and thresholds.
    pub fn new(player: Arc<dyn MediaPlayer>, policy: DriftPolicy) -> Self {
        Self {
            player,
            policy,
            nudging: false,
        }
    }

    pub fn policy(&self) -> &DriftPolicy {
        &self.policy
    }

    /// Whether a rate nudge is currently in effect.
    pub fn is_nudging(&self) -> bool {
        self.nudging
    }

    /// Loads a new video.  Any nudge from the previous one is forgotten.
    pub fn load(&mut self, url: &str) -> Result<(), PlayerError> {
        self.nudging = false;
        self.player.load(url)?;
        info!(url, "video loaded");
        Ok(())
    }

    /// Unloads the current video.
    pub fn unload(&mut self) {
        self.nudging = false;
        self.player.unload();
    }

    /// Applies one `MEDIA_CONTROL` message.
    pub fn handle_control(&mut self, control: &PlaybackControl) -> SyncOutcome {
        let reported = control.current_time;
        match control.action {
            PlaybackAction::Sync => self.correct(reported),
            PlaybackAction::Play => self.transport(PlaybackAction::Play, reported),
            PlaybackAction::Pause => self.transport(PlaybackAction::Pause, reported),
            PlaybackAction::Seek => match self.seek(reported) {
                Ok(()) => SyncOutcome::Applied(PlaybackAction::Seek),
                Err(_) => SyncOutcome::Failed,
            },
        }
    }

    /// Periodic report: pick a correction from the drift.
    fn correct(&mut self, reported: f64) -> SyncOutcome {
        let Some(local) = self.local_time() else {
            return SyncOutcome::Failed;
        };

        match self.policy.evaluate(reported, local) {
            DriftCorrection::Seek { to } => match self.seek(to) {
                Ok(()) => SyncOutcome::Seeked { to },
                Err(_) => SyncOutcome::Failed,
            },
            DriftCorrection::Nudge { rate } => match self.player.set_rate(rate) {
                Ok(()) => {
                    debug!(drift = reported - local, rate, "nudging playback rate");
                    self.nudging = true;
                    SyncOutcome::Nudged { rate }
                }
                Err(e) => {
                    warn!("rate nudge failed: {e}");
                    SyncOutcome::Failed
                }
            },
            DriftCorrection::None if self.nudging => match self.player.set_rate(NORMAL_RATE) {
                Ok(()) => {
                    debug!("drift settled; rate restored");
                    self.nudging = false;
                    SyncOutcome::RateRestored
                }
                Err(e) => {
                    warn!("rate restore failed: {e}");
                    SyncOutcome::Failed
                }
            },
            DriftCorrection::None => SyncOutcome::InSync,
        }
    }

    /// Play or pause, then fix a large drift in the same step.
    fn transport(&mut self, action: PlaybackAction, reported: f64) -> SyncOutcome {
        let result = match action {
            PlaybackAction::Play => self.player.play(),
            _ => self.player.pause(),
        };
        if let Err(e) = result {
            warn!("{action:?} failed: {e}");
            return SyncOutcome::Failed;
        }

        let Some(local) = self.local_time() else {
            return SyncOutcome::Failed;
        };
        if let DriftCorrection::Seek { to } = self.policy.evaluate(reported, local) {
            if self.seek(to).is_err() {
                return SyncOutcome::Failed;
            }
        }
        SyncOutcome::Applied(action)
    }

    /// Seeks and drops any nudge, since the position is now exact.
    fn seek(&mut self, to: f64) -> Result<(), PlayerError> {
        if let Err(e) = self.player.seek(to) {
            warn!("seek to {to:.3}s failed: {e}");
            return Err(e);
        }
        debug!(to, "seeked");
        if self.nudging {
            match self.player.set_rate(NORMAL_RATE) {
                Ok(()) => self.nudging = false,
                Err(e) => warn!("rate restore after seek failed: {e}"),
            }
        }
        Ok(())
    }

    fn local_time(&self) -> Option<f64> {
        match self.player.current_time() {
            Ok(t) => Some(t),
            Err(e) => {
                warn!("cannot read local playback position: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::player::mock::{MockMediaPlayer, PlayerCall};
    use std::sync::atomic::Ordering;

    fn control(action: PlaybackAction, current_time: f64) -> PlaybackControl {
        PlaybackControl {
            action,
            current_time,
        }
    }

    fn engine_at(local: f64) -> (MediaSyncEngine, Arc<MockMediaPlayer>) {
        let player = Arc::new(MockMediaPlayer::at(local));
        let engine = MediaSyncEngine::new(Arc::clone(&player) as _, DriftPolicy::default());
        (engine, player)
    }

    // ── Sync reports ──────────────────────────────────────────────────────────

    #[test]
    fn test_drift_over_hard_threshold_seeks_to_reported_time() {
        // Arrange
        let (mut engine, player) = engine_at(8.8);

        // Act
        let outcome = engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        // Assert
        assert_eq!(outcome, SyncOutcome::Seeked { to: 10.0 });
        assert_eq!(player.calls(), vec![PlayerCall::Seek(10.0)]);
    }

    #[test]
    fn test_moderate_drift_nudges_rate_without_seeking() {
        let (mut engine, player) = engine_at(9.7);

        let outcome = engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        assert_eq!(outcome, SyncOutcome::Nudged { rate: 1.05 });
        assert_eq!(player.calls(), vec![PlayerCall::SetRate(1.05)]);
        assert!(engine.is_nudging());
    }

    #[test]
    fn test_output_ahead_slows_down() {
        let (mut engine, _player) = engine_at(10.4);

        let outcome = engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        assert_eq!(outcome, SyncOutcome::Nudged { rate: 0.95 });
    }

    #[test]
    fn test_small_drift_takes_no_action() {
        let (mut engine, player) = engine_at(9.95);

        let outcome = engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        assert_eq!(outcome, SyncOutcome::InSync);
        assert!(player.calls().is_empty());
    }

    #[test]
    fn test_rate_restored_once_drift_settles() {
        // Arrange: nudge first.
        let (mut engine, player) = engine_at(9.7);
        engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        // Act: local clock caught up.
        player.set_position(10.48);
        let outcome = engine.handle_control(&control(PlaybackAction::Sync, 10.5));

        // Assert
        assert_eq!(outcome, SyncOutcome::RateRestored);
        assert!(!engine.is_nudging());
        assert_eq!(player.calls().last(), Some(&PlayerCall::SetRate(1.0)));
    }

    #[test]
    fn test_hard_seek_while_nudging_restores_rate() {
        let (mut engine, player) = engine_at(9.7);
        engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        player.set_position(3.0);
        engine.handle_control(&control(PlaybackAction::Sync, 10.5));

        assert!(!engine.is_nudging());
        assert_eq!(
            player.calls(),
            vec![
                PlayerCall::SetRate(1.05),
                PlayerCall::Seek(10.5),
                PlayerCall::SetRate(1.0)
            ]
        );
    }

    // ── Failures ──────────────────────────────────────────────────────────────

    #[test]
    fn test_failed_nudge_is_not_recorded_and_retried_next_report() {
        // Arrange
        let (mut engine, player) = engine_at(9.7);
        player.should_fail.store(true, Ordering::SeqCst);

        // Act
        let first = engine.handle_control(&control(PlaybackAction::Sync, 10.0));
        player.should_fail.store(false, Ordering::SeqCst);
        let second = engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        // Assert
        assert_eq!(first, SyncOutcome::Failed);
        assert_eq!(second, SyncOutcome::Nudged { rate: 1.05 });
        assert!(engine.is_nudging());
    }

    #[test]
    fn test_unreadable_position_fails_without_player_calls() {
        let player = Arc::new(MockMediaPlayer::new());
        let mut engine = MediaSyncEngine::new(Arc::clone(&player) as _, DriftPolicy::default());

        let outcome = engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        assert_eq!(outcome, SyncOutcome::Failed);
        assert!(player.calls().is_empty());
    }

    #[test]
    fn test_rejected_seek_reports_player_error() {
        // Arrange
        let (mut engine, player) = engine_at(1.0);
        player.should_fail.store(true, Ordering::SeqCst);

        // Act
        let direct = engine.seek(20.0);
        let outcome = engine.handle_control(&control(PlaybackAction::Seek, 20.0));

        // Assert
        assert_eq!(
            direct,
            Err(PlayerError::Rejected {
                operation: "seek",
                reason: "simulated failure".to_string(),
            })
        );
        assert_eq!(outcome, SyncOutcome::Failed);
        assert!(player.calls().is_empty());
    }

    // ── Transport actions ─────────────────────────────────────────────────────

    #[test]
    fn test_play_within_threshold_does_not_seek() {
        let (mut engine, player) = engine_at(4.5);

        let outcome = engine.handle_control(&control(PlaybackAction::Play, 5.0));

        assert_eq!(outcome, SyncOutcome::Applied(PlaybackAction::Play));
        assert_eq!(player.calls(), vec![PlayerCall::Play]);
    }

    #[test]
    fn test_pause_far_from_reported_time_also_seeks() {
        let (mut engine, player) = engine_at(0.0);

        let outcome = engine.handle_control(&control(PlaybackAction::Pause, 42.0));

        assert_eq!(outcome, SyncOutcome::Applied(PlaybackAction::Pause));
        assert_eq!(player.calls(), vec![PlayerCall::Pause, PlayerCall::Seek(42.0)]);
    }

    #[test]
    fn test_seek_always_seeks() {
        let (mut engine, player) = engine_at(12.0);

        let outcome = engine.handle_control(&control(PlaybackAction::Seek, 12.05));

        assert_eq!(outcome, SyncOutcome::Applied(PlaybackAction::Seek));
        assert_eq!(player.calls(), vec![PlayerCall::Seek(12.05)]);
    }

    #[test]
    fn test_load_clears_nudge_state() {
        let (mut engine, player) = engine_at(9.7);
        engine.handle_control(&control(PlaybackAction::Sync, 10.0));

        engine.load("http://127.0.0.1:24901/media/next.mp4").expect("load");

        assert!(!engine.is_nudging());
        assert_eq!(
            player.calls().last(),
            Some(&PlayerCall::Load("http://127.0.0.1:24901/media/next.mp4".to_string()))
        );
    }
}
