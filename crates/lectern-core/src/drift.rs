//! Playback drift policy.
//!
//! The control surface's clock is authoritative.  The output surface measures
//! `drift = reported - local` on every position report and picks one of
//! three corrections:
//!
//! ```text
//! |drift| <= rate_threshold                   → none
//! rate_threshold < |drift| <= max_drift       → nudge playback rate
//! |drift| > max_drift                         → hard seek to reported time
//! ```
//!
//! A nudge speeds up playback when the output is behind (`drift > 0`) and
//! slows it down when ahead.  Once drift is back under `rate_threshold` the
//! engine restores rate 1.0.

use serde::{Deserialize, Serialize};

/// Above this many seconds of drift, seek instead of nudging.
pub const MAX_DRIFT_THRESHOLD: f64 = 1.0;
/// At or below this many seconds of drift, do nothing.
pub const DRIFT_RATE_THRESHOLD: f64 = 0.1;
/// Relative rate change applied while nudging (0.05 → 1.05× / 0.95×).
pub const RATE_NUDGE: f64 = 0.05;
/// Normal playback rate.
pub const NORMAL_RATE: f64 = 1.0;

/// Tunable thresholds for drift correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftPolicy {
    #[serde(default = "default_max_drift")]
    pub max_drift_secs: f64,
    #[serde(default = "default_rate_threshold")]
    pub rate_threshold_secs: f64,
    #[serde(default = "default_rate_nudge")]
    pub rate_nudge: f64,
}

fn default_max_drift() -> f64 {
    MAX_DRIFT_THRESHOLD
}

fn default_rate_threshold() -> f64 {
    DRIFT_RATE_THRESHOLD
}

fn default_rate_nudge() -> f64 {
    RATE_NUDGE
}

impl Default for DriftPolicy {
    fn default() -> Self {
        Self {
            max_drift_secs: MAX_DRIFT_THRESHOLD,
            rate_threshold_secs: DRIFT_RATE_THRESHOLD,
            rate_nudge: RATE_NUDGE,
        }
    }
}

/// What the output surface should do about the current drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriftCorrection {
    None,
    /// Play at `rate` until drift settles.
    Nudge { rate: f64 },
    /// Jump to `to` seconds.
    Seek { to: f64 },
}

impl DriftPolicy {
    /// Returns `true` if the thresholds are ordered and the nudge is in (0, 1).
    pub fn is_valid(&self) -> bool {
        self.rate_threshold_secs >= 0.0
            && self.max_drift_secs > self.rate_threshold_secs
            && self.rate_nudge > 0.0
            && self.rate_nudge < 1.0
    }

    /// Chooses a correction for a position report.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lectern_core::drift::{DriftCorrection, DriftPolicy};
    ///
    /// let policy = DriftPolicy::default();
    /// assert_eq!(policy.evaluate(10.0, 8.8), DriftCorrection::Seek { to: 10.0 });
    /// assert!(matches!(policy.evaluate(10.0, 9.7), DriftCorrection::Nudge { .. }));
    /// assert_eq!(policy.evaluate(10.0, 9.95), DriftCorrection::None);
    /// ```
    pub fn evaluate(&self, reported: f64, local: f64) -> DriftCorrection {
        let drift = reported - local;
        let magnitude = drift.abs();

        if magnitude > self.max_drift_secs {
            DriftCorrection::Seek { to: reported }
        } else if magnitude > self.rate_threshold_secs {
            let rate = if drift > 0.0 {
                NORMAL_RATE + self.rate_nudge
            } else {
                NORMAL_RATE - self.rate_nudge
            };
            DriftCorrection::Nudge { rate }
        } else {
            DriftCorrection::None
        }
    }

    /// Whether a drift is small enough to end a nudge.
    pub fn is_settled(&self, reported: f64, local: f64) -> bool {
        (reported - local).abs() <= self.rate_threshold_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_drift_over_hard_threshold_seeks() {
        assert_eq!(
            DriftPolicy::default().evaluate(10.0, 8.8),
            DriftCorrection::Seek { to: 10.0 }
        );
    }

    #[test]
    fn test_output_ahead_by_more_than_hard_threshold_seeks_back() {
        assert_eq!(
            DriftPolicy::default().evaluate(10.0, 11.5),
            DriftCorrection::Seek { to: 10.0 }
        );
    }

    #[test]
    fn test_behind_within_soft_band_speeds_up() {
        assert_eq!(
            DriftPolicy::default().evaluate(10.0, 9.7),
            DriftCorrection::Nudge { rate: 1.05 }
        );
    }

    #[test]
    fn test_ahead_within_soft_band_slows_down() {
        assert_eq!(
            DriftPolicy::default().evaluate(10.0, 10.3),
            DriftCorrection::Nudge { rate: 0.95 }
        );
    }

    #[test]
    fn test_small_drift_is_ignored() {
        assert_eq!(DriftPolicy::default().evaluate(10.0, 9.95), DriftCorrection::None);
    }

    #[test]
    fn test_exactly_on_hard_threshold_nudges() {
        // |drift| == max is inside the soft band (the comparison is strict).
        assert!(matches!(
            DriftPolicy::default().evaluate(5.0, 4.0),
            DriftCorrection::Nudge { .. }
        ));
    }

    #[test]
    fn test_policy_validation() {
        assert!(DriftPolicy::default().is_valid());
        assert!(!DriftPolicy {
            max_drift_secs: 0.05,
            ..DriftPolicy::default()
        }
        .is_valid());
        assert!(!DriftPolicy {
            rate_nudge: 1.5,
            ..DriftPolicy::default()
        }
        .is_valid());
    }

    #[test]
    fn test_partial_toml_style_config_uses_defaults() {
        let policy: DriftPolicy = serde_json::from_str(r#"{"max_drift_secs": 2.0}"#).unwrap();

        assert_eq!(policy.max_drift_secs, 2.0);
        assert_eq!(policy.rate_threshold_secs, DRIFT_RATE_THRESHOLD);
    }

    proptest! {
        #[test]
        fn prop_seek_only_beyond_hard_threshold(reported in 0.0f64..10_000.0, local in 0.0f64..10_000.0) {
            let policy = DriftPolicy::default();
            let seeks = matches!(policy.evaluate(reported, local), DriftCorrection::Seek { .. });
            prop_assert_eq!(seeks, (reported - local).abs() > policy.max_drift_secs);
        }

        #[test]
        fn prop_nudge_direction_reduces_drift(reported in 0.0f64..10_000.0, local in 0.0f64..10_000.0) {
            let policy = DriftPolicy::default();
            if let DriftCorrection::Nudge { rate } = policy.evaluate(reported, local) {
                // Behind → faster than normal; ahead → slower.
                prop_assert_eq!(rate > NORMAL_RATE, reported > local);
            }
        }
    }
}
