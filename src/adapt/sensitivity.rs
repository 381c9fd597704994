//! # Sensitivity Adaptation
//! A per-student multiplier in [1.0, 1.3] that scales baseline-mode scoring
//! once a sustained elevated-stress pattern shows up across recent sessions,
//! then decays back toward 1.0 when the pattern breaks — all without
//! requiring a recalibration.
//!
//! Hysteresis policy: the first five sessions after (re)calibration are
//! pinned to 1.0 so thin history can never amplify; after that a rolling
//! five-score window drives pattern detection and decay.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::store::{load_state, save_state, SharedStore};

pub const MIN_MULTIPLIER: f64 = 1.0;
pub const MAX_MULTIPLIER: f64 = 1.3;

const WINDOW_LEN: usize = 5;
const CONSERVATIVE_SESSIONS: u32 = 5;
const KEY_PREFIX: &str = "sensitivity:v1:";

/// Persisted per-student record. Unknown or missing fields deserialize to
/// defaults; out-of-invariant values are coerced on load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SensitivityState {
    /// Invariant: always in [1.0, 1.3].
    pub base_sensitivity: f64,
    /// Most-recent-last, at most five entries.
    pub recent_stress_scores: Vec<f64>,
    /// Monotonic; only an explicit reset zeroes it.
    pub sessions_since_calibration: u32,
    pub last_updated: u64,
}

impl Default for SensitivityState {
    fn default() -> Self {
        Self {
            base_sensitivity: MIN_MULTIPLIER,
            recent_stress_scores: Vec::new(),
            sessions_since_calibration: 0,
            last_updated: 0,
        }
    }
}

impl SensitivityState {
    /// Coerce a loaded record back into its invariants. Persisted data may
    /// predate a schema change or have been edited by hand.
    fn sanitized(mut self) -> Self {
        if !self.base_sensitivity.is_finite() {
            self.base_sensitivity = MIN_MULTIPLIER;
        }
        self.base_sensitivity = self.base_sensitivity.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER);
        self.recent_stress_scores.retain(|s| s.is_finite());
        let excess = self.recent_stress_scores.len().saturating_sub(WINDOW_LEN);
        if excess > 0 {
            self.recent_stress_scores.drain(0..excess);
        }
        self
    }
}

/// Store-backed tracker; one instance serves all students.
#[derive(Clone)]
pub struct SensitivityTracker {
    store: SharedStore,
}

impl SensitivityTracker {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    fn key(user_id: &str) -> String {
        format!("{KEY_PREFIX}{user_id}")
    }

    pub fn state(&self, user_id: &str) -> SensitivityState {
        load_state::<SensitivityState>(self.store.as_ref(), &Self::key(user_id)).sanitized()
    }

    /// Read-only view of the current multiplier.
    pub fn current_multiplier(&self, user_id: &str) -> f64 {
        self.state(user_id).base_sensitivity
    }

    /// Fold one completed session's final score into the window and derive
    /// the new multiplier. Returns (and persists) the multiplier that future
    /// baseline scoring should use.
    pub fn update_from_session(&self, stress_score: f64, user_id: &str) -> f64 {
        let mut st = self.state(user_id);

        st.recent_stress_scores.push(stress_score);
        let excess = st.recent_stress_scores.len().saturating_sub(WINDOW_LEN);
        if excess > 0 {
            st.recent_stress_scores.drain(0..excess);
        }
        st.sessions_since_calibration = st.sessions_since_calibration.saturating_add(1);

        let next = if st.sessions_since_calibration <= CONSERVATIVE_SESSIONS {
            // Conservative window: no amplification on thin history.
            MIN_MULTIPLIER
        } else {
            let window = &st.recent_stress_scores;
            let avg = window.iter().sum::<f64>() / window.len() as f64;
            let high = window.iter().filter(|s| **s > 20.0).count();
            let very_high = window.iter().filter(|s| **s > 30.0).count();

            if avg < 20.0 && high < 2 {
                // Stress has subsided: step 5% back toward neutral.
                (st.base_sensitivity * 0.95).max(MIN_MULTIPLIER)
            } else {
                let pattern_strength = if avg > 35.0 && very_high >= 3 {
                    2.0
                } else if avg > 25.0 && high >= 3 {
                    1.0
                } else {
                    0.0
                };
                MIN_MULTIPLIER + pattern_strength * 0.15
            }
        };

        st.base_sensitivity = next.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER);
        st.last_updated = now_unix();
        save_state(self.store.as_ref(), &Self::key(user_id), &st);
        tracing::debug!(
            user_id,
            multiplier = st.base_sensitivity,
            sessions = st.sessions_since_calibration,
            "sensitivity updated"
        );
        st.base_sensitivity
    }

    /// Hard reset to defaults; called when the student recaptures their calm
    /// baseline.
    pub fn reset(&self, user_id: &str) {
        let mut st = SensitivityState::default();
        st.last_updated = now_unix();
        save_state(self.store.as_ref(), &Self::key(user_id), &st);
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KeyValueStore, MemoryStore};

    fn tracker() -> SensitivityTracker {
        SensitivityTracker::new(MemoryStore::shared())
    }

    /// Burn through the conservative window with the given score.
    fn warm_up(t: &SensitivityTracker, user: &str, score: f64) {
        for _ in 0..CONSERVATIVE_SESSIONS {
            t.update_from_session(score, user);
        }
    }

    #[test]
    fn conservative_window_pins_multiplier_to_one() {
        let t = tracker();
        for _ in 0..CONSERVATIVE_SESSIONS {
            assert_eq!(t.update_from_session(95.0, "s1"), 1.0);
        }
    }

    #[test]
    fn sustained_high_stress_raises_multiplier_to_cap() {
        let t = tracker();
        warm_up(&t, "s1", 50.0);
        let mut last = 1.0;
        for _ in 0..10 {
            last = t.update_from_session(50.0, "s1");
        }
        assert!((last - MAX_MULTIPLIER).abs() < 1e-9);
    }

    #[test]
    fn multiplier_never_exceeds_cap() {
        let t = tracker();
        for _ in 0..30 {
            let m = t.update_from_session(99.0, "s1");
            assert!(m <= MAX_MULTIPLIER);
        }
    }

    #[test]
    fn moderate_pattern_reaches_mid_step() {
        let t = tracker();
        warm_up(&t, "s1", 28.0);
        // avg 28 > 25 with all five entries > 20, but not > 30
        let m = t.update_from_session(28.0, "s1");
        assert!((m - 1.15).abs() < 1e-9);
    }

    #[test]
    fn calm_scores_decay_multiplier_monotonically_toward_one() {
        let t = tracker();
        warm_up(&t, "s1", 50.0);
        for _ in 0..5 {
            t.update_from_session(50.0, "s1");
        }
        let mut prev = t.current_multiplier("s1");
        assert!(prev > 1.0);
        for _ in 0..40 {
            let m = t.update_from_session(5.0, "s1");
            assert!(m <= prev);
            assert!(m >= MIN_MULTIPLIER);
            prev = m;
        }
        assert!((prev - MIN_MULTIPLIER).abs() < 0.01);
    }

    #[test]
    fn rolling_window_never_exceeds_five_entries() {
        let t = tracker();
        for i in 0..20 {
            t.update_from_session(i as f64, "s1");
            assert!(t.state("s1").recent_stress_scores.len() <= WINDOW_LEN);
        }
        // most-recent-last ordering
        let st = t.state("s1");
        assert_eq!(*st.recent_stress_scores.last().unwrap(), 19.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let t = tracker();
        warm_up(&t, "s1", 60.0);
        for _ in 0..5 {
            t.update_from_session(60.0, "s1");
        }
        t.reset("s1");
        assert_eq!(t.current_multiplier("s1"), 1.0);
        assert_eq!(t.state("s1").sessions_since_calibration, 0);
        assert!(t.state("s1").recent_stress_scores.is_empty());
    }

    #[test]
    fn users_are_isolated() {
        let t = tracker();
        warm_up(&t, "a", 50.0);
        for _ in 0..5 {
            t.update_from_session(50.0, "a");
        }
        assert!(t.current_multiplier("a") > 1.0);
        assert_eq!(t.current_multiplier("b"), 1.0);
    }

    #[test]
    fn corrupt_persisted_record_is_coerced_on_load() {
        let store = MemoryStore::shared();
        store.set(
            "sensitivity:v1:s1",
            r#"{"baseSensitivity":9.0,"recentStressScores":[1,2,3,4,5,6,7],"sessionsSinceCalibration":8,"lastUpdated":0}"#
                .to_string(),
        );
        let t = SensitivityTracker::new(store);
        let st = t.state("s1");
        assert_eq!(st.base_sensitivity, MAX_MULTIPLIER);
        assert_eq!(st.recent_stress_scores.len(), WINDOW_LEN);
    }
}
