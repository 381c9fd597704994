//! # Self-Report Adaptation
//! Per-student linear correction on top of the deterministic score: one
//! weight per deviation feature plus a bias. Every scored session records a
//! snapshot; if the student later submits a subjective 1–5 rating, one
//! stochastic-gradient step nudges the weights toward their own perception.
//!
//! Already-computed scores are never revised retroactively — only future
//! sessions feel the correction.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::features::{FeatureMap, VoiceFeature};
use crate::scoring::curves::clamp_score;
use crate::store::{load_state, save_state, SharedStore};

const LEARNING_RATE: f64 = 0.02;
const WEIGHT_CLAMP: f64 = 5.0;
const BIAS_CLAMP: f64 = 15.0;
const KEY_PREFIX: &str = "adaptive:v1:";

/// What the last `apply_adjustment` call saw and produced. Needed to compute
/// the error term when a self-report arrives later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub ts_unix: u64,
    pub deltas: FeatureMap,
    pub adjusted_score: f64,
    pub base_score: f64,
}

/// Persisted per-student record. Fresh users start with zero weights and
/// bias, so the adjustment is the identity until feedback arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdaptiveStressState {
    /// Invariant: each weight in [-5, 5].
    pub weights: FeatureMap,
    /// Invariant: in [-15, 15].
    pub bias: f64,
    pub sessions: u32,
    pub last_session: Option<SessionSnapshot>,
    /// Most recent self-report, already mapped onto the 0–100 scale.
    pub last_label: Option<f64>,
}

impl AdaptiveStressState {
    fn sanitized(mut self) -> Self {
        for f in VoiceFeature::ALL {
            let w = self.weights.get_mut(f);
            if !w.is_finite() {
                *w = 0.0;
            }
            *w = w.clamp(-WEIGHT_CLAMP, WEIGHT_CLAMP);
        }
        if !self.bias.is_finite() {
            self.bias = 0.0;
        }
        self.bias = self.bias.clamp(-BIAS_CLAMP, BIAS_CLAMP);
        self
    }
}

#[derive(Clone)]
pub struct AdaptiveTracker {
    store: SharedStore,
}

impl AdaptiveTracker {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    fn key(user_id: &str) -> String {
        format!("{KEY_PREFIX}{user_id}")
    }

    pub fn state(&self, user_id: &str) -> AdaptiveStressState {
        load_state::<AdaptiveStressState>(self.store.as_ref(), &Self::key(user_id)).sanitized()
    }

    /// Apply the learned correction to a freshly scored session. Called once
    /// per analysis, always, whether or not a self-report will ever arrive.
    /// `deltas` is the session's deviation vector (zeros when the session was
    /// population-scored).
    pub fn apply_adjustment(
        &self,
        base_score: f64,
        deltas: &FeatureMap,
        user_id: &str,
    ) -> (f64, AdaptiveStressState) {
        let mut st = self.state(user_id);

        let contribution = st.bias + st.weights.dot(deltas);
        let adjusted = clamp_score(base_score + contribution);

        st.last_session = Some(SessionSnapshot {
            ts_unix: now_unix(),
            deltas: *deltas,
            adjusted_score: adjusted,
            base_score,
        });
        st.sessions = st.sessions.saturating_add(1);
        save_state(self.store.as_ref(), &Self::key(user_id), &st);
        (adjusted, st)
    }

    /// Fold a subjective 1–5 rating into the weights. The slider maps onto
    /// 20–100; without a prior session there is nothing to correct against,
    /// so the state is returned unchanged.
    pub fn record_self_report(&self, label: u8, user_id: &str) -> AdaptiveStressState {
        let mut st = self.state(user_id);
        let Some(last) = st.last_session.clone() else {
            return st;
        };

        let label = label.clamp(1, 5);
        let target = 20.0 + ((label - 1) as f64 / 4.0) * 80.0;
        let error = target - last.adjusted_score;

        for f in VoiceFeature::ALL {
            let w = st.weights.get_mut(f);
            *w = (*w + LEARNING_RATE * error * last.deltas.get(f))
                .clamp(-WEIGHT_CLAMP, WEIGHT_CLAMP);
        }
        st.bias = (st.bias + LEARNING_RATE * error * 0.5).clamp(-BIAS_CLAMP, BIAS_CLAMP);
        st.last_label = Some(target);

        save_state(self.store.as_ref(), &Self::key(user_id), &st);
        tracing::debug!(user_id, target, error, "self-report recorded");
        st
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

    fn tracker() -> AdaptiveTracker {
        AdaptiveTracker::new(MemoryStore::shared())
    }

    fn deltas(jitter: f64, pitch_mean: f64) -> FeatureMap {
        let mut d = FeatureMap::default();
        d.jitter = jitter;
        d.pitch_mean = pitch_mean;
        d
    }

    #[test]
    fn fresh_user_adjustment_is_identity() {
        let t = tracker();
        let (adjusted, st) = t.apply_adjustment(42.0, &deltas(0.8, 0.3), "s1");
        assert_eq!(adjusted, 42.0);
        assert_eq!(st.sessions, 1);
        assert!(st.last_session.is_some());
    }

    #[test]
    fn self_report_before_any_session_is_a_noop() {
        let t = tracker();
        let before = t.state("s1");
        let after = t.record_self_report(5, "s1");
        assert_eq!(before, after);
    }

    #[test]
    fn underestimated_stress_pushes_positive_weights_up() {
        let t = tracker();
        let d = deltas(0.8, 0.3);
        let (adjusted, _) = t.apply_adjustment(30.0, &d, "s1");
        // Student says 5 → target 100 > adjusted: error positive.
        let st = t.record_self_report(5, "s1");
        assert!(adjusted < 100.0);
        assert!(st.weights.jitter > 0.0);
        assert!(st.weights.pitch_mean > 0.0);
        // Features with zero deviation stay untouched.
        assert_eq!(st.weights.speech_rate, 0.0);
        assert!(st.bias > 0.0);
    }

    #[test]
    fn overestimated_stress_pushes_weights_down() {
        let t = tracker();
        let (_, _) = t.apply_adjustment(80.0, &deltas(0.8, 0.0), "s1");
        // Student says 1 → target 20 < adjusted: error negative.
        let st = t.record_self_report(1, "s1");
        assert!(st.weights.jitter < 0.0);
        assert!(st.bias < 0.0);
    }

    #[test]
    fn slider_endpoints_map_to_20_and_100() {
        let t = tracker();
        t.apply_adjustment(50.0, &FeatureMap::default(), "s1");
        let st = t.record_self_report(1, "s1");
        assert_eq!(st.last_label, Some(20.0));
        t.apply_adjustment(50.0, &FeatureMap::default(), "s1");
        let st = t.record_self_report(5, "s1");
        assert_eq!(st.last_label, Some(100.0));
    }

    #[test]
    fn weights_and_bias_respect_clamps_under_repeated_feedback() {
        let t = tracker();
        let d = deltas(50.0, 50.0); // absurdly large deltas to force saturation
        for _ in 0..100 {
            t.apply_adjustment(0.0, &d, "s1");
            let st = t.record_self_report(5, "s1");
            assert!(st.weights.jitter <= WEIGHT_CLAMP);
            assert!(st.bias <= BIAS_CLAMP);
        }
        let st = t.state("s1");
        assert_eq!(st.weights.jitter, WEIGHT_CLAMP);
    }

    #[test]
    fn learned_weights_shift_future_adjustments() {
        let t = tracker();
        let d = deltas(1.0, 0.5);
        t.apply_adjustment(30.0, &d, "s1");
        t.record_self_report(5, "s1");
        let (adjusted, _) = t.apply_adjustment(30.0, &d, "s1");
        assert!(adjusted > 30.0);
    }

    #[test]
    fn adjusted_score_stays_bounded() {
        let t = tracker();
        let d = deltas(100.0, 100.0);
        for _ in 0..20 {
            t.apply_adjustment(95.0, &d, "s1");
            t.record_self_report(5, "s1");
        }
        let (adjusted, _) = t.apply_adjustment(95.0, &d, "s1");
        assert!(adjusted <= 100.0);
    }

    #[test]
    fn corrupt_weights_are_coerced_on_load() {
        let store = MemoryStore::shared();
        store.set(
            "adaptive:v1:s1",
            r#"{"weights":{"jitter":99.0},"bias":-40.0,"sessions":1}"#.to_string(),
        );
        let t = AdaptiveTracker::new(store);
        let st = t.state("s1");
        assert_eq!(st.weights.jitter, WEIGHT_CLAMP);
        assert_eq!(st.bias, -BIAS_CLAMP);
    }
}
