//! # Session Engine
//! The one orchestration path a caller uses per analyzed recording: read the
//! student's current sensitivity multiplier, dispatch scoring, apply the
//! self-report correction with the session's deviation vector, optionally
//! blend an advisory suggestion, then feed the final score back into the
//! sensitivity window.
//!
//! Pure logic over injected stores — no I/O here beyond the store contract,
//! so the whole flow is unit-testable with an in-memory store.

use serde::Serialize;
use tracing::debug;

use crate::adapt::{AdaptiveStressState, AdaptiveTracker, SensitivityState, SensitivityTracker};
use crate::blend::blend_with_suggestion;
use crate::features::{FeatureMap, MeasurementVector};
use crate::profiles::ProfileKind;
use crate::result::StressResult;
use crate::scoring::{self, baseline::deviation_map};
use crate::store::SharedStore;

/// Everything one analyzed session produced, for the UI and for tests.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    /// The deterministic scoring result (explanation, level, stress type).
    pub result: StressResult,
    /// Deterministic score before any correction.
    pub base_score: f64,
    /// After the self-report linear correction.
    pub adjusted_score: f64,
    /// After advisory blending; this is what the UI displays and what feeds
    /// the sensitivity window.
    pub final_score: f64,
    /// Multiplier that was in effect for this session.
    pub multiplier: f64,
    pub used_baseline: bool,
}

#[derive(Clone)]
pub struct SessionEngine {
    sensitivity: SensitivityTracker,
    adaptive: AdaptiveTracker,
}

impl SessionEngine {
    pub fn new(store: SharedStore) -> Self {
        Self {
            sensitivity: SensitivityTracker::new(store.clone()),
            adaptive: AdaptiveTracker::new(store),
        }
    }

    /// The multiplier the next analysis for `user_id` would run with.
    pub fn current_multiplier(&self, user_id: &str) -> f64 {
        self.sensitivity.current_multiplier(user_id)
    }

    /// Preview the deterministic result without touching any state. Used to
    /// build the advisory prompt before committing the session.
    pub fn preview(
        &self,
        values: &MeasurementVector,
        profile: ProfileKind,
        baseline: Option<&MeasurementVector>,
        user_id: &str,
    ) -> StressResult {
        let multiplier = self.sensitivity.current_multiplier(user_id);
        scoring::calculate_stress_level(values, profile, baseline, multiplier)
    }

    /// Run one full session: score, correct, blend, and record.
    pub fn analyze(
        &self,
        values: &MeasurementVector,
        profile: ProfileKind,
        baseline: Option<&MeasurementVector>,
        suggested_score: Option<f64>,
        user_id: &str,
    ) -> SessionOutcome {
        let multiplier = self.sensitivity.current_multiplier(user_id);
        let result = scoring::calculate_stress_level(values, profile, baseline, multiplier);
        let used_baseline = baseline.is_some_and(|b| b.is_usable_baseline());

        let deltas = match baseline {
            Some(b) if used_baseline => deviation_map(values, b),
            _ => FeatureMap::default(),
        };

        let (adjusted_score, _) = self.adaptive.apply_adjustment(result.score, &deltas, user_id);
        let final_score = blend_with_suggestion(adjusted_score, suggested_score);
        self.sensitivity.update_from_session(final_score, user_id);

        debug!(
            user_id,
            base = result.score,
            adjusted = adjusted_score,
            blended = final_score,
            multiplier,
            used_baseline,
            "session analyzed"
        );

        SessionOutcome {
            base_score: result.score,
            adjusted_score,
            final_score,
            multiplier,
            used_baseline,
            result,
        }
    }

    /// Record a subjective 1–5 rating for the most recent session.
    pub fn self_report(&self, rating: u8, user_id: &str) -> AdaptiveStressState {
        self.adaptive.record_self_report(rating, user_id)
    }

    /// Called when the student recaptures their calm baseline.
    pub fn reset_calibration(&self, user_id: &str) {
        self.sensitivity.reset(user_id);
    }

    pub fn sensitivity_state(&self, user_id: &str) -> SensitivityState {
        self.sensitivity.state(user_id)
    }

    pub fn adaptive_state(&self, user_id: &str) -> AdaptiveStressState {
        self.adaptive.state(user_id)
    }
}
