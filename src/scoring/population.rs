//! # Population Scorer
//! Scores a measurement vector against fixed demographic norm tables. This is
//! the path every first-session (no-baseline) recording takes.
//!
//! Policy note: the final score is hard-capped at 59, which keeps the High
//! band (≥67) unreachable without a personal baseline. That is intentional —
//! population norms are too blunt an instrument to flag a student as highly
//! stressed on first contact.

use crate::features::MeasurementVector;
use crate::profiles::{profile, ProfileKind};
use crate::result::{StressLevel, StressResult};
use crate::scoring::curves::{
    banded_sub_score, clamp_score, ease_transform, formant_sub_score, stability_sub_score,
    JITTER_THRESHOLDS, SHIMMER_THRESHOLDS,
};

/// Aggregation weights. Stability measures dominate; formants are weak
/// vowel-quality signals.
const W_JITTER: f64 = 2.5;
const W_SHIMMER: f64 = 2.5;
const W_PITCH_MEAN: f64 = 1.8;
const W_SPEECH_RATE: f64 = 1.6;
const W_PITCH_RANGE: f64 = 1.3;
const W_FORMANT: f64 = 0.4;
const W_INTERACTION: f64 = 1.2;

/// No-baseline users can never be classified High.
const POPULATION_CAP: f64 = 59.0;

const MEDIUM_FLOOR: f64 = 35.0;
const HIGH_FLOOR: f64 = 67.0;

/// Score against the demographic norms for `kind`. Never fails on finite
/// input; out-of-band values saturate in the curves.
pub fn score_population(values: &MeasurementVector, kind: ProfileKind) -> StressResult {
    let p = profile(kind);

    let jitter = stability_sub_score(values.jitter, &JITTER_THRESHOLDS);
    let shimmer = stability_sub_score(values.shimmer, &SHIMMER_THRESHOLDS);
    let pitch_mean = banded_sub_score(values.pitch_mean, &p.pitch_mean);
    let pitch_range = banded_sub_score(values.pitch_range, &p.pitch_range);
    let speech_rate = banded_sub_score(values.speech_rate, &p.speech_rate);
    let formant1 = formant_sub_score(values.formant1, &p.formant1);
    let formant2 = formant_sub_score(values.formant2, &p.formant2);

    // Co-occurrence bonuses: both signals have to be well into the elevated
    // band before either pattern counts.
    let mut interaction = 0.0;
    if jitter > 5.0 && shimmer > 5.0 {
        interaction += 0.5 * jitter.min(shimmer);
    }
    if pitch_mean > 5.0 && speech_rate > 5.0 {
        interaction += 0.4 * pitch_mean.min(speech_rate);
    }

    let weighted = W_JITTER * jitter
        + W_SHIMMER * shimmer
        + W_PITCH_MEAN * pitch_mean
        + W_PITCH_RANGE * pitch_range
        + W_SPEECH_RATE * speech_rate
        + W_FORMANT * formant1
        + W_FORMANT * formant2
        + W_INTERACTION * interaction;
    let total_weight = W_JITTER
        + W_SHIMMER
        + W_PITCH_MEAN
        + W_PITCH_RANGE
        + W_SPEECH_RATE
        + W_FORMANT * 2.0
        + W_INTERACTION;

    let raw = (weighted / total_weight) * 10.0;
    let eased = ease_transform(raw, 0.95, 0.75, -10.0);
    let score = clamp_score(eased).min(POPULATION_CAP);

    let level = if score >= HIGH_FLOOR {
        StressLevel::High
    } else if score >= MEDIUM_FLOOR {
        StressLevel::Medium
    } else {
        StressLevel::Low
    };

    StressResult::new(level, score, canned_explanation(level))
}

/// Population mode has no per-session story to tell; the message only
/// reflects the band.
fn canned_explanation(level: StressLevel) -> &'static str {
    match level {
        StressLevel::Low => {
            "Your voice sounds steady and relaxed compared to typical speaking patterns."
        }
        StressLevel::Medium => {
            "Some markers in your voice sit outside the typical relaxed range. \
             Recording a calm baseline will make future readings more precise."
        }
        StressLevel::High => {
            "Several markers in your voice are well outside the typical range."
        }
    }
}
