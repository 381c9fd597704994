//! # Baseline Scorer
//! Scores a recording against the student's own previously captured calm
//! baseline. Deviation-based scoring is more trustworthy than population
//! norms, which is why this path has a lower Medium floor (30 vs 35) and no
//! cap on High.
//!
//! The dispatcher validates the baseline; this module assumes every
//! deviation-relevant baseline field is positive and finite.

use crate::features::{FeatureMap, MeasurementVector, VoiceFeature};
use crate::result::{StressLevel, StressResult, StressType};
use crate::scoring::curves::{clamp_score, ease_transform};

const W_JITTER: f64 = 2.8;
const W_SHIMMER: f64 = 2.8;
const W_PITCH_MEAN: f64 = 2.5;
const W_PITCH_RANGE: f64 = 2.2;
const W_SPEECH_RATE: f64 = 2.0;
const W_INTERACTION: f64 = 1.5;

const MEDIUM_FLOOR: f64 = 30.0;
const HIGH_FLOOR: f64 = 67.0;

/// Per-feature deviation from baseline, centered at zero: jitter/shimmer as
/// `current/baseline − 1`, the rest as signed fractional change. A map of
/// zeros means "identical to baseline", which is also what the adaptive
/// store receives when a session was population-scored.
pub fn deviation_map(current: &MeasurementVector, baseline: &MeasurementVector) -> FeatureMap {
    let mut out = FeatureMap::default();
    for f in VoiceFeature::ALL {
        let base = baseline.feature(f);
        let cur = current.feature(f);
        *out.get_mut(f) = match f {
            VoiceFeature::Jitter | VoiceFeature::Shimmer => cur / base - 1.0,
            _ => (cur - base) / base,
        };
    }
    out
}

/// Ratio curve for the stability measures. Ratios up to 1.1 are within
/// session-to-session noise; 1.1–1.3 ramps linearly to 1.5; beyond that the
/// scale is logarithmic so a 5× blowup doesn't pin the whole score.
fn ratio_sub_score(ratio: f64) -> f64 {
    if !ratio.is_finite() || ratio <= 1.1 {
        return 0.0;
    }
    if ratio <= 1.3 {
        return 1.5 * (ratio - 1.1) / 0.2;
    }
    5.0 * (ratio / 1.3 * 9.0 + 1.0).log10()
}

/// `9·|d|^0.65` — symmetric; pitch drifting low reads as flat affect, high
/// as tension, both matter.
fn pitch_mean_sub_score(dev: f64) -> f64 {
    if !dev.is_finite() {
        return 0.0;
    }
    9.0 * dev.abs().powf(0.65)
}

/// `9·|d|^0.7`, with a 1.4× penalty when the range shrank: a flattening,
/// monotone voice is a stronger stress signal than a more animated one.
fn pitch_range_sub_score(dev: f64) -> f64 {
    if !dev.is_finite() {
        return 0.0;
    }
    let s = 9.0 * dev.abs().powf(0.7);
    if dev < 0.0 {
        s * 1.4
    } else {
        s
    }
}

/// Linear in absolute fractional change.
fn speech_rate_sub_score(dev: f64) -> f64 {
    if !dev.is_finite() {
        return 0.0;
    }
    7.0 * dev.abs()
}

struct SubScores {
    jitter: f64,
    shimmer: f64,
    pitch_mean: f64,
    pitch_range: f64,
    speech_rate: f64,
}

fn sub_scores(devs: &FeatureMap) -> SubScores {
    SubScores {
        jitter: ratio_sub_score(devs.jitter + 1.0),
        shimmer: ratio_sub_score(devs.shimmer + 1.0),
        pitch_mean: pitch_mean_sub_score(devs.pitch_mean),
        pitch_range: pitch_range_sub_score(devs.pitch_range),
        speech_rate: speech_rate_sub_score(devs.speech_rate),
    }
}

/// Pattern thresholds shared by the interaction bonuses and the stress-type
/// classifier (§ explanation). First match wins: Agitation, Fatigue, Strain.
fn classify(devs: &FeatureMap, subs: &SubScores) -> Option<StressType> {
    if devs.pitch_mean > 0.10 && devs.speech_rate > 0.10 {
        return Some(StressType::AcuteAgitation);
    }
    if devs.pitch_range < -0.20 && devs.speech_rate < -0.10 {
        return Some(StressType::VocalFatigue);
    }
    if subs.jitter > 4.0 && subs.shimmer > 4.0 {
        return Some(StressType::VocalStrain);
    }
    None
}

/// Score `current` against a validated calm `baseline`. `multiplier` is the
/// per-user sensitivity scale in [1.0, 1.3] and multiplies the raw weighted
/// score before the final ease transform.
pub fn score_baseline(
    current: &MeasurementVector,
    baseline: &MeasurementVector,
    multiplier: f64,
) -> StressResult {
    let devs = deviation_map(current, baseline);
    let subs = sub_scores(&devs);

    let mut interaction = 0.0;
    // Agitation: pitch and tempo both pushed upward.
    if devs.pitch_mean > 0.10 && devs.speech_rate > 0.10 {
        interaction += 0.35 * subs.pitch_mean.min(subs.speech_rate);
    }
    // Fatigue: flattened range together with slowed tempo.
    if devs.pitch_range < -0.20 && devs.speech_rate < -0.10 {
        interaction += 0.45 * subs.pitch_range.min(subs.speech_rate);
    }
    // Strain: both stability measures clearly degraded.
    if subs.jitter > 4.0 && subs.shimmer > 4.0 {
        interaction += 0.3 * (subs.jitter + subs.shimmer);
    }

    let weighted = W_JITTER * subs.jitter
        + W_SHIMMER * subs.shimmer
        + W_PITCH_MEAN * subs.pitch_mean
        + W_PITCH_RANGE * subs.pitch_range
        + W_SPEECH_RATE * subs.speech_rate
        + W_INTERACTION * interaction;
    let total_weight =
        W_JITTER + W_SHIMMER + W_PITCH_MEAN + W_PITCH_RANGE + W_SPEECH_RATE + W_INTERACTION;

    let raw = (weighted / total_weight) * 8.5 * multiplier;
    let score = clamp_score(ease_transform(raw, 0.85, 0.9, -3.0));

    let level = if score >= HIGH_FLOOR {
        StressLevel::High
    } else if score >= MEDIUM_FLOOR {
        StressLevel::Medium
    } else {
        StressLevel::Low
    };

    let stress_type = if level == StressLevel::Low {
        None
    } else {
        classify(&devs, &subs)
    };

    StressResult::new(level, score, explanation(level, &devs, &subs)).with_stress_type(stress_type)
}

/// For Medium/High, name up to three features whose sub-score cleared 3,
/// each as a signed percent change from baseline.
fn explanation(level: StressLevel, devs: &FeatureMap, subs: &SubScores) -> String {
    if level == StressLevel::Low {
        return "Your voice is close to your calm baseline.".to_string();
    }

    let mut flagged: Vec<(VoiceFeature, f64, f64)> = VoiceFeature::ALL
        .iter()
        .map(|f| {
            let sub = match f {
                VoiceFeature::Jitter => subs.jitter,
                VoiceFeature::Shimmer => subs.shimmer,
                VoiceFeature::PitchMean => subs.pitch_mean,
                VoiceFeature::PitchRange => subs.pitch_range,
                VoiceFeature::SpeechRate => subs.speech_rate,
            };
            (*f, sub, devs.get(*f))
        })
        .filter(|(_, sub, _)| *sub > 3.0)
        .collect();
    flagged.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    if flagged.is_empty() {
        return "Your voice has drifted noticeably from your calm baseline.".to_string();
    }

    let parts: Vec<String> = flagged
        .iter()
        .take(3)
        .map(|(f, _, dev)| format!("{} changed by {:+.0}%", f.label(), dev * 100.0))
        .collect();
    format!("Compared to your calm baseline: {}.", parts.join(", "))
}
