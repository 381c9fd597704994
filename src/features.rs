//! # Acoustic Features
//! The measurement vector produced by the feature-extraction service, plus the
//! shared feature identifiers used by the baseline scorer and the self-report
//! adaptation store. One enum, no stringly-typed keys, so the deviation math
//! and the weight map can never drift apart.

use serde::{Deserialize, Serialize};

/// One voice recording, reduced to seven acoustic biomarkers.
///
/// Units are the extraction service's contract: percent for jitter/shimmer,
/// Hz for pitch and formants, words-per-minute for speech rate. The scorers
/// assume physically plausible non-negative values and never panic on
/// anything finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementVector {
    /// Cycle-to-cycle pitch instability (%).
    pub jitter: f64,
    /// Cycle-to-cycle amplitude instability (%).
    pub shimmer: f64,
    /// Mean fundamental frequency (Hz).
    pub pitch_mean: f64,
    /// Fundamental frequency range (Hz).
    pub pitch_range: f64,
    /// Estimated speaking tempo (words/min).
    pub speech_rate: f64,
    /// First formant (Hz).
    pub formant1: f64,
    /// Second formant (Hz).
    pub formant2: f64,
}

impl MeasurementVector {
    /// A baseline is usable only if every deviation-relevant field is strictly
    /// positive and finite. Formants are exempt: the baseline path never
    /// divides by them.
    pub fn is_usable_baseline(&self) -> bool {
        VoiceFeature::ALL.iter().all(|f| {
            let v = self.feature(*f);
            v.is_finite() && v > 0.0
        })
    }

    /// Field access by shared feature id (deviation-relevant fields only).
    pub fn feature(&self, f: VoiceFeature) -> f64 {
        match f {
            VoiceFeature::Jitter => self.jitter,
            VoiceFeature::Shimmer => self.shimmer,
            VoiceFeature::PitchMean => self.pitch_mean,
            VoiceFeature::PitchRange => self.pitch_range,
            VoiceFeature::SpeechRate => self.speech_rate,
        }
    }
}

/// The five features the baseline deviation math and the adaptive weight map
/// agree on. Formants are deliberately absent: vowel quality is presumed
/// stable per individual, so it carries no signal relative to a personal
/// baseline (population scoring still uses it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoiceFeature {
    Jitter,
    Shimmer,
    PitchMean,
    PitchRange,
    SpeechRate,
}

impl VoiceFeature {
    pub const ALL: [VoiceFeature; 5] = [
        VoiceFeature::Jitter,
        VoiceFeature::Shimmer,
        VoiceFeature::PitchMean,
        VoiceFeature::PitchRange,
        VoiceFeature::SpeechRate,
    ];

    /// Human-readable label used in explanations.
    pub fn label(self) -> &'static str {
        match self {
            VoiceFeature::Jitter => "voice steadiness (jitter)",
            VoiceFeature::Shimmer => "voice steadiness (shimmer)",
            VoiceFeature::PitchMean => "pitch",
            VoiceFeature::PitchRange => "pitch variability",
            VoiceFeature::SpeechRate => "speaking tempo",
        }
    }
}

/// A per-feature map of floats, used both for deviation vectors (how far a
/// session strayed from the baseline, 0 = no change) and for the adaptive
/// store's learned weights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeatureMap {
    pub jitter: f64,
    pub shimmer: f64,
    pub pitch_mean: f64,
    pub pitch_range: f64,
    pub speech_rate: f64,
}

impl FeatureMap {
    pub fn get(&self, f: VoiceFeature) -> f64 {
        match f {
            VoiceFeature::Jitter => self.jitter,
            VoiceFeature::Shimmer => self.shimmer,
            VoiceFeature::PitchMean => self.pitch_mean,
            VoiceFeature::PitchRange => self.pitch_range,
            VoiceFeature::SpeechRate => self.speech_rate,
        }
    }

    pub fn get_mut(&mut self, f: VoiceFeature) -> &mut f64 {
        match f {
            VoiceFeature::Jitter => &mut self.jitter,
            VoiceFeature::Shimmer => &mut self.shimmer,
            VoiceFeature::PitchMean => &mut self.pitch_mean,
            VoiceFeature::PitchRange => &mut self.pitch_range,
            VoiceFeature::SpeechRate => &mut self.speech_rate,
        }
    }

    /// Dot product against another map over the five shared features.
    pub fn dot(&self, other: &FeatureMap) -> f64 {
        VoiceFeature::ALL
            .iter()
            .map(|f| self.get(*f) * other.get(*f))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> MeasurementVector {
        MeasurementVector {
            jitter: 0.35,
            shimmer: 2.1,
            pitch_mean: 140.0,
            pitch_range: 38.0,
            speech_rate: 150.0,
            formant1: 520.0,
            formant2: 1550.0,
        }
    }

    #[test]
    fn usable_baseline_accepts_plausible_vector() {
        assert!(calm().is_usable_baseline());
    }

    #[test]
    fn usable_baseline_rejects_zero_negative_and_non_finite() {
        let mut v = calm();
        v.jitter = 0.0;
        assert!(!v.is_usable_baseline());

        let mut v = calm();
        v.pitch_range = -3.0;
        assert!(!v.is_usable_baseline());

        let mut v = calm();
        v.speech_rate = f64::NAN;
        assert!(!v.is_usable_baseline());

        let mut v = calm();
        v.shimmer = f64::INFINITY;
        assert!(!v.is_usable_baseline());
    }

    #[test]
    fn zero_formants_do_not_invalidate_a_baseline() {
        let mut v = calm();
        v.formant1 = 0.0;
        v.formant2 = 0.0;
        assert!(v.is_usable_baseline());
    }

    #[test]
    fn feature_map_dot_matches_manual_sum() {
        let mut a = FeatureMap::default();
        a.jitter = 2.0;
        a.pitch_mean = -1.0;
        let mut b = FeatureMap::default();
        b.jitter = 0.5;
        b.pitch_mean = 3.0;
        b.speech_rate = 9.0;
        assert!((a.dot(&b) - (2.0 * 0.5 + (-1.0) * 3.0)).abs() < 1e-12);
    }
}
