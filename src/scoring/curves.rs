//! Shared response curves and clamps for both scoring paths.
//!
//! Every helper maps a raw measurement (or a band position) onto a 0–10
//! "badness" sub-score. The final ease transform is also here because the
//! two paths share its shape and differ only in constants.

use crate::profiles::{BandedNorm, RangeNorm};

/// Clamp a final score into the displayable [0, 100] band.
pub fn clamp_score(x: f64) -> f64 {
    x.clamp(0.0, 100.0)
}

/// Ease the raw 0–100 aggregate onto the displayed scale: normalize, soften
/// with a sub-unity exponent, rescale, then shift. Constants differ per path
/// (population: 0.95 / 0.75 / −10; baseline: 0.85 / 0.9 / −3).
pub fn ease_transform(raw: f64, exponent: f64, factor: f64, offset: f64) -> f64 {
    let n = (raw / 100.0).clamp(0.0, 1.0);
    clamp_score(n.powf(exponent) * 100.0 * factor + offset)
}

/// Clinical-style thresholds for a stability measure (jitter or shimmer).
/// `normal` is the measured healthy ceiling; beyond `severe` the sub-score
/// saturates at 10.
#[derive(Debug, Clone, Copy)]
pub struct StabilityThresholds {
    pub normal: f64,
    pub mild: f64,
    pub moderate: f64,
    pub severe: f64,
}

/// Jitter thresholds (%): 1.04 is the commonly cited healthy ceiling.
pub const JITTER_THRESHOLDS: StabilityThresholds = StabilityThresholds {
    normal: 1.04,
    mild: 1.8,
    moderate: 3.0,
    severe: 5.0,
};

/// Shimmer thresholds (%): 3.81 healthy ceiling.
pub const SHIMMER_THRESHOLDS: StabilityThresholds = StabilityThresholds {
    normal: 3.81,
    mild: 5.5,
    moderate: 8.0,
    severe: 12.0,
};

/// Piecewise stability curve: zero below `normal`, smooth exponential ramp
/// 0→3 up to `mild`, linear 3→7 up to `moderate`, power-law 7→10 up to
/// `severe` (saturated beyond).
pub fn stability_sub_score(value: f64, t: &StabilityThresholds) -> f64 {
    if !value.is_finite() || value <= t.normal {
        return 0.0;
    }
    if value <= t.mild {
        let x = (value - t.normal) / (t.mild - t.normal);
        // exp ramp normalized so x=0 → 0 and x=1 → 3
        let k = 2.0_f64;
        return 3.0 * (1.0 - (-k * x).exp()) / (1.0 - (-k).exp());
    }
    if value <= t.moderate {
        let x = (value - t.mild) / (t.moderate - t.mild);
        return 3.0 + 4.0 * x;
    }
    let x = ((value - t.moderate) / (t.severe - t.moderate)).min(1.0);
    7.0 + 3.0 * x.powf(0.8)
}

/// Three-zone banded curve for pitch mean / pitch range / speech rate.
///
/// Inside `normal`: linear 0→1.5 with distance from optimal. Inside
/// `caution`: power escalation 1.5→6. Beyond `caution`: 6 plus up to 4 more,
/// scaled by relative distance from optimal, capped at 10.
pub fn banded_sub_score(value: f64, norm: &BandedNorm) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let dist = (value - norm.optimal).abs();
    let [n_lo, n_hi] = norm.normal;
    let [c_lo, c_hi] = norm.caution;

    if value >= n_lo && value <= n_hi {
        let edge = if value < norm.optimal {
            norm.optimal - n_lo
        } else {
            n_hi - norm.optimal
        };
        if edge <= 0.0 {
            return 0.0;
        }
        return 1.5 * (dist / edge).min(1.0);
    }

    if value >= c_lo && value <= c_hi {
        let (band_lo, band_hi) = if value < n_lo {
            (c_lo, n_lo)
        } else {
            (n_hi, c_hi)
        };
        let span = (band_hi - band_lo).max(f64::EPSILON);
        let x = if value < n_lo {
            (n_lo - value) / span
        } else {
            (value - n_hi) / span
        };
        return 1.5 + 4.5 * x.clamp(0.0, 1.0).powf(1.15);
    }

    // Beyond the caution band entirely.
    let rel = if norm.optimal > 0.0 {
        dist / norm.optimal
    } else {
        1.0
    };
    (6.0 + 4.0 * rel.min(1.0)).min(10.0)
}

/// Two-zone formant curve: linear 0→2 inside the normal band, 2 plus up to
/// 4 more outside it.
pub fn formant_sub_score(value: f64, norm: &RangeNorm) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let dist = (value - norm.optimal).abs();
    let [n_lo, n_hi] = norm.normal;

    if value >= n_lo && value <= n_hi {
        let edge = if value < norm.optimal {
            norm.optimal - n_lo
        } else {
            n_hi - norm.optimal
        };
        if edge <= 0.0 {
            return 0.0;
        }
        return 2.0 * (dist / edge).min(1.0);
    }

    let span = (n_hi - n_lo).max(f64::EPSILON);
    let excess = if value < n_lo { n_lo - value } else { value - n_hi };
    2.0 + 4.0 * (excess / span).min(1.0)
}
