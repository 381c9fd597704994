//! Score blending: an external advisory suggestion may nudge the
//! deterministic score, but never dominate it. The suggestion is first
//! bounded to ±10 of the base, then mixed 70/30 toward the base, so the
//! blend can move the displayed score by at most 3 points.

use crate::scoring::curves::clamp_score;

pub fn blend_with_suggestion(base_score: f64, suggested: Option<f64>) -> f64 {
    // A NaN base would poison the clamp bounds below; read it as a floor.
    if base_score.is_nan() {
        return 0.0;
    }
    let Some(s) = suggested.filter(|s| s.is_finite()) else {
        return clamp_score(base_score);
    };
    let bounded = s.clamp(base_score - 10.0, base_score + 10.0);
    clamp_score(base_score * 0.7 + bounded * 0.3)
}
