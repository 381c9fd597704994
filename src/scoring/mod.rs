//! # Scoring Pipeline
//! `calculate_stress_level` is the single public entry point: it validates
//! the optional calm baseline and routes to the baseline scorer when usable,
//! else to the population scorer. Partial or corrupt calibration data must
//! never crash or block an analysis, so an invalid baseline silently degrades
//! to population mode.

pub mod baseline;
pub mod curves;
pub mod population;

use crate::features::MeasurementVector;
use crate::profiles::ProfileKind;
use crate::result::StressResult;

/// Score one recording. Pure: same inputs always produce the same result.
///
/// `baseline` is usable only if its five deviation-relevant fields are
/// strictly positive and finite; otherwise (including `None`) the call falls
/// back to population scoring against `profile`. `multiplier` only affects
/// the baseline path and is expected in [1.0, 1.3].
pub fn calculate_stress_level(
    values: &MeasurementVector,
    profile: ProfileKind,
    baseline: Option<&MeasurementVector>,
    multiplier: f64,
) -> StressResult {
    match baseline {
        Some(b) if b.is_usable_baseline() => baseline::score_baseline(values, b, multiplier),
        _ => population::score_population(values, profile),
    }
}
