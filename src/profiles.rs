//! # Vocal Profiles
//! Demographic norm tables for population-mode scoring. Three profiles ship
//! with the crate (male / female / mixed) as an embedded JSON asset; `mixed`
//! is the fallback for callers that never asked the student.
//!
//! Each banded feature carries an `optimal` point plus inclusive `normal` and
//! `caution` ranges. Formants only carry a `normal` range (their population
//! curve is the simpler two-zone one).

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

static PROFILES: Lazy<HashMap<String, VocalProfile>> = Lazy::new(|| {
    let raw = include_str!("../vocal_profiles.json");
    serde_json::from_str::<HashMap<String, VocalProfile>>(raw).expect("valid vocal profile table")
});

/// Which norm table to score against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Male,
    Female,
    #[default]
    Mixed,
}

impl ProfileKind {
    fn key(self) -> &'static str {
        match self {
            ProfileKind::Male => "male",
            ProfileKind::Female => "female",
            ProfileKind::Mixed => "mixed",
        }
    }
}

/// Optimal point plus normal/caution bands for one banded feature.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BandedNorm {
    pub optimal: f64,
    /// Inclusive [lo, hi].
    pub normal: [f64; 2],
    /// Inclusive [lo, hi], strictly containing `normal`.
    pub caution: [f64; 2],
}

/// Optimal point plus a single normal band (formants).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeNorm {
    pub optimal: f64,
    pub normal: [f64; 2],
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocalProfile {
    pub pitch_mean: BandedNorm,
    pub pitch_range: BandedNorm,
    pub speech_rate: BandedNorm,
    pub formant1: RangeNorm,
    pub formant2: RangeNorm,
}

/// Look up the norm table for a profile kind. The tables are static and the
/// asset is validated at first access, so this cannot fail at runtime.
pub fn profile(kind: ProfileKind) -> &'static VocalProfile {
    PROFILES
        .get(kind.key())
        .expect("embedded profile table covers every ProfileKind")
}
