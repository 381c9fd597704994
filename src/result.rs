//! result.rs — the shape every scoring call returns: a bounded score, a
//! discrete level for the UI, a human-readable explanation, and (baseline
//! mode only) a probable stress pattern.

use serde::{Deserialize, Serialize};

/// Discrete stress band shown to the student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

/// Probable stress pattern, classified from baseline deviations.
/// First match wins, in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressType {
    #[serde(rename = "Acute Agitation")]
    AcuteAgitation,
    #[serde(rename = "Vocal Fatigue")]
    VocalFatigue,
    #[serde(rename = "Vocal Strain")]
    VocalStrain,
}

/// Output of one scoring call. Transient; nothing here is persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StressResult {
    pub level: StressLevel,
    /// Clamped to [0, 100]. Population mode additionally caps at 59.
    pub score: f64,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stress_type: Option<StressType>,
}

impl StressResult {
    pub fn new(level: StressLevel, score: f64, explanation: impl Into<String>) -> Self {
        Self {
            level,
            score,
            explanation: explanation.into(),
            stress_type: None,
        }
    }

    pub fn with_stress_type(mut self, t: Option<StressType>) -> Self {
        self.stress_type = t;
        self
    }
}
