// src/lib.rs
// Public library surface for integration tests (and the app binary).

pub mod adapt;
pub mod advisor;
pub mod api;
pub mod blend;
pub mod engine;
pub mod features;
pub mod profiles;
pub mod result;
pub mod scoring;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::adapt::{AdaptiveStressState, AdaptiveTracker, SensitivityState, SensitivityTracker};
pub use crate::api::create_router;
pub use crate::blend::blend_with_suggestion;
pub use crate::engine::{SessionEngine, SessionOutcome};
pub use crate::features::{FeatureMap, MeasurementVector, VoiceFeature};
pub use crate::profiles::ProfileKind;
pub use crate::result::{StressLevel, StressResult, StressType};
pub use crate::scoring::calculate_stress_level;
