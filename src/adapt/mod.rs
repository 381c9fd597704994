//! Feedback-driven adaptation: the sensitivity multiplier derived from recent
//! session history, and the self-report linear correction. The two stores are
//! independent of each other; both are keyed per student and injected with a
//! [`KeyValueStore`](crate::store::KeyValueStore).

pub mod self_report;
pub mod sensitivity;

pub use self_report::{AdaptiveStressState, AdaptiveTracker, SessionSnapshot};
pub use sensitivity::{SensitivityState, SensitivityTracker};
