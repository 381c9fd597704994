use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::advisor::{DynAdvisor, ScoreAdvisor as _};
use crate::engine::{SessionEngine, SessionOutcome};
use crate::features::MeasurementVector;
use crate::profiles::ProfileKind;
use crate::store::SharedStore;

#[derive(Clone)]
pub struct AppState {
    engine: Arc<SessionEngine>,
    advisor: DynAdvisor,
}

pub fn create_router(store: SharedStore, advisor: DynAdvisor) -> Router {
    let state = AppState {
        engine: Arc::new(SessionEngine::new(store)),
        advisor,
    };

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/analyze", post(analyze))
        .route("/self-report", post(self_report))
        .route("/calibrate/reset", post(reset_calibration))
        .route("/debug/sensitivity", get(debug_sensitivity))
        .route("/debug/adaptive", get(debug_adaptive))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeReq {
    user_id: String,
    #[serde(default)]
    profile: ProfileKind,
    values: MeasurementVector,
    /// The student's calm baseline, if one has been captured. Invalid
    /// baselines silently fall back to population scoring.
    #[serde(default)]
    baseline: Option<MeasurementVector>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResp {
    #[serde(flatten)]
    outcome: SessionOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    advisor_note: Option<String>,
}

async fn analyze(State(state): State<AppState>, Json(body): Json<AnalyzeReq>) -> Json<AnalyzeResp> {
    // Advisory pass runs on a stateless preview so a slow or failing provider
    // can never leave a half-committed session behind.
    let preview = state.engine.preview(
        &body.values,
        body.profile,
        body.baseline.as_ref(),
        &body.user_id,
    );
    let hint = state.advisor.suggest(&preview).await;
    let (suggested, note) = match hint {
        Some(h) => (Some(h.suggested_score), Some(h.note).filter(|n| !n.is_empty())),
        None => (None, None),
    };

    let outcome = state.engine.analyze(
        &body.values,
        body.profile,
        body.baseline.as_ref(),
        suggested,
        &body.user_id,
    );
    Json(AnalyzeResp {
        outcome,
        advisor_note: note,
    })
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelfReportReq {
    user_id: String,
    /// Subjective stress, 1 (calm) to 5 (very stressed).
    rating: u8,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SelfReportResp {
    sessions: u32,
    bias: f64,
    last_label: Option<f64>,
}

async fn self_report(
    State(state): State<AppState>,
    Json(body): Json<SelfReportReq>,
) -> Json<SelfReportResp> {
    let st = state.engine.self_report(body.rating, &body.user_id);
    Json(SelfReportResp {
        sessions: st.sessions,
        bias: st.bias,
        last_label: st.last_label,
    })
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResetReq {
    user_id: String,
}

async fn reset_calibration(State(state): State<AppState>, Json(body): Json<ResetReq>) -> &'static str {
    state.engine.reset_calibration(&body.user_id);
    "reset"
}

async fn debug_sensitivity(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<crate::adapt::SensitivityState> {
    let user = q.get("user").cloned().unwrap_or_default();
    Json(state.engine.sensitivity_state(&user))
}

async fn debug_adaptive(
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Json<crate::adapt::AdaptiveStressState> {
    let user = q.get("user").cloned().unwrap_or_default();
    Json(state.engine.adaptive_state(&user))
}
