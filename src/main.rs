//! Voice Stress Service — Binary Entrypoint
//! Boots the Axum HTTP server, wiring the session engine, the advisory
//! client, and file-backed adaptation state.

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use voice_stress_analyzer::advisor::{build_advisor_from_config, load_advisor_config, ScoreAdvisor as _};
use voice_stress_analyzer::api;
use voice_stress_analyzer::store::JsonFileStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("voice_stress_analyzer=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let state_dir = std::env::var("STATE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("state"));
    let store = Arc::new(JsonFileStore::new(state_dir));

    let advisor_cfg = load_advisor_config();
    let advisor = build_advisor_from_config(&advisor_cfg);
    tracing::info!(provider = advisor.provider_name(), "advisor configured");

    let router = api::create_router(store, advisor);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, router).await?;
    Ok(())
}
