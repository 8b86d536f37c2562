use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use counsel_core::{
    config::Config,
    pipeline::Pipeline,
    types::{LawyerProfile, RecommendationReport, UserProfile},
};
use counsel_llm::OpenAiBackend;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

// ── AppState ──────────────────────────────────────────────────────────────

pub struct AppState {
    pub pipeline: Pipeline,
}

// ── main ──────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counsel_server=info,counsel_core=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Key presence only, never the values.
    if config.search_api_key.is_empty() {
        warn!("PERPLEXITY_API_KEY is not set; search calls will degrade to placeholders");
    } else {
        info!("search API key loaded");
    }
    if config.chat_api_key.is_empty() {
        warn!("OPENROUTER_API_KEY is not set; chat calls will degrade to fallbacks");
    } else {
        info!("chat API key loaded");
    }

    let search = Arc::new(
        OpenAiBackend::new(
            &config.search_base_url,
            &config.search_api_key,
            &config.search_model,
        )
        .with_timeout(config.llm_timeout_s),
    );
    let chat = Arc::new(
        OpenAiBackend::new(
            &config.chat_base_url,
            &config.chat_api_key,
            &config.chat_model,
        )
        .with_timeout(config.llm_timeout_s),
    );

    let pipeline = Pipeline::new(search, chat)
        .with_top_n(config.top_recommendations)
        .with_max_queries(config.max_queries);

    let state = Arc::new(AppState { pipeline });

    let app = Router::new()
        .route("/", get(health))
        .route("/recommendations", post(recommendations))
        .route("/recommendations/full", post(recommendations_full))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let bind = config.web_bind.clone();
    let port = config.web_port;
    let addr = format!("{bind}:{port}");

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ── Handlers ──────────────────────────────────────────────────────────────
// The pipeline degrades internally and always produces a report, so a
// well-formed profile payload always gets a (possibly empty) list.

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The original API surface: just the recommended lawyers.
async fn recommendations(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<UserProfile>,
) -> Json<Vec<LawyerProfile>> {
    info!(user = %profile.name, "recommendation request");
    let report = state.pipeline.run(profile).await;
    Json(lawyer_list(&report))
}

/// Full report: recommendations plus summary, run log, and timestamp.
async fn recommendations_full(
    State(state): State<Arc<AppState>>,
    Json(profile): Json<UserProfile>,
) -> Json<RecommendationReport> {
    info!(user = %profile.name, "full recommendation request");
    let report = state.pipeline.run(profile).await;
    Json(report)
}

fn lawyer_list(report: &RecommendationReport) -> Vec<LawyerProfile> {
    report
        .recommendations
        .iter()
        .map(|r| r.lawyer.clone())
        .collect()
}
