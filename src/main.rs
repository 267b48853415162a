use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod settings;
mod form;
mod models;
mod service;

#[cfg(test)]
mod tests;

use settings::AppConfig;
use form::{SearchForm, SearchOutcome};
use models::{ApiResponse, DisplayState, FilterSelection, ACTIVITIES, PHASES};
use service::HttpSearchService;

/// Question response search: exposes the search form over HTTP
#[derive(Parser)]
#[command(name = "question-search", version, about)]
struct Cli {
    /// Config file (toml, yaml, json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on, overrides `listen_addr`
    #[arg(long)]
    listen: Option<String>,

    /// Base URL of the responses backend, overrides `backend_url`
    #[arg(long)]
    backend: Option<String>,

    /// Force DEBUG logging
    #[arg(long)]
    debug: bool,
}

#[derive(Clone)]
struct AppState {
    form: SearchForm,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(listen) = cli.listen {
        config.listen_addr = listen;
    }
    if let Some(backend) = cli.backend {
        config.backend_url = backend;
    }

    init_logging(&config.log_level, cli.debug)?;

    let service = HttpSearchService::new(config.backend_url.clone(), config.request_timeout())
        .context("Failed to create backend client")?;
    let form =
        SearchForm::new(Arc::new(service)).with_stale_discard(config.discard_stale_results);
    let app = build_router(AppState { form });

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.listen_addr))?;
    info!(%addr, backend = %config.backend_url, "server running");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/options", get(list_options))
        .route("/search/filters", get(get_filters).put(put_filters))
        .route("/search", post(run_search))
        .route("/search/state", get(get_state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn root() -> &'static str {
    "Question Search API v0.1.0"
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Fixed phase/activity choices for the dropdowns
async fn list_options() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "phases": PHASES,
        "activities": ACTIVITIES,
    }))
}

async fn get_filters(State(state): State<AppState>) -> Json<FilterSelection> {
    Json(state.form.filters())
}

async fn put_filters(
    State(state): State<AppState>,
    Json(filters): Json<FilterSelection>,
) -> Json<FilterSelection> {
    state.form.set_filters(filters);
    Json(state.form.filters())
}

#[derive(Debug, Default, Deserialize)]
struct SearchParams {
    #[serde(default)]
    wait: bool,
}

/// Run a search with the current filters.
/// `?wait=true` holds the response until both queries have landed.
async fn run_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.form.request_search() {
        SearchOutcome::Rejected => {
            let display = state.form.display();
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ApiResponse {
                    status: "rejected".to_string(),
                    message: display.error_message().to_string(),
                    data: Some(view_json(&display)),
                }),
            )
        }
        SearchOutcome::Dispatched(handle) => {
            let generation = handle.generation;
            let kind = if handle.window.is_dated() { "dated" } else { "unbounded" };

            let (code, status) = if params.wait {
                handle.settled().await;
                (StatusCode::OK, "completed")
            } else {
                (StatusCode::ACCEPTED, "dispatched")
            };

            let display = state.form.display();
            (
                code,
                Json(ApiResponse {
                    status: status.to_string(),
                    message: format!("Search #{} ({})", generation, kind),
                    data: Some(view_json(&display)),
                }),
            )
        }
    }
}

async fn get_state(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(view_json(&state.form.display()))
}

fn view_json(display: &DisplayState) -> serde_json::Value {
    serde_json::to_value(display.view()).unwrap_or_default()
}
