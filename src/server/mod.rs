//! Read-only question API over the scraped corpus.
//!
//! Every route answers with a `{"status": "success", ...}` envelope, or
//! `{"status": "error", "message": ...}` with 400/404/500.

pub mod cds;
pub mod corpus;
pub mod error;
pub mod sample;
pub mod upsc;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::middleware::map_response_with_state;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::ServeConfig;
use corpus::Corpus;
use error::{reveal_errors, route_not_found, ApiError};
use sample::Shortfall;

#[derive(Clone)]
pub struct AppState {
    pub corpus: Arc<Corpus>,
    pub expose_errors: bool,
}

impl AppState {
    pub fn new(corpus: Corpus, expose_errors: bool) -> Self {
        Self {
            corpus: Arc::new(corpus),
            expose_errors,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/api", get(api_index))
        .nest("/api/upsc", upsc::routes())
        .nest("/api/cds", cds::routes())
        .fallback(route_not_found)
        .layer(map_response_with_state(state.clone(), reveal_errors))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(cfg: ServeConfig) -> Result<()> {
    let corpus = Corpus::new(&cfg.data_dir);
    info!("Serving questions from {}", corpus.root().display());
    let app = router(AppState::new(corpus, cfg.expose_errors));

    let listener = tokio::net::TcpListener::bind(&cfg.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.addr))?;
    info!("Server is running on {}", cfg.addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub(crate) fn insufficient(message: &str, noun: &str, s: Shortfall) -> ApiError {
    ApiError::Insufficient {
        message: message.to_string(),
        details: format!(
            "Only {} {} found, minimum {} required",
            s.available, noun, s.requested
        ),
    }
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Welcome to the exam questions API",
    }))
}

async fn api_index() -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": "Welcome to UPSC and CDS Questions API",
        "endpoints": {
            "/api/upsc": "Access UPSC related questions",
            "/api/cds": "Access CDS related questions"
        }
    }))
}

// ── Tests ──
