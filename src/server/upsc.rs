use std::collections::BTreeSet;

use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Map, Value};
use tracing::info;

use super::corpus::{self, Stage};
use super::error::ApiError;
use super::sample::sample;
use super::{insufficient, AppState};

const PRELIMS_GS1_COUNT: usize = 100;
const PRELIMS_GS2_COUNT: usize = 80;
const ESSAY_COUNT: usize = 2;
const PRELIMS_CHAPTER_COUNT: usize = 50;
const MAINS_CHAPTER_COUNT: usize = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/prelims", get(prelims_years))
        .route("/prelims/gs1/:year", get(prelims_gs1))
        .route("/prelims/gs2/:year", get(prelims_gs2))
        .route("/prelims/chapter-wise/:topic", get(prelims_chapter))
        .route("/mains/essay", get(essay_years))
        .route("/mains/essay/:year", get(essays))
        .route("/mains/gs", get(mains_gs_years))
        .route("/mains/gs/:paper/:year", get(mains_gs_paper))
        .route("/mains/chapter-wise/:topic", get(mains_chapter))
}

async fn index() -> Json<Value> {
    Json(json!({
        "status": "success",
        "endpoints": {
            "/prelims": "Get UPSC Prelims questions",
            "/mains/gs": "Get UPSC Mains GS papers",
            "/essays": "Get UPSC essay topics"
        }
    }))
}

// ── Prelims ──

async fn prelims_years(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let files = corpus::list_dir(&state.corpus.prelims_dir()).await?;
    let mut data = Map::new();
    for file in files.iter().filter(|f| f.ends_with(".json")) {
        let year = file.split('_').next().unwrap_or_default();
        data.entry(year)
            .or_insert_with(|| json!(["General Studies 1", "General Studies 2"]));
    }
    Ok(Json(json!({ "status": "success", "data": data })))
}

async fn prelims_gs1(state: State<AppState>, year: Path<String>) -> Result<Json<Value>, ApiError> {
    prelims_paper(state, year, 1, PRELIMS_GS1_COUNT).await
}

async fn prelims_gs2(state: State<AppState>, year: Path<String>) -> Result<Json<Value>, ApiError> {
    prelims_paper(state, year, 2, PRELIMS_GS2_COUNT).await
}

async fn prelims_paper(
    State(state): State<AppState>,
    Path(year): Path<String>,
    paper: u8,
    count: usize,
) -> Result<Json<Value>, ApiError> {
    info!("Prelims GS{} requested for {}", paper, year);
    let path = state.corpus.prelims_paper(&year, paper)?;
    let all = corpus::root_array(corpus::read_json(&path, true).await?);
    let total = all.len();
    let questions = sample(all, count, &mut rand::thread_rng())
        .map_err(|s| insufficient("Not enough questions available", "questions", s))?;

    Ok(Json(json!({
        "status": "success",
        "year": year,
        "paper": format!("General Studies {}", paper),
        "data": { "questions": questions, "totalQuestions": total }
    })))
}

// ── Mains essays ──

async fn essay_years(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let dir = state.corpus.essays_dir();
    let details = format!("Directory path: {}", dir.display());
    if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
        return Err(ApiError::not_found_with("Essay directory not found", details));
    }

    let files = corpus::list_dir(&dir).await?;
    if files.is_empty() {
        return Err(ApiError::not_found_with("No essay files found in directory", details));
    }
    let years: Vec<&str> = files
        .iter()
        .filter(|f| f.ends_with(".json"))
        .filter_map(|f| f.split('_').next())
        .collect();
    if years.is_empty() {
        return Err(ApiError::not_found_with("No valid essay files found", details));
    }

    Ok(Json(json!({ "status": "success", "data": { "availableYears": years } })))
}

async fn essays(State(state): State<AppState>, Path(year): Path<String>) -> Result<Json<Value>, ApiError> {
    let dir = state.corpus.essays_dir();
    if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
        return Err(ApiError::not_found_with(
            "Essay directory not found",
            format!("Directory path: {}", dir.display()),
        ));
    }
    let missing = |path: &std::path::Path| {
        ApiError::not_found_with(
            format!("Essay file for year {} not found", year),
            format!("File path: {}", path.display()),
        )
    };
    // A malformed year can never name an essay file.
    let path = state
        .corpus
        .essay_file(&year)
        .map_err(|_| missing(&dir.join(format!("{}_essays.json", year))))?;
    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        return Err(missing(&path));
    }

    let all = corpus::root_array(corpus::read_json(&path, true).await?);
    let total = all.len();
    let picked = sample(all, ESSAY_COUNT, &mut rand::thread_rng()).map_err(|s| ApiError::Insufficient {
        message: "Not enough essays available".into(),
        details: format!("Only {} essays found", s.available),
    })?;

    Ok(Json(json!({
        "status": "success",
        "year": year,
        "data": { "essays": picked, "totalEssays": total }
    })))
}

// ── Mains GS papers ──

async fn mains_gs_years(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let files = corpus::list_dir(&state.corpus.mains_gs_dir()).await?;
    let years: BTreeSet<String> = files
        .iter()
        .filter_map(|f| corpus::mains_gs_year_from_file(f))
        .collect();

    let mut data = Map::new();
    for year in years {
        data.insert(year, json!(["Paper 1", "Paper 2", "Paper 3", "Paper 4"]));
    }
    Ok(Json(json!({ "status": "success", "data": data })))
}

async fn mains_gs_paper(
    State(state): State<AppState>,
    Path((paper, year)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let number = match paper.as_str() {
        "paper1" => 1,
        "paper2" => 2,
        "paper3" => 3,
        "paper4" => 4,
        _ => return Err(ApiError::not_found("Paper not found")),
    };
    info!("Mains GS paper {} requested for {}", number, year);
    let path = state.corpus.mains_gs_paper(&year, number)?;
    let questions = corpus::read_json(&path, true).await?;

    Ok(Json(json!({
        "status": "success",
        "year": year,
        "paper": format!("General Studies Paper {}", number),
        "data": { "questions": questions }
    })))
}

// ── Chapter-wise ──

async fn prelims_chapter(state: State<AppState>, topic: Path<String>) -> Result<Json<Value>, ApiError> {
    chapter(state, topic, Stage::Prelims, PRELIMS_CHAPTER_COUNT).await
}

async fn mains_chapter(state: State<AppState>, topic: Path<String>) -> Result<Json<Value>, ApiError> {
    chapter(state, topic, Stage::Mains, MAINS_CHAPTER_COUNT).await
}

async fn chapter(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    stage: Stage,
    count: usize,
) -> Result<Json<Value>, ApiError> {
    let (path, subject) = state.corpus.chapter_wise(stage, &topic)?;
    let all = corpus::root_array(corpus::read_json(&path, true).await?);
    let total = all.len();
    let questions = sample(all, count, &mut rand::thread_rng())
        .map_err(|s| insufficient("Not enough questions available", "questions", s))?;

    Ok(Json(json!({
        "status": "success",
        "category": stage.label(),
        "subject": subject,
        "data": { "questions": questions, "totalQuestions": total }
    })))
}
