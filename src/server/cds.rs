use axum::extract::{Path, State};
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use serde_json::{json, Map, Value};

use super::corpus::{self, CdsExam};
use super::error::ApiError;
use super::sample::{pick, shuffle_take};
use super::AppState;

const MATHS_LIMIT: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/general-studies/:subject", get(general_studies))
        .route("/science/:subject", get(science))
        .route("/pyqs", get(pyqs_index))
        .route("/pyqs/:year/:exam/:subject", get(pyq_paper))
        .route("/mathematics", get(mathematics))
        .route("/english", get(english))
}

async fn index() -> Json<Value> {
    Json(json!({
        "status": "success",
        "endpoints": {
            "/pyqs": "Get CDS Previous Year Questions by year and exam",
            "/general-studies": {
                "economy": "Get CDS General Studies Economy questions",
                "general-knowledge": "Get CDS General Studies General Knowledge questions",
                "geography": "Get CDS General Studies Geography questions",
                "history": "Get CDS General Studies History questions",
                "polity": "Get CDS General Studies Polity questions"
            },
            "/science": {
                "biology": "Get CDS Science Biology questions",
                "chemistry": "Get CDS Science Chemistry questions",
                "physics": "Get CDS Science Physics questions"
            },
            "/mathematics": "Get 100 random CDS Mathematics questions",
            "/english": "Get random CDS English questions from any year"
        }
    }))
}

async fn general_studies(
    State(state): State<AppState>,
    Path(subject): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let path = state.corpus.cds_general_studies(&subject)?;
    whole_subject(&path, subject).await
}

async fn science(State(state): State<AppState>, Path(subject): Path<String>) -> Result<Json<Value>, ApiError> {
    let path = state.corpus.cds_science(&subject)?;
    whole_subject(&path, subject).await
}

async fn whole_subject(path: &std::path::Path, subject: String) -> Result<Json<Value>, ApiError> {
    let questions = corpus::extract_questions(corpus::read_json(path, false).await?);
    Ok(Json(json!({
        "status": "success",
        "subject": subject,
        "totalQuestions": questions.len(),
        "data": questions
    })))
}

/// `{year: {"CDS I": [subjects], "CDS II": [subjects]}}` for every paper on disk.
async fn pyqs_index(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let root = state.corpus.cds_pyqs_dir();
    let mut structure = Map::new();

    for year in corpus::list_subdirs(&root, corpus::is_year).await? {
        let year_dir = root.join(&year);
        let mut exams = Map::new();
        for exam in corpus::list_subdirs(&year_dir, |e| e == "CDS I" || e == "CDS II").await? {
            let subjects: Vec<String> = corpus::list_dir(&year_dir.join(&exam))
                .await?
                .iter()
                .filter(|f| f.ends_with(".json"))
                .filter_map(|f| corpus::cds_subject_from_file(f))
                .collect();
            exams.insert(exam, json!(subjects));
        }
        structure.insert(year, Value::Object(exams));
    }

    Ok(Json(json!({ "status": "success", "data": structure })))
}

async fn pyq_paper(
    State(state): State<AppState>,
    Path((year, exam, subject)): Path<(String, String, String)>,
) -> Result<Json<Value>, ApiError> {
    let path = state.corpus.cds_paper(&year, CdsExam::from_param(&exam), &subject)?;
    let data = corpus::read_json(&path, false).await?;
    Ok(Json(json!({ "status": "success", "data": data })))
}

/// Every maths file pooled, shuffled, capped at 100.
async fn mathematics(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let dir = state.corpus.cds_maths_dir();
    let mut all = Vec::new();
    for file in corpus::list_dir(&dir).await?.iter().filter(|f| f.ends_with(".json")) {
        all.extend(corpus::extract_questions(corpus::read_json(&dir.join(file), false).await?));
    }
    let total = all.len();
    let picked = shuffle_take(all, MATHS_LIMIT, &mut rand::thread_rng());

    Ok(Json(json!({
        "status": "success",
        "totalQuestions": total,
        "returnedQuestions": picked.len(),
        "data": picked
    })))
}

/// English paper from a random year and a random sitting of that year.
async fn english(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let root = state.corpus.cds_pyqs_dir();
    let years = corpus::list_subdirs(&root, corpus::is_year).await?;
    let year = pick(&years, &mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| ApiError::not_found("No CDS papers available"))?;

    let exams = corpus::list_subdirs(&root.join(&year), |e| e == "CDS I" || e == "CDS II").await?;
    let exam = pick(&exams, &mut rand::thread_rng())
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("No CDS sittings found for {}", year)))?;

    let path = state.corpus.cds_paper(&year, CdsExam::from_param(&exam), "English")?;
    let data = corpus::read_json(&path, false).await?;

    Ok(Json(json!({
        "status": "success",
        "year": year,
        "exam": exam,
        "data": data
    })))
}
