use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use super::AppState;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    NotFound {
        message: String,
        details: Option<String>,
    },
    /// Fewer items on disk than a sampling route needs.
    #[error("{message}: {details}")]
    Insufficient { message: String, details: String },
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found_with(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

/// Detail of an internal error, carried on the response until `reveal_errors` decides
/// whether the client may see it.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound { message, details } => {
                let mut body = json!({ "status": "error", "message": message });
                if let Some(d) = details {
                    body["details"] = json!(d);
                }
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            ApiError::Insufficient { message, details } => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": message, "details": details })),
            )
                .into_response(),
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": message })),
            )
                .into_response(),
            ApiError::Internal(e) => {
                tracing::error!("Request failed: {:#}", e);
                let mut res = (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "status": "error", "message": "Something went wrong!" })),
                )
                    .into_response();
                res.extensions_mut().insert(ErrorDetail(format!("{:#}", e)));
                res
            }
        }
    }
}

/// Rewrites 500 envelopes to include the error text when running in development mode.
pub async fn reveal_errors(State(state): State<AppState>, res: Response) -> Response {
    if !state.expose_errors {
        return res;
    }
    let Some(ErrorDetail(detail)) = res.extensions().get::<ErrorDetail>().cloned() else {
        return res;
    };
    (
        res.status(),
        Json(json!({
            "status": "error",
            "message": "Something went wrong!",
            "error": detail,
        })),
    )
        .into_response()
}

/// 404 for anything no route matched.
pub async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}
