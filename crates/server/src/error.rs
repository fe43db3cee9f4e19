use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    TooLarge(String),

    #[error("{message}")]
    Analysis {
        message: &'static str,
        details: String,
    },

    #[error(transparent)]
    Multipart(#[from] MultipartError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            AppError::TooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, Json(json!({ "error": msg }))).into_response()
            }
            AppError::Analysis { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message, "details": details })),
            )
                .into_response(),
            AppError::Multipart(e) => {
                (e.status(), Json(json!({ "error": e.body_text() }))).into_response()
            }
        }
    }
}
