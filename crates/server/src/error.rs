use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use trainer_core::{ResolveError, SessionError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::WrongPhase { .. }
            | SessionError::OpponentPending
            | SessionError::Stalled
            | SessionError::StaleRequest => AppError::Conflict(e.to_string()),
            SessionError::EmptyFilters
            | SessionError::EmptySquare(_)
            | SessionError::Position(_) => AppError::BadRequest(e.to_string()),
            SessionError::IllegalOpponentMove { .. } => AppError::Upstream(e.to_string()),
        }
    }
}

impl From<ResolveError> for AppError {
    fn from(e: ResolveError) -> Self {
        AppError::Upstream(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream error: {msg}");
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
        };

        (status, Json(json!({ "detail": message }))).into_response()
    }
}
