use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum RadioError {
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("backend init failed: {0}")]
    BackendInitFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("preset missing: {0}")]
    PresetMissing(String),

    #[error("bitrate unknown")]
    BitrateUnknown,

    #[error("malformed path: {0}")]
    PathMalformed(String),

    #[error("stream cancelled")]
    StreamCancelled,

    #[error("stream read error: {0}")]
    StreamReadError(String),

    #[error("stream write error: {0}")]
    StreamWriteError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl From<redis::RedisError> for RadioError {
    fn from(e: redis::RedisError) -> Self {
        RadioError::BackendUnavailable(e.to_string())
    }
}

impl IntoResponse for RadioError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            RadioError::NotFound(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            RadioError::PresetMissing(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            RadioError::PathMalformed(ref msg) => (StatusCode::NOT_FOUND, msg.clone()),
            RadioError::BitrateUnknown => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            RadioError::BackendUnavailable(ref msg) => {
                tracing::error!("backend unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "backend unavailable".to_string())
            }
            RadioError::BackendInitFailed(ref msg) => {
                tracing::error!("backend init failed: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "backend init failed".to_string())
            }
            RadioError::StreamCancelled => (StatusCode::OK, self.to_string()),
            RadioError::StreamReadError(ref msg) | RadioError::StreamWriteError(ref msg) => {
                tracing::error!("{}", msg);
                (StatusCode::BAD_GATEWAY, msg.clone())
            }
            RadioError::EncodingError(ref msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            RadioError::Internal(ref e) => {
                tracing::error!("internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, RadioError>;
