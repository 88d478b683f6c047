use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Invalid request: {0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Domain(e) => match e {
                DomainError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                DomainError::Ingest(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DomainError::Retrieval(_)
                | DomainError::Generation(_)
                | DomainError::ExternalService(_) => StatusCode::BAD_GATEWAY,
                DomainError::GenerationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
                DomainError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::NotFound(_) => StatusCode::NOT_FOUND,
                DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Domain(e) => e.kind(),
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::BadRequest(m) => m,
            Self::Domain(e) => e.message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let body = Json(json!({
            "error": self.kind(),
            "message": self.message(),
        }));

        (status, body).into_response()
    }
}
