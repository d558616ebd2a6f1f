use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use qf_core::{GenerationError, QuizError};
use qf_pdf::PdfError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::chat::ChatError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("An API token is required to generate questions")]
    MissingToken,
    #[error("The requested resource was not found")]
    RouteNotFound,
    #[error("Quiz not found: {0}")]
    QuizNotFound(Uuid),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error("A generation is already running for quiz {0}")]
    GenerationInProgress(Uuid),
    #[error("The upload exceeds the limit of {0} bytes")]
    PayloadTooLarge(usize),
    #[error(transparent)]
    Pdf(#[from] PdfError),
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::MissingToken => StatusCode::UNAUTHORIZED,
            Self::RouteNotFound
            | Self::QuizNotFound(_)
            | Self::Quiz(QuizError::QuestionNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Quiz(QuizError::IndexOutOfRange { .. }) => StatusCode::BAD_REQUEST,
            Self::GenerationInProgress(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Pdf(PdfError::Empty) => StatusCode::BAD_REQUEST,
            Self::Pdf(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Chat(_) | Self::Generation(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
