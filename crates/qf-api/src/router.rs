use axum::{Router, http::StatusCode, routing::get};

use crate::{document, error::ApiError, quiz, state::ApiState};

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .merge(document::routes())
        .merge(quiz::routes())
        .fallback(handler_404)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn handler_404() -> ApiError {
    ApiError::RouteNotFound
}
