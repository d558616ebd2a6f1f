use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::State,
    routing::post,
};
use qf_pdf::ExtractedText;

use crate::{ApiState, error::ApiError, metrics::record_pdf_extraction};

/// Create the document routes
pub fn routes() -> Router<ApiState> {
    Router::new().route("/documents/extract", post(extract_document))
}

/// Extract the text of a PDF sent as the raw request body
async fn extract_document(
    State(state): State<ApiState>,
    body: Body,
) -> Result<Json<ExtractedText>, ApiError> {
    let limit = state.max_upload_bytes;
    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| ApiError::PayloadTooLarge(limit))?;

    tracing::debug!(bytes = bytes.len(), "Extracting text from uploaded PDF");

    // Parsing is CPU bound
    let result = tokio::task::spawn_blocking(move || qf_pdf::extract_text(&bytes))
        .await
        .map_err(|e| ApiError::Internal(format!("PDF extraction task failed: {e}")))?;

    match result {
        Ok(extracted) => {
            record_pdf_extraction(true, extracted.page_count);
            Ok(Json(extracted))
        }
        Err(e) => {
            record_pdf_extraction(false, 0);
            Err(e.into())
        }
    }
}
