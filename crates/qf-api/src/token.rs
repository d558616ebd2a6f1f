//! Bearer token handling for generation requests.
//!
//! The token belongs to the caller's chat-completion account. It is forwarded
//! upstream as-is and never stored or logged.

use axum::http::{HeaderMap, header};

use crate::error::ApiError;

/// Token from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// The request's own token, falling back to the configured one.
pub fn resolve_token(headers: &HeaderMap, fallback: Option<&str>) -> Result<String, ApiError> {
    bearer_token(headers)
        .or_else(|| fallback.map(String::from))
        .ok_or(ApiError::MissingToken)
}
