use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use super::request_id::REQUEST_ID_HEADER;

/// Creates the CORS layer for the authoring front end
///
/// Clients authenticate generation calls with an `Authorization` bearer token rather
/// than cookies, so credentials are not allowed. A `*` entry allows any origin.
pub fn create_cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(
            allowed_origins
                .into_iter()
                .filter_map(|s| s.parse::<HeaderValue>().ok()),
        )
    };

    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
            request_id.clone(),
        ])
        .expose_headers([request_id])
}
