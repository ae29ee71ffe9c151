use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use worksuite_core::AppError;

/// Methods used by the permission and directory routes.
const ALLOWED_METHODS: [Method; 5] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::OPTIONS,
];

const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(600);

pub(super) fn build_cors_layer(frontend_url: &str) -> Result<CorsLayer, AppError> {
    let origin = frontend_origin(frontend_url)?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers([CONTENT_TYPE])
        .max_age(PREFLIGHT_MAX_AGE))
}

fn frontend_origin(frontend_url: &str) -> Result<HeaderValue, AppError> {
    let origin = frontend_url.trim().trim_end_matches('/');
    if origin.is_empty() {
        return Err(AppError::Validation("FRONTEND_URL must not be empty".to_owned()));
    }

    HeaderValue::from_str(origin)
        .map_err(|error| AppError::Validation(format!("invalid FRONTEND_URL: {error}")))
}
