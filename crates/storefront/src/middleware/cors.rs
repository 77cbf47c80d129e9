//! CORS for browser clients served from the storefront origin.

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

use super::request_id::REQUEST_ID_HEADER;
use crate::config::StorefrontConfig;

/// Allow the configured storefront origin to call the API with cookies.
#[must_use]
pub fn create_cors_layer(config: &StorefrontConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true);

    match HeaderValue::from_str(&config.allowed_origin()) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Base URL origin is not a valid header value, CORS disabled: {e}");
            layer
        }
    }
}
