//! Security Middleware
//!
//! Adds standard security headers to every response.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use log::warn;

use crate::config::SecurityHeadersConfig;

/// Security headers that should be applied to all responses
pub struct SecurityHeaders;

impl SecurityHeaders {
    /// Build the header set for the given configuration
    pub fn get_headers(config: &SecurityHeadersConfig) -> HeaderMap {
        let mut headers = HeaderMap::new();

        let mut insert = |name: &'static str, value: String| match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(HeaderName::from_static(name), value);
            }
            Err(_) => warn!("Skipping invalid {} header value '{}'", name, value),
        };

        insert("content-security-policy", config.csp_directive.clone());
        insert("x-frame-options", "DENY".to_string());
        insert("x-content-type-options", "nosniff".to_string());
        insert(
            "referrer-policy",
            "strict-origin-when-cross-origin".to_string(),
        );
        insert("x-dns-prefetch-control", "off".to_string());
        insert("x-download-options", "noopen".to_string());
        if config.hsts_enabled {
            insert(
                "strict-transport-security",
                format!("max-age={}; includeSubDomains", config.hsts_max_age),
            );
        }

        headers
    }
}

/// Middleware to add security headers to all responses
pub async fn security_headers_middleware(
    State(config): State<Arc<SecurityHeadersConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (key, value) in SecurityHeaders::get_headers(&config).iter() {
        headers.insert(key, value.clone());
    }

    response
}
