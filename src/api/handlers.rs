//! HTTP Handlers
//!
//! Shared application state, the JSON response envelope and the health
//! endpoint. Resource handlers live in their own modules.

use std::sync::Arc;

use axum::{extract::FromRequest, extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::config::{AppConfig, SecurityHeadersConfig};
use crate::models::HealthCheckResponse;
use crate::service::{
    AuthService, EmailTemplates, Geocoder, JwtService, Mailer, OfferingService, PhotoStore,
    RestaurantService, ReviewService, UserService,
};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};
use crate::{APP_NAME, VERSION};

/// Multipart framing allowance on top of the largest accepted photo
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// HTTP-level settings derived from the configuration
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Marks the session cookie `Secure`
    pub production: bool,
    pub cookie_expire_days: i64,
    pub cors_origins: Vec<String>,
    /// Upper bound for any request body
    pub body_limit: usize,
    pub security_headers: SecurityHeadersConfig,
    /// Origin used for links sent by mail, never taken from request headers
    pub public_url: String,
}

impl HttpSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            production: config.server.is_production(),
            cookie_expire_days: config.jwt.cookie_expire_days,
            cors_origins: config.server.cors_origins.clone(),
            body_limit: config
                .server
                .max_request_size
                .max(config.upload.max_file_size + MULTIPART_OVERHEAD),
            security_headers: config.security.headers.clone(),
            public_url: config.server.public_url.clone(),
        }
    }
}

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub restaurant_service: Arc<RestaurantService>,
    pub offering_service: Arc<OfferingService>,
    pub review_service: Arc<ReviewService>,
    pub jwt_service: Arc<JwtService>,
    pub store: Arc<dyn Store>,
    pub settings: Arc<HttpSettings>,
}

impl AppState {
    /// Wire every service on top of the store and upstream collaborators
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn Store>,
        geocoder: Arc<dyn Geocoder>,
        mailer: Arc<dyn Mailer>,
        photos: Arc<dyn PhotoStore>,
    ) -> AppResult<Self> {
        let templates = Arc::new(EmailTemplates::new(APP_NAME)?);
        let jwt_service = JwtService::from_config(&config.jwt, &config.security);
        let user_service = UserService::with_bcrypt_cost(store.clone(), config.security.bcrypt_cost);

        let auth_service = AuthService::new(
            store.clone(),
            user_service.clone(),
            jwt_service.clone(),
            mailer,
            templates,
            config.upstream_timeout,
        );
        let restaurant_service = RestaurantService::new(
            store.clone(),
            geocoder,
            photos,
            config.upstream_timeout,
            config.upload.max_file_size,
        );

        Ok(Self {
            auth_service: Arc::new(auth_service),
            user_service: Arc::new(user_service),
            restaurant_service: Arc::new(restaurant_service),
            offering_service: Arc::new(OfferingService::new(store.clone())),
            review_service: Arc::new(ReviewService::new(store.clone())),
            jwt_service: Arc::new(jwt_service),
            store,
            settings: Arc::new(HttpSettings::from_config(config)),
        })
    }
}

/// Standard success response wrapper
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            count: None,
            data,
        }
    }
}

impl<T> SuccessResponse<Vec<T>> {
    /// Collection response carrying the number of items
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            count: Some(data.len()),
            data,
        }
    }
}

/// Empty `data` object answered by deletes
#[derive(Debug, Serialize)]
pub struct Empty {}

/// Response carrying a freshly issued session token
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

/// JSON body extractor whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

/// Health check endpoint
pub async fn health_check(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<HealthCheckResponse>>> {
    state.store.ping().await?;

    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        version: VERSION.to_string(),
    };

    Ok(Json(SuccessResponse::new(response)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_response_creation() {
        let response = SuccessResponse::new("test data");
        assert!(response.success);
        assert_eq!(response.data, "test data");

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("count").is_none());
    }

    #[test]
    fn test_list_response_counts_items() {
        let response = SuccessResponse::list(vec![1, 2, 3]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["count"], 3);
        assert_eq!(json["data"], serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn test_empty_serializes_as_object() {
        let json = serde_json::to_value(SuccessResponse::new(Empty {})).unwrap();
        assert_eq!(json["data"], serde_json::json!({}));
    }
}
