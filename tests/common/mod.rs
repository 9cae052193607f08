//! Shared test harness: the full router over the in-memory store with fake
//! geocoder, mailer and photo store.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

use restaurant_directory::{
    api::{build_router, AppState, API_PREFIX},
    config::{
        AppConfig, GeocoderConfig, JwtConfig, SecurityConfig, SecurityHeadersConfig,
        ServerConfig, UploadConfig,
    },
    database::DatabaseConfig,
    models::{
        CreateUserRequest, Restaurant, Review, Role, ServiceOffering, User, UserCredentials,
    },
    service::{GeocodedAddress, Geocoder, MailMessage, Mailer, PhotoStore},
    store::{
        MemoryStore, NewOffering, NewRestaurant, NewReview, NewUser, OfferingChanges,
        OfferingStore, RestaurantChanges, RestaurantStore, ReviewChanges, ReviewStore, Store,
        StoreError, StoreResult, UserChanges, UserStore,
    },
    utils::error::{AppError, AppResult},
};

pub const PASSWORD: &str = "secret1";
pub const PUBLIC_URL: &str = "http://localhost:5000";
pub const MAX_PHOTO_SIZE: usize = 2048;

/// What the fake geocoder answers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeocoderMode {
    Found,
    Empty,
    Failing,
    /// Never answers
    Hanging,
}

/// Geocoder resolving a few known cities; anything else lands in Boston
pub struct FakeGeocoder {
    mode: Mutex<GeocoderMode>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(GeocoderMode::Found),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_mode(&self, mode: GeocoderMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn address(city: &str, zipcode: &str, latitude: f64, longitude: f64) -> GeocodedAddress {
    GeocodedAddress {
        latitude,
        longitude,
        formatted_address: format!("1 Main St, {}, {}, US", city, zipcode),
        street: Some("1 Main St".to_string()),
        city: Some(city.to_string()),
        state: None,
        zipcode: Some(zipcode.to_string()),
        country: Some("US".to_string()),
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, query: &str) -> AppResult<Vec<GeocodedAddress>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mode = *self.mode.lock().unwrap();
        match mode {
            GeocoderMode::Failing => Err(AppError::UpstreamFailure(
                "geocoder unavailable".to_string(),
            )),
            GeocoderMode::Empty => Ok(Vec::new()),
            GeocoderMode::Hanging => std::future::pending().await,
            GeocoderMode::Found => {
                let found = if query.contains("Chicago") {
                    address("Chicago", "60601", 41.8853, -87.6216)
                } else if query.contains("Denver") {
                    address("Denver", "80202", 39.7527, -104.9992)
                } else {
                    address("Boston", "02118", 42.3398, -71.0726)
                };
                Ok(vec![found])
            }
        }
    }
}

/// Mailer that records every message, or fails on demand
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
    failing: AtomicBool,
    hanging: AtomicBool,
}

impl RecordingMailer {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Make every send wait forever
    pub fn set_hanging(&self, hanging: bool) {
        self.hanging.store(hanging, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Raw reset token from the most recent reset link
    pub fn last_reset_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let text = &sent.last()?.text;
        let start = text.find("/resetpassword/")? + "/resetpassword/".len();
        Some(
            text[start..]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric())
                .collect(),
        )
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: MailMessage) -> AppResult<()> {
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::UpstreamFailure("SMTP refused".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

/// Photo store keeping files in memory
#[derive(Default)]
pub struct MemoryPhotoStore {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryPhotoStore {
    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl PhotoStore for MemoryPhotoStore {
    async fn save(&self, file_name: &str, bytes: &[u8]) -> AppResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Memory store whose rating recompute always fails
#[derive(Default)]
pub struct FailingRatingsStore {
    inner: MemoryStore,
}

#[async_trait]
impl UserStore for FailingRatingsStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        self.inner.insert_user(user).await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.inner.find_user(id).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.inner.list_users().await
    }

    async fn find_credentials(&self, id: Uuid) -> StoreResult<Option<UserCredentials>> {
        self.inner.find_credentials(id).await
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<UserCredentials>> {
        self.inner.find_credentials_by_email(email).await
    }

    async fn find_credentials_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserCredentials>> {
        self.inner.find_credentials_by_reset_token(token_hash, now).await
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        self.inner.update_user(id, changes).await
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        self.inner.set_password_hash(id, password_hash).await
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<(String, DateTime<Utc>)>,
    ) -> StoreResult<bool> {
        self.inner.set_reset_token(id, token).await
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: &str,
    ) -> StoreResult<bool> {
        self.inner
            .consume_reset_token(id, token_hash, password_hash)
            .await
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        self.inner.delete_user(id).await
    }
}

#[async_trait]
impl RestaurantStore for FailingRatingsStore {
    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> StoreResult<Restaurant> {
        self.inner.insert_restaurant(restaurant).await
    }

    async fn find_restaurant(&self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        self.inner.find_restaurant(id).await
    }

    async fn list_restaurants(&self) -> StoreResult<Vec<Restaurant>> {
        self.inner.list_restaurants().await
    }

    async fn restaurants_within(
        &self,
        center: (f64, f64),
        radius_km: f64,
        earth_radius_km: f64,
    ) -> StoreResult<Vec<Restaurant>> {
        self.inner
            .restaurants_within(center, radius_km, earth_radius_km)
            .await
    }

    async fn update_restaurant(
        &self,
        id: Uuid,
        changes: RestaurantChanges,
    ) -> StoreResult<Option<Restaurant>> {
        self.inner.update_restaurant(id, changes).await
    }

    async fn set_restaurant_photo(&self, id: Uuid, photo: &str) -> StoreResult<bool> {
        self.inner.set_restaurant_photo(id, photo).await
    }

    async fn recompute_average_rating(&self, _id: Uuid) -> StoreResult<Option<f64>> {
        Err(StoreError::Corrupt("rating aggregation unavailable".to_string()))
    }

    async fn delete_restaurant_cascade(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_restaurant_cascade(id).await
    }
}

#[async_trait]
impl OfferingStore for FailingRatingsStore {
    async fn insert_offering(&self, offering: NewOffering) -> StoreResult<ServiceOffering> {
        self.inner.insert_offering(offering).await
    }

    async fn find_offering(&self, id: Uuid) -> StoreResult<Option<ServiceOffering>> {
        self.inner.find_offering(id).await
    }

    async fn list_offerings(&self, restaurant: Option<Uuid>) -> StoreResult<Vec<ServiceOffering>> {
        self.inner.list_offerings(restaurant).await
    }

    async fn update_offering(
        &self,
        id: Uuid,
        changes: OfferingChanges,
    ) -> StoreResult<Option<ServiceOffering>> {
        self.inner.update_offering(id, changes).await
    }

    async fn delete_offering(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_offering(id).await
    }
}

#[async_trait]
impl ReviewStore for FailingRatingsStore {
    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        self.inner.insert_review(review).await
    }

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        self.inner.find_review(id).await
    }

    async fn list_reviews(&self, restaurant: Option<Uuid>) -> StoreResult<Vec<Review>> {
        self.inner.list_reviews(restaurant).await
    }

    async fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChanges,
    ) -> StoreResult<Option<Review>> {
        self.inner.update_review(id, changes).await
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        self.inner.delete_review(id).await
    }
}

#[async_trait]
impl Store for FailingRatingsStore {
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }

    async fn clear(&self) -> StoreResult<()> {
        self.inner.clear().await
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            environment: "test".to_string(),
            log_level: "info".to_string(),
            cors_origins: vec!["*".to_string()],
            max_request_size: 1024 * 1024,
            public_url: PUBLIC_URL.to_string(),
        },
        database: DatabaseConfig {
            url: "memory://".to_string(),
            ..DatabaseConfig::default()
        },
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            expires_hours: 1,
            cookie_expire_days: 30,
        },
        security: SecurityConfig {
            bcrypt_cost: 4,
            reset_token_expires_minutes: 10,
            headers: SecurityHeadersConfig::default(),
        },
        email: None,
        geocoder: GeocoderConfig {
            base_url: "http://localhost".to_string(),
            api_key: String::new(),
        },
        upload: UploadConfig {
            path: PathBuf::from("unused"),
            max_file_size: MAX_PHOTO_SIZE,
        },
        upstream_timeout: Duration::from_secs(2),
    }
}

/// Response with the JSON body decoded
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `Set-Cookie` header, if any
    pub fn cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }

    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<dyn Store>,
    pub geocoder: Arc<FakeGeocoder>,
    pub mailer: Arc<RecordingMailer>,
    pub photos: Arc<MemoryPhotoStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<dyn Store>) -> Self {
        let geocoder = Arc::new(FakeGeocoder::new());
        let mailer = Arc::new(RecordingMailer::default());
        let photos = Arc::new(MemoryPhotoStore::default());

        let state = AppState::new(
            &test_config(),
            store.clone(),
            geocoder.clone(),
            mailer.clone(),
            photos.clone(),
        )
        .unwrap();

        Self {
            router: build_router(state.clone()),
            state,
            store,
            geocoder,
            mailer,
            photos,
        }
    }

    pub async fn send_raw(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("{}{}", API_PREFIX, path))
            .header(header::HOST, "localhost:5000");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_raw(request).await
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, path, token, None).await
    }

    /// Register an account and return its session token
    pub async fn register(&self, name: &str, email: &str, role: &str) -> String {
        let response = self
            .post(
                "/auth/register",
                None,
                json!({ "name": name, "email": email, "password": PASSWORD, "role": role }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.post(
            "/auth/login",
            None,
            json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Provision an admin directly and sign in
    pub async fn admin(&self) -> String {
        self.state
            .user_service
            .create_user(CreateUserRequest {
                name: "Admin".to_string(),
                email: "admin@example.com".to_string(),
                password: PASSWORD.to_string(),
                role: Some(Role::Admin),
            })
            .await
            .unwrap();

        let response = self.login("admin@example.com", PASSWORD).await;
        response.body["token"].as_str().unwrap().to_string()
    }

    pub async fn user_id(&self, token: &str) -> String {
        let response = self.get("/auth/me", Some(token)).await;
        response.body["data"]["id"].as_str().unwrap().to_string()
    }

    /// Publish a restaurant and return its id
    pub async fn create_restaurant(&self, token: &str, name: &str, address: &str) -> String {
        let response = self
            .post("/restaurants", Some(token), restaurant_body(name, address))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["data"]["id"].as_str().unwrap().to_string()
    }
}

pub fn restaurant_body(name: &str, address: &str) -> Value {
    json!({
        "name": name,
        "description": "Neighbourhood kitchen",
        "website": "https://example.com",
        "phone": "(617) 555-0100",
        "email": "hello@example.com",
        "address": address,
        "cuisines": ["Italian", "French"],
        "delivery": true,
        "averageBill": 35.0
    })
}
