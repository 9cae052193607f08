//! Restaurant Directory Library
//!
//! A REST API for publishing restaurants, the services they offer and the
//! reviews diners leave for them. Accounts carry a role (`user`, `owner` or
//! `admin`) that decides what they may publish and modify.
//!
//! # Features
//!
//! - **Authentication**: bcrypt-hashed passwords, HS256 session tokens
//!   delivered in the body and an HTTP-only cookie, emailed single-use reset
//!   tokens
//! - **Restaurants**: slugs, geocoded locations, radius search and photo
//!   upload, at most one restaurant per owner
//! - **Services and reviews**: per-restaurant offerings and one review per
//!   user and restaurant, with the average rating kept in step
//! - **Storage**: PostgreSQL through SQLx with embedded migrations, or an
//!   in-process store for tests and local runs
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use restaurant_directory::{
//!     api::{build_router, AppState},
//!     service::{DisabledMailer, LocalPhotoStore, MapQuestGeocoder},
//!     AppConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let store = config.database.open_store().await?;
//!     let geocoder = MapQuestGeocoder::new(&config.geocoder, config.upstream_timeout)?;
//!
//!     let state = AppState::new(
//!         &config,
//!         store,
//!         Arc::new(geocoder),
//!         Arc::new(DisabledMailer),
//!         Arc::new(LocalPhotoStore::new(config.upload.path.clone())),
//!     )?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     axum::serve(listener, build_router(state)).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers, authentication and role middleware, routes
//! - **Service Layer**: Business rules, ownership checks and upstream seams
//!   (geocoder, mailer, photo store)
//! - **Store**: Persistence traits with PostgreSQL and in-memory backends
//! - **Models**: Data structures and request types
//! - **Utils**: Shared utilities for security, validation, and error handling

/// HTTP API layer with handlers and routing
pub mod api;

/// Configuration management for all service settings
pub mod config;

/// Database connection management and store selection
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Business logic services
pub mod service;

/// Persistence traits and backends
pub mod store;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{build_router, AppState};
pub use models::{
    CreateOfferingRequest, CreateRestaurantRequest, CreateReviewRequest, CreateUserRequest,
    CurrentUser, Cuisine, Location, RegisterRequest, Restaurant, Review, Role, ServiceOffering,
    User,
};
pub use service::{
    AuthService, JwtService, OfferingService, RestaurantService, ReviewService, UserService,
};
pub use store::{MemoryStore, PgStore, Store, StoreError};
pub use utils::error::{AppError, AppResult, ErrorResponse};

// Re-export database utilities for configuration
pub use database::{DatabaseConfig, DatabasePool};

// Re-export configuration system
pub use config::{env, AppConfig, EmailConfig, JwtConfig, SecurityConfig, ServerConfig};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name used in outbound mail
pub const APP_NAME: &str = "Restaurant Directory";
