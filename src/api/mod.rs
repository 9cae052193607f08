//! API Layer
//!
//! HTTP API endpoints and request handling for the restaurant directory.

pub mod auth_handlers;
pub mod handlers;
pub mod middleware;
pub mod offering_handlers;
pub mod restaurant_handlers;
pub mod review_handlers;
pub mod routes;
pub mod security_middleware;
pub mod user_handlers;

// Re-export commonly used types
pub use handlers::{AppJson, AppState, HttpSettings, SuccessResponse};
pub use middleware::{auth_middleware, require_roles, AuthUser};
pub use routes::{build_router, API_PREFIX};
