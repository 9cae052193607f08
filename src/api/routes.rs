//! API Route Definitions
//!
//! All routes are mounted under `/api/v1`. Each resource is split into a
//! public router and a protected one; protected routes run
//! `auth_middleware` first and then, where the route is restricted to a role
//! set, `require_roles`.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use log::warn;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use super::auth_handlers::*;
use super::handlers::{health_check, AppState};
use super::middleware::{auth_middleware, require_roles, ADMIN_ROLES, PUBLISHER_ROLES};
use super::offering_handlers::*;
use super::restaurant_handlers::*;
use super::review_handlers::*;
use super::security_middleware::security_headers_middleware;
use super::user_handlers::*;

/// Prefix every route is mounted under
pub const API_PREFIX: &str = "/api/v1";

/// Authentication routes, including admin account management
pub fn auth_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/forgotpassword", post(forgot_password))
        .route("/auth/resetpassword/{token}", post(reset_password));

    let session = Router::new()
        .route("/auth/logout", get(logout))
        .route("/auth/me", get(me))
        .route("/auth/updatedetails", put(update_details))
        .route("/auth/updatepassword", put(update_password))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let admin = Router::new()
        .route("/auth/users", get(list_users).post(create_user))
        .route(
            "/auth/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route_layer(from_fn_with_state(ADMIN_ROLES, require_roles))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    public.merge(session).merge(admin)
}

/// Restaurant routes with their nested services and reviews
pub fn restaurant_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/restaurants", get(list_restaurants))
        .route("/restaurants/{id}", get(get_restaurant))
        .route(
            "/restaurants/radius/{zipcode}/{distance}",
            get(restaurants_in_radius),
        )
        .route("/restaurants/{id}/services", get(list_restaurant_offerings))
        .route("/restaurants/{id}/reviews", get(list_restaurant_reviews))
        .route("/services", get(list_offerings))
        .route("/services/{id}", get(get_offering))
        .route("/reviews", get(list_reviews))
        .route("/reviews/{id}", get(get_review));

    let publisher = Router::new()
        .route("/restaurants", post(create_restaurant))
        .route(
            "/restaurants/{id}",
            put(update_restaurant).delete(delete_restaurant),
        )
        .route("/restaurants/{id}/photo", put(upload_photo))
        .route("/restaurants/{id}/services", post(create_offering))
        .route(
            "/services/{id}",
            put(update_offering).delete(delete_offering),
        )
        .route_layer(from_fn_with_state(PUBLISHER_ROLES, require_roles))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let reviewer = Router::new()
        .route("/restaurants/{id}/reviews", post(create_review))
        .route("/reviews/{id}", put(update_review).delete(delete_review))
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    public.merge(publisher).merge(reviewer)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Build the complete application router
pub fn build_router(state: AppState) -> Router {
    let settings = state.settings.clone();

    let api = Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes(&state))
        .merge(restaurant_routes(&state));

    Router::new()
        .nest(API_PREFIX, api)
        .with_state(state)
        .layer(from_fn_with_state(
            Arc::new(settings.security_headers.clone()),
            security_headers_middleware,
        ))
        .layer(RequestBodyLimitLayer::new(settings.body_limit))
        .layer(cors_layer(&settings.cors_origins))
        .layer(TraceLayer::new_for_http())
}
