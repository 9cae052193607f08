//! Authentication Middleware
//!
//! Middleware for session authentication and role authorization. Applied in
//! this order on protected routes: `auth_middleware` resolves the caller,
//! `require_roles` checks the caller's role against the route's role set.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use log::debug;

use super::handlers::AppState;
use crate::models::{CurrentUser, Role};
use crate::utils::error::AppError;

/// Roles allowed to publish and manage restaurants and their services
pub const PUBLISHER_ROLES: &[Role] = &[Role::Owner, Role::Admin];

/// Roles allowed on account administration routes
pub const ADMIN_ROLES: &[Role] = &[Role::Admin];

const NOT_AUTHORIZED: &str = "Not authorized to access this route";

/// Extension type for storing the authenticated caller in request extensions
#[derive(Debug, Clone)]
pub struct AuthUser(pub CurrentUser);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))
    }
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Authentication middleware that validates the session token
///
/// The token's subject must still exist; tokens of deleted accounts are
/// rejected like any other invalid token.
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;

    let user_id = state
        .jwt_service
        .verify_session_token(token)
        .map_err(|_| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;

    let user = match state.user_service.get_user(user_id).await {
        Ok(user) => user,
        Err(AppError::NotFound(_)) => {
            debug!("Session token for deleted user {}", user_id);
            return Err(AppError::Unauthorized(NOT_AUTHORIZED.to_string()));
        }
        Err(e) => return Err(e),
    };

    request.extensions_mut().insert(AuthUser(user.into()));
    Ok(next.run(request).await)
}

/// Role middleware; must run after `auth_middleware`
pub async fn require_roles(
    State(roles): State<&'static [Role]>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let caller = request
        .extensions()
        .get::<AuthUser>()
        .map(|auth_user| &auth_user.0)
        .ok_or_else(|| AppError::Unauthorized(NOT_AUTHORIZED.to_string()))?;

    if !roles.contains(&caller.role) {
        return Err(AppError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            caller.role
        )));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Method, StatusCode},
        middleware::from_fn_with_state,
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;
    use uuid::Uuid;

    async fn test_handler(AuthUser(caller): AuthUser) -> String {
        caller.name
    }

    fn caller(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            name: "Caller".to_string(),
            email: "caller@example.com".to_string(),
            role,
        }
    }

    /// Router that injects a fixed caller ahead of the role check
    fn role_router(role: Role) -> Router {
        let current = caller(role);
        Router::new()
            .route("/test", get(test_handler))
            .route_layer(from_fn_with_state(PUBLISHER_ROLES, require_roles))
            .layer(axum::middleware::from_fn(
                move |mut request: Request, next: Next| {
                    let current = current.clone();
                    async move {
                        request.extensions_mut().insert(AuthUser(current));
                        next.run(request).await
                    }
                },
            ))
    }

    async fn status_for(app: Router) -> StatusCode {
        let request = axum::http::Request::builder()
            .method(Method::GET)
            .uri("/test")
            .body(Body::empty())
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Basic abc".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(AUTHORIZATION, "Bearer abc.def".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[tokio::test]
    async fn test_role_gate_allows_listed_roles() {
        assert_eq!(status_for(role_router(Role::Owner)).await, StatusCode::OK);
        assert_eq!(status_for(role_router(Role::Admin)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_role_gate_rejects_other_roles() {
        assert_eq!(
            status_for(role_router(Role::User)).await,
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_role_gate_without_caller_is_unauthorized() {
        let app = Router::new()
            .route("/test", get(|| async { "OK" }))
            .route_layer(from_fn_with_state(ADMIN_ROLES, require_roles));

        assert_eq!(status_for(app).await, StatusCode::UNAUTHORIZED);
    }
}
