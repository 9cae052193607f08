//! Authentication Handlers
//!
//! Registration, login and logout, password recovery and the caller's own
//! profile. Every flow that issues a session token answers with the token in
//! the body and in the HTTP-only `token` cookie.

use axum::{
    extract::{Path, State},
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};

use super::handlers::{AppJson, AppState, Empty, HttpSettings, SuccessResponse, TokenResponse};
use super::middleware::AuthUser;
use crate::models::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdateDetailsRequest, UpdatePasswordRequest, User,
};
use crate::service::AuthOutcome;
use crate::utils::error::AppResult;

/// Name of the session cookie
pub const TOKEN_COOKIE: &str = "token";

/// Session cookie carrying a freshly issued token
pub fn session_cookie(settings: &HttpSettings, token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(settings.production)
        .max_age(time::Duration::days(settings.cookie_expire_days))
        .build()
}

/// Cookie overwriting the session cookie on logout
pub fn cleared_cookie() -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, "none"))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::ZERO)
        .build()
}

fn token_response(
    state: &AppState,
    jar: CookieJar,
    outcome: AuthOutcome,
) -> (CookieJar, Json<TokenResponse>) {
    let token = outcome.token.token;
    let jar = jar.add(session_cookie(&state.settings, token.clone()));
    (
        jar,
        Json(TokenResponse {
            success: true,
            token,
        }),
    )
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(request): AppJson<RegisterRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let outcome = state.auth_service.register(request).await?;
    Ok(token_response(&state, jar, outcome))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(request): AppJson<LoginRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let outcome = state.auth_service.login(request).await?;
    Ok(token_response(&state, jar, outcome))
}

/// GET /auth/logout
pub async fn logout(
    jar: CookieJar,
    AuthUser(_caller): AuthUser,
) -> (CookieJar, Json<SuccessResponse<Empty>>) {
    (
        jar.add(cleared_cookie()),
        Json(SuccessResponse::new(Empty {})),
    )
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> AppResult<Json<SuccessResponse<User>>> {
    let user = state.auth_service.me(caller.id).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// POST /auth/forgotpassword
///
/// The mailed link is built from the configured public URL.
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ForgotPasswordRequest>,
) -> AppResult<Json<SuccessResponse<&'static str>>> {
    state
        .auth_service
        .forgot_password(&request.email, &state.settings.public_url)
        .await?;
    Ok(Json(SuccessResponse::new("Email sent")))
}

/// POST /auth/resetpassword/{token}
pub async fn reset_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(token): Path<String>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let outcome = state.auth_service.reset_password(&token, request).await?;
    Ok(token_response(&state, jar, outcome))
}

/// PUT /auth/updatedetails
pub async fn update_details(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppJson(request): AppJson<UpdateDetailsRequest>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let user = state.user_service.update_details(caller.id, request).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// PUT /auth/updatepassword
pub async fn update_password(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthUser(caller): AuthUser,
    AppJson(request): AppJson<UpdatePasswordRequest>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let outcome = state
        .auth_service
        .update_password(caller.id, request)
        .await?;
    Ok(token_response(&state, jar, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SecurityHeadersConfig;

    fn settings(production: bool) -> HttpSettings {
        HttpSettings {
            production,
            cookie_expire_days: 30,
            cors_origins: vec!["*".to_string()],
            body_limit: 1024,
            security_headers: SecurityHeadersConfig::default(),
            public_url: "http://localhost:5000".to_string(),
        }
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie(&settings(false), "abc".to_string());
        assert_eq!(cookie.name(), "token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_ne!(cookie.secure(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(30)));

        let cookie = session_cookie(&settings(true), "abc".to_string());
        assert_eq!(cookie.secure(), Some(true));
    }

    #[test]
    fn test_cleared_cookie_expires_immediately() {
        let cookie = cleared_cookie();
        assert_eq!(cookie.value(), "none");
        assert_eq!(cookie.max_age(), Some(time::Duration::ZERO));
    }
}
