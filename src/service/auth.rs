//! Authentication Flows
//!
//! Register, login, password reset and password change. Every successful
//! flow ends with a freshly signed session token.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use log::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CreateUserRequest, LoginRequest, RegisterRequest, ResetPasswordRequest, SessionToken,
    UpdatePasswordRequest, User,
};
use crate::service::{EmailTemplates, JwtService, Mailer, UserService};
use crate::store::Store;
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::normalize_email;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Authenticated user paired with their new session token
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: User,
    pub token: SessionToken,
}

/// Controller for the authentication state machine
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    users: UserService,
    jwt: JwtService,
    mailer: Arc<dyn Mailer>,
    templates: Arc<EmailTemplates>,
    upstream_timeout: Duration,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        users: UserService,
        jwt: JwtService,
        mailer: Arc<dyn Mailer>,
        templates: Arc<EmailTemplates>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            store,
            users,
            jwt,
            mailer,
            templates,
            upstream_timeout,
        }
    }

    fn issue(&self, user: User) -> AppResult<AuthOutcome> {
        let token = self.jwt.issue_session_token(user.id)?;
        Ok(AuthOutcome { user, token })
    }

    /// Self-registration as `user` or `owner`
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthOutcome> {
        request.validate()?;

        let role = request.role.unwrap_or_default();
        if !UserService::is_self_assignable(role) {
            return Err(AppError::Validation(
                "The admin role cannot be self-assigned".to_string(),
            ));
        }

        let user = self
            .users
            .create_user(CreateUserRequest {
                name: request.name,
                email: request.email,
                password: request.password,
                role: Some(role),
            })
            .await?;

        self.issue(user)
    }

    /// Unknown email and wrong password fail identically
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthOutcome> {
        request.validate()?;

        let Some(credentials) = self.users.find_credentials_by_email(&request.email).await? else {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        };

        if !self.users.verify_password(&credentials, &request.password)? {
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        self.issue(credentials.into())
    }

    /// Current user's profile
    pub async fn me(&self, user_id: Uuid) -> AppResult<User> {
        self.users.get_user(user_id).await
    }

    /// Store a reset token for the account and mail out the link
    ///
    /// `base_url` is the configured public origin of the API. When delivery
    /// fails the stored token is cleared again.
    pub async fn forgot_password(&self, email: &str, base_url: &str) -> AppResult<()> {
        let email = normalize_email(email);
        let credentials = self
            .users
            .find_credentials_by_email(&email)
            .await?
            .ok_or_else(|| AppError::NotFound("There is no user with that email".to_string()))?;

        let reset = self.jwt.generate_reset_token();
        self.store
            .set_reset_token(credentials.id, Some((reset.hash.clone(), reset.expires_at)))
            .await?;

        let reset_url = format!(
            "{}/api/v1/auth/resetpassword/{}",
            base_url.trim_end_matches('/'),
            reset.raw
        );
        let message = self.templates.password_reset(
            &credentials.email,
            &credentials.name,
            &reset_url,
            self.jwt.reset_token_expires_in().num_minutes(),
        )?;

        let delivery = tokio::time::timeout(self.upstream_timeout, self.mailer.send(message)).await;
        let failure = match delivery {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some("mail delivery timed out".to_string()),
        };

        if let Some(reason) = failure {
            warn!(
                "Reset email for user {} could not be sent ({}); clearing token",
                credentials.id, reason
            );
            self.store.set_reset_token(credentials.id, None).await?;
            return Err(AppError::UpstreamFailure(
                "Email could not be sent".to_string(),
            ));
        }

        info!("Password reset email sent to user {}", credentials.id);
        Ok(())
    }

    /// Exchange a valid reset token for a new password
    pub async fn reset_password(
        &self,
        raw_token: &str,
        request: ResetPasswordRequest,
    ) -> AppResult<AuthOutcome> {
        let token_hash = JwtService::hash_reset_token(raw_token);
        let credentials = self
            .store
            .find_credentials_by_reset_token(&token_hash, Utc::now())
            .await?
            .ok_or_else(|| AppError::InvalidToken("Invalid token".to_string()))?;

        request.validate()?;

        if self.users.verify_password(&credentials, &request.password)? {
            return Err(AppError::Validation(
                "New password must be different from the current password".to_string(),
            ));
        }

        let password_hash = self.users.hash(&request.password)?;
        if !self
            .store
            .consume_reset_token(credentials.id, &token_hash, &password_hash)
            .await?
        {
            return Err(AppError::InvalidToken("Invalid token".to_string()));
        }

        info!("Password reset completed for user {}", credentials.id);
        self.issue(credentials.into())
    }

    /// Change the password of a signed-in user
    pub async fn update_password(
        &self,
        user_id: Uuid,
        request: UpdatePasswordRequest,
    ) -> AppResult<AuthOutcome> {
        request.validate()?;

        let credentials = self.users.get_credentials(user_id).await?;
        if !self
            .users
            .verify_password(&credentials, &request.current_password)?
        {
            return Err(AppError::Unauthorized("Password is incorrect".to_string()));
        }

        if request.new_password == request.current_password {
            return Err(AppError::Validation(
                "New password must be different from the current password".to_string(),
            ));
        }

        self.users.set_password(user_id, &request.new_password).await?;
        self.issue(credentials.into())
    }
}
