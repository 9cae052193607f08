//! JWT Authentication Service
//!
//! Issues and verifies signed session tokens and mints one-time password
//! reset tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::config::{JwtConfig, SecurityConfig};
use crate::models::{ResetToken, SessionClaims, SessionToken};
use crate::utils::error::{AppError, AppResult};
use crate::utils::security::{generate_secure_token, hash_sensitive_data, RESET_TOKEN_LENGTH};

/// Token service for session and reset tokens
#[derive(Clone)]
pub struct JwtService {
    /// HS256 signing secret
    secret: String,
    /// Session token lifetime
    token_expires_in: Duration,
    /// Reset token lifetime (default: 10 minutes)
    reset_token_expires_in: Duration,
}

impl JwtService {
    /// Create a new JWT service instance
    pub fn new(secret: String, token_expires_in: Duration) -> Self {
        Self {
            secret,
            token_expires_in,
            reset_token_expires_in: Duration::minutes(10),
        }
    }

    /// Create a JWT service from the loaded configuration
    pub fn from_config(jwt: &JwtConfig, security: &SecurityConfig) -> Self {
        Self {
            secret: jwt.secret.clone(),
            token_expires_in: Duration::hours(jwt.expires_hours),
            reset_token_expires_in: Duration::minutes(security.reset_token_expires_minutes),
        }
    }

    /// Sign a session token for the user
    pub fn issue_session_token(&self, user_id: Uuid) -> AppResult<SessionToken> {
        let now = Utc::now();
        let expires_at = now + self.token_expires_in;
        let claims = SessionClaims::new(user_id, expires_at, now);

        let header = Header::new(Algorithm::HS256);
        let encoding_key = EncodingKey::from_secret(self.secret.as_ref());
        let token = encode(&header, &claims, &encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))?;

        Ok(SessionToken { token, expires_at })
    }

    /// Verify signature and expiry, returning the subject user id
    pub fn verify_session_token(&self, token: &str) -> AppResult<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let decoding_key = DecodingKey::from_secret(self.secret.as_ref());
        let claims = decode::<SessionClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| AppError::InvalidToken(e.to_string()))?;

        Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::InvalidToken("Invalid user ID in token".into()))
    }

    /// Mint a reset token; only its hash and expiry are meant to be stored
    pub fn generate_reset_token(&self) -> ResetToken {
        let raw = generate_secure_token(RESET_TOKEN_LENGTH);
        let hash = Self::hash_reset_token(&raw);

        ResetToken {
            raw,
            hash,
            expires_at: Utc::now() + self.reset_token_expires_in,
        }
    }

    /// Digest under which a raw reset token is stored
    pub fn hash_reset_token(raw: &str) -> String {
        hash_sensitive_data(raw)
    }

    pub fn reset_token_expires_in(&self) -> Duration {
        self.reset_token_expires_in
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new("test_secret_key".to_string(), Duration::hours(1))
    }

    #[test]
    fn test_session_token_round_trip() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let token = service.issue_session_token(user_id).unwrap();
        assert!(token.expires_at > Utc::now());
        assert_eq!(service.verify_session_token(&token.token).unwrap(), user_id);
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let service = create_test_service();
        let other = JwtService::new("another_secret".to_string(), Duration::hours(1));

        let token = other.issue_session_token(Uuid::new_v4()).unwrap();
        assert!(matches!(
            service.verify_session_token(&token.token),
            Err(AppError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new("test_secret_key".to_string(), Duration::hours(-1));
        let token = service.issue_session_token(Uuid::new_v4()).unwrap();

        assert!(service.verify_session_token(&token.token).is_err());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let service = create_test_service();
        assert!(service.verify_session_token("not.a.jwt").is_err());
    }

    #[test]
    fn test_reset_token_hash() {
        let service = create_test_service();
        let token = service.generate_reset_token();

        assert_eq!(token.raw.len(), RESET_TOKEN_LENGTH);
        assert_eq!(token.hash, JwtService::hash_reset_token(&token.raw));
        assert_ne!(token.hash, token.raw);
        assert!(token.expires_at <= Utc::now() + Duration::minutes(10));
    }
}
