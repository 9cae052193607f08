//! User Model
//!
//! Core user data structures and type definitions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Access role attached to every account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular account: may write reviews
    #[default]
    User,
    /// May publish and manage a single restaurant
    Owner,
    /// Unrestricted mutation rights across all resources
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Owner => "owner",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "owner" => Ok(Role::Owner),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// User representation for external API responses
///
/// This struct represents a user profile without the password hash or reset
/// token state. All datetime fields use UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier for the user
    pub id: Uuid,

    /// User's display name
    pub name: String,

    /// User's email address (unique, normalized)
    pub email: String,

    /// Access role
    pub role: Role,

    /// Timestamp when the user account was created
    pub created_at: DateTime<Utc>,
}

/// Stored user record including secrets
///
/// Only returned by lookups that explicitly ask for the secret fields. It's
/// never serialized into API responses.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,

    /// bcrypt hashed password
    pub password_hash: String,

    /// SHA-256 hex digest of the outstanding reset token
    pub reset_password_token: Option<String>,

    /// Expiry of the outstanding reset token
    pub reset_password_expire: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl From<UserCredentials> for User {
    /// Strip the secret fields from a stored record
    fn from(credentials: UserCredentials) -> Self {
        User {
            id: credentials.id,
            name: credentials.name,
            email: credentials.email,
            role: credentials.role,
            created_at: credentials.created_at,
        }
    }
}
