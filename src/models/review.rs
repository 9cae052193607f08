//! Review Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's review of a restaurant; at most one per (restaurant, user)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub title: String,
    pub text: String,

    /// Integer score from 1 to 10
    pub rating: i32,

    pub restaurant: Uuid,
    pub user: Uuid,
    pub created_at: DateTime<Utc>,
}
