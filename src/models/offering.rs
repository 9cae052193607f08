//! Service Offering Model
//!
//! Amenities a restaurant advertises (booking, vegan menu, events...). Exposed
//! under `/services` in the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceOffering {
    pub id: Uuid,
    pub description: String,
    pub service_type: String,
    pub events_booking: bool,
    pub vegan_menu: bool,
    pub booking_required: bool,
    pub kids_friendly: bool,
    pub seat_capacity: Option<i32>,

    /// Restaurant the offering belongs to
    pub restaurant: Uuid,

    /// User who created the offering
    pub user: Uuid,

    pub created_at: DateTime<Utc>,
}
