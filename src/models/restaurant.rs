//! Restaurant Model
//!
//! Restaurant listings and their derived location.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Photo reference used until an image is uploaded
pub const NO_PHOTO: &str = "no-photo";

/// Cuisines a restaurant may list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cuisine {
    Italian,
    Chinese,
    Japanese,
    German,
    Russian,
    Indian,
    Korean,
    French,
    Spanish,
    American,
}

impl Cuisine {
    pub const ALL: [Cuisine; 10] = [
        Cuisine::Italian,
        Cuisine::Chinese,
        Cuisine::Japanese,
        Cuisine::German,
        Cuisine::Russian,
        Cuisine::Indian,
        Cuisine::Korean,
        Cuisine::French,
        Cuisine::Spanish,
        Cuisine::American,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cuisine::Italian => "Italian",
            Cuisine::Chinese => "Chinese",
            Cuisine::Japanese => "Japanese",
            Cuisine::German => "German",
            Cuisine::Russian => "Russian",
            Cuisine::Indian => "Indian",
            Cuisine::Korean => "Korean",
            Cuisine::French => "French",
            Cuisine::Spanish => "Spanish",
            Cuisine::American => "American",
        }
    }
}

impl fmt::Display for Cuisine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cuisine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Cuisine::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown cuisine '{}'", s))
    }
}

/// GeoJSON geometry type; only points are produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeometryType {
    #[default]
    Point,
}

/// Geocoded location stored in place of the raw address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[serde(rename = "type")]
    pub geometry: GeometryType,

    /// `[longitude, latitude]`, GeoJSON order
    pub coordinates: [f64; 2],

    pub formatted_address: String,
    pub street: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
}

impl Location {
    pub fn longitude(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates[1]
    }
}

/// Restaurant listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Location,
    pub cuisines: Vec<Cuisine>,
    pub delivery: bool,

    /// Mean review rating; `None` while the restaurant has no reviews
    pub average_rating: Option<f64>,

    pub average_bill: Option<f64>,
    pub photo: String,

    /// Owning user
    pub user: Uuid,

    pub created_at: DateTime<Utc>,
}

/// Great-circle distance in kilometres on a sphere of the given radius
pub fn great_circle_distance_km(
    (lng1, lat1): (f64, f64),
    (lng2, lat2): (f64, f64),
    earth_radius_km: f64,
) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * earth_radius_km * a.sqrt().asin()
}
