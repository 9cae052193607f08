//! Geocoding Service
//!
//! Resolves free-form addresses and zipcodes to coordinates plus a structured
//! address. The MapQuest implementation talks to the provider's HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::config::GeocoderConfig;
use crate::models::{GeometryType, Location};
use crate::utils::error::{AppError, AppResult};

/// One geocoding match
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    pub latitude: f64,
    pub longitude: f64,
    pub formatted_address: String,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
}

impl GeocodedAddress {
    pub fn into_location(self) -> Location {
        Location {
            geometry: GeometryType::Point,
            coordinates: [self.longitude, self.latitude],
            formatted_address: self.formatted_address,
            street: self.street,
            zipcode: self.zipcode,
            country: self.country,
            city: self.city,
        }
    }
}

/// Address resolution seam
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Matches for the query, best first; empty when nothing matched
    async fn geocode(&self, query: &str) -> AppResult<Vec<GeocodedAddress>>;
}

#[derive(Debug, Deserialize)]
struct MapQuestResponse {
    #[serde(default)]
    results: Vec<MapQuestResult>,
}

#[derive(Debug, Deserialize)]
struct MapQuestResult {
    #[serde(default)]
    locations: Vec<MapQuestLocation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MapQuestLocation {
    lat_lng: MapQuestLatLng,
    #[serde(default)]
    street: String,
    #[serde(default)]
    postal_code: String,
    /// Country code
    #[serde(default, rename = "adminArea1")]
    admin_area1: String,
    /// State
    #[serde(default, rename = "adminArea3")]
    admin_area3: String,
    /// City
    #[serde(default, rename = "adminArea5")]
    admin_area5: String,
}

#[derive(Debug, Deserialize)]
struct MapQuestLatLng {
    lat: f64,
    lng: f64,
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

impl From<MapQuestLocation> for GeocodedAddress {
    fn from(location: MapQuestLocation) -> Self {
        let street = non_empty(location.street);
        let city = non_empty(location.admin_area5);
        let state = non_empty(location.admin_area3);
        let zipcode = non_empty(location.postal_code);
        let country = non_empty(location.admin_area1);

        let region = [state.as_deref(), zipcode.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        let formatted_address = [
            street.as_deref(),
            city.as_deref(),
            Some(region.as_str()).filter(|r| !r.is_empty()),
            country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ");

        Self {
            latitude: location.lat_lng.lat,
            longitude: location.lat_lng.lng,
            formatted_address,
            street,
            city,
            state,
            zipcode,
            country,
        }
    }
}

/// Geocoder backed by the MapQuest geocoding API
pub struct MapQuestGeocoder {
    http_client: HttpClient,
    base_url: String,
    api_key: String,
}

impl MapQuestGeocoder {
    pub fn new(config: &GeocoderConfig, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build().map_err(|e| {
            AppError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            http_client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Geocoder for MapQuestGeocoder {
    async fn geocode(&self, query: &str) -> AppResult<Vec<GeocodedAddress>> {
        debug!("Geocoding '{}'", query);

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("location", query)])
            .send()
            .await
            .map_err(|e| {
                error!("Geocoder request failed: {}", e);
                AppError::UpstreamFailure("Geocoder request failed".to_string())
            })?;

        if !response.status().is_success() {
            error!("Geocoder returned status {}", response.status());
            return Err(AppError::UpstreamFailure(format!(
                "Geocoder returned error: {}",
                response.status()
            )));
        }

        let body: MapQuestResponse = response.json().await.map_err(|e| {
            error!("Failed to parse geocoder response: {}", e);
            AppError::UpstreamFailure("Invalid geocoder response".to_string())
        })?;

        Ok(body
            .results
            .into_iter()
            .flat_map(|result| result.locations)
            .map(GeocodedAddress::from)
            .collect())
    }
}
