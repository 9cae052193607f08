//! Restaurant Service
//!
//! Restaurant lifecycle: slug and geocoded location on create and update,
//! explicit cascade on delete, radius search and photo upload.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    CreateRestaurantRequest, CurrentUser, Location, Restaurant, UpdateRestaurantRequest,
};
use crate::service::{ensure_owner, Geocoder, PhotoStore};
use crate::store::{NewRestaurant, RestaurantChanges, Store};
use crate::utils::error::{AppError, AppResult};
use crate::utils::validation::slugify;

/// Earth radius used for radius searches, in kilometres
pub const EARTH_RADIUS_KM: f64 = 6378.0;

/// An uploaded photo as received from the client
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

pub(crate) fn restaurant_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Restaurant not found with id of {}", id))
}

#[derive(Clone)]
pub struct RestaurantService {
    store: Arc<dyn Store>,
    geocoder: Arc<dyn Geocoder>,
    photos: Arc<dyn PhotoStore>,
    upstream_timeout: Duration,
    max_photo_size: usize,
}

impl RestaurantService {
    pub fn new(
        store: Arc<dyn Store>,
        geocoder: Arc<dyn Geocoder>,
        photos: Arc<dyn PhotoStore>,
        upstream_timeout: Duration,
        max_photo_size: usize,
    ) -> Self {
        Self {
            store,
            geocoder,
            photos,
            upstream_timeout,
            max_photo_size,
        }
    }

    /// Geocode a query and take the first match
    async fn locate(&self, query: &str) -> AppResult<Location> {
        let results = match tokio::time::timeout(self.upstream_timeout, self.geocoder.geocode(query))
            .await
        {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                error!("Geocoding '{}' failed: {}", query, e);
                return Err(match e {
                    AppError::UpstreamFailure(_) => e,
                    other => AppError::UpstreamFailure(other.to_string()),
                });
            }
            Err(_) => {
                error!("Geocoding '{}' timed out", query);
                return Err(AppError::UpstreamFailure("Geocoder timed out".to_string()));
            }
        };

        results
            .into_iter()
            .next()
            .map(|address| address.into_location())
            .ok_or_else(|| AppError::Validation(format!("Could not geocode '{}'", query)))
    }

    pub async fn list(&self) -> AppResult<Vec<Restaurant>> {
        Ok(self.store.list_restaurants().await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Restaurant> {
        self.store
            .find_restaurant(id)
            .await?
            .ok_or_else(|| restaurant_not_found(id))
    }

    /// Publish a restaurant
    ///
    /// Non-admins publish for themselves and occupy their single restaurant
    /// slot. Admins may publish on behalf of another user without using that
    /// user's slot.
    pub async fn create(
        &self,
        caller: &CurrentUser,
        request: CreateRestaurantRequest,
    ) -> AppResult<Restaurant> {
        request.validate()?;

        let owner = match request.user {
            Some(owner) if caller.is_admin() => {
                if self.store.find_user(owner).await?.is_none() {
                    return Err(AppError::NotFound(format!(
                        "User not found with id of {}",
                        owner
                    )));
                }
                owner
            }
            _ => caller.id,
        };

        let name = request.name.trim().to_string();
        let location = self.locate(request.address.trim()).await?;

        let restaurant = self
            .store
            .insert_restaurant(NewRestaurant {
                slug: slugify(&name),
                name,
                description: request.description.trim().to_string(),
                website: request.website,
                phone: request.phone,
                email: request.email,
                location,
                cuisines: request.cuisines,
                delivery: request.delivery,
                average_bill: request.average_bill,
                user: owner,
                exclusive_owner: !caller.is_admin(),
            })
            .await?;

        info!("Restaurant {} published by {}", restaurant.id, caller.id);
        Ok(restaurant)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        request: UpdateRestaurantRequest,
    ) -> AppResult<Restaurant> {
        let existing = self.get(id).await?;
        ensure_owner(caller, existing.user, "restaurant")?;
        request.validate()?;

        let name = request.name.map(|n| n.trim().to_string());
        let location = match request.address.as_deref() {
            Some(address) => Some(self.locate(address.trim()).await?),
            None => None,
        };

        let changes = RestaurantChanges {
            slug: name.as_deref().map(slugify),
            name,
            description: request.description.map(|d| d.trim().to_string()),
            website: request.website,
            phone: request.phone,
            email: request.email,
            location,
            cuisines: request.cuisines,
            delivery: request.delivery,
            average_bill: request.average_bill,
        };

        self.store
            .update_restaurant(id, changes)
            .await?
            .ok_or_else(|| restaurant_not_found(id))
    }

    /// Delete the restaurant together with its services and reviews
    pub async fn delete(&self, caller: &CurrentUser, id: Uuid) -> AppResult<()> {
        let existing = self.get(id).await?;
        ensure_owner(caller, existing.user, "restaurant")?;

        if !self.store.delete_restaurant_cascade(id).await? {
            return Err(restaurant_not_found(id));
        }

        info!("Restaurant {} deleted by {}", id, caller.id);
        Ok(())
    }

    /// Restaurants within `distance_km` of the zipcode's location
    pub async fn within_radius(&self, zipcode: &str, distance_km: f64) -> AppResult<Vec<Restaurant>> {
        if !distance_km.is_finite() || distance_km <= 0.0 {
            return Err(AppError::Validation(
                "Distance must be a positive number".to_string(),
            ));
        }

        let center = self.locate(zipcode).await?;
        let restaurants = self
            .store
            .restaurants_within(
                (center.longitude(), center.latitude()),
                distance_km,
                EARTH_RADIUS_KM,
            )
            .await?;

        if restaurants.is_empty() {
            return Err(AppError::NotFound(format!(
                "No restaurants found within {} km",
                distance_km
            )));
        }

        Ok(restaurants)
    }

    /// Store an uploaded image as the restaurant's photo; returns the file name
    pub async fn upload_photo(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        upload: PhotoUpload,
    ) -> AppResult<String> {
        let existing = self.get(id).await?;
        ensure_owner(caller, existing.user, "restaurant")?;

        let is_image = upload
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("image"));
        if !is_image {
            return Err(AppError::Validation("Please upload an image file".to_string()));
        }

        if upload.bytes.len() > self.max_photo_size {
            return Err(AppError::Validation(format!(
                "Please upload an image less than {} bytes",
                self.max_photo_size
            )));
        }

        let extension = Path::new(&upload.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let file_name = format!("photo_{}{}", id, extension);

        self.photos.save(&file_name, &upload.bytes).await?;
        if !self.store.set_restaurant_photo(id, &file_name).await? {
            return Err(restaurant_not_found(id));
        }

        Ok(file_name)
    }
}
