//! Service Offering Management
//!
//! Offerings are attached to a restaurant by its owner (or an admin) and can
//! afterwards be modified by their creator or an admin.

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateOfferingRequest, CurrentUser, ServiceOffering, UpdateOfferingRequest};
use crate::service::ensure_owner;
use crate::service::restaurant::restaurant_not_found;
use crate::store::{NewOffering, OfferingChanges, Store};
use crate::utils::error::{AppError, AppResult};

fn offering_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Service not found with id of {}", id))
}

#[derive(Clone)]
pub struct OfferingService {
    store: Arc<dyn Store>,
}

impl OfferingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// All offerings, or those of one existing restaurant
    pub async fn list(&self, restaurant: Option<Uuid>) -> AppResult<Vec<ServiceOffering>> {
        if let Some(restaurant_id) = restaurant {
            if self.store.find_restaurant(restaurant_id).await?.is_none() {
                return Err(restaurant_not_found(restaurant_id));
            }
        }
        Ok(self.store.list_offerings(restaurant).await?)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<ServiceOffering> {
        self.store
            .find_offering(id)
            .await?
            .ok_or_else(|| offering_not_found(id))
    }

    pub async fn create(
        &self,
        caller: &CurrentUser,
        restaurant_id: Uuid,
        request: CreateOfferingRequest,
    ) -> AppResult<ServiceOffering> {
        let restaurant = self
            .store
            .find_restaurant(restaurant_id)
            .await?
            .ok_or_else(|| restaurant_not_found(restaurant_id))?;
        ensure_owner(caller, restaurant.user, "restaurant")?;
        request.validate()?;

        Ok(self
            .store
            .insert_offering(NewOffering {
                description: request.description.trim().to_string(),
                service_type: request.service_type.trim().to_string(),
                events_booking: request.events_booking,
                vegan_menu: request.vegan_menu,
                booking_required: request.booking_required,
                kids_friendly: request.kids_friendly,
                seat_capacity: request.seat_capacity,
                restaurant: restaurant_id,
                user: caller.id,
            })
            .await?)
    }

    pub async fn update(
        &self,
        caller: &CurrentUser,
        id: Uuid,
        request: UpdateOfferingRequest,
    ) -> AppResult<ServiceOffering> {
        let existing = self.get(id).await?;
        ensure_owner(caller, existing.user, "service")?;
        request.validate()?;

        let changes = OfferingChanges {
            description: request.description.map(|d| d.trim().to_string()),
            service_type: request.service_type.map(|s| s.trim().to_string()),
            events_booking: request.events_booking,
            vegan_menu: request.vegan_menu,
            booking_required: request.booking_required,
            kids_friendly: request.kids_friendly,
            seat_capacity: request.seat_capacity,
        };

        self.store
            .update_offering(id, changes)
            .await?
            .ok_or_else(|| offering_not_found(id))
    }

    pub async fn delete(&self, caller: &CurrentUser, id: Uuid) -> AppResult<()> {
        let existing = self.get(id).await?;
        ensure_owner(caller, existing.user, "service")?;

        if !self.store.delete_offering(id).await? {
            return Err(offering_not_found(id));
        }
        Ok(())
    }
}
