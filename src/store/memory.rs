//! In-Memory Store
//!
//! Process-local implementation of the store traits with the same uniqueness
//! semantics as the PostgreSQL schema. Selected with a `memory://` database
//! URL and used throughout the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    Constraint, NewOffering, NewRestaurant, NewReview, NewUser, OfferingChanges, OfferingStore,
    RestaurantChanges, RestaurantStore, ReviewChanges, ReviewStore, Store, StoreError,
    StoreResult, UserChanges, UserStore,
};
use crate::models::{
    great_circle_distance_km, Restaurant, Review, ServiceOffering, User, UserCredentials,
    NO_PHOTO,
};

struct RestaurantRecord {
    restaurant: Restaurant,
    exclusive_owner: Option<Uuid>,
}

/// Collections are kept in insertion order so listings are stable
#[derive(Default)]
struct Collections {
    users: Vec<UserCredentials>,
    restaurants: Vec<RestaurantRecord>,
    offerings: Vec<ServiceOffering>,
    reviews: Vec<Review>,
}

impl Collections {
    fn user_mut(&mut self, id: Uuid) -> Option<&mut UserCredentials> {
        self.users.iter_mut().find(|u| u.id == id)
    }

    fn restaurant_mut(&mut self, id: Uuid) -> Option<&mut Restaurant> {
        self.restaurants
            .iter_mut()
            .map(|r| &mut r.restaurant)
            .find(|r| r.id == id)
    }

    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn restaurant_name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.restaurants
            .iter()
            .any(|r| r.restaurant.name == name && Some(r.restaurant.id) != except)
    }

    /// Release the owner slot on promotion to admin; on demotion hand it to
    /// the oldest restaurant the user published, unless one already holds it.
    fn reconcile_owner_slot(&mut self, user: Uuid, was_admin: bool, is_admin: bool) {
        if is_admin && !was_admin {
            self.restaurants
                .iter_mut()
                .filter(|r| r.exclusive_owner == Some(user))
                .for_each(|r| r.exclusive_owner = None);
        } else if was_admin
            && !is_admin
            && !self.restaurants.iter().any(|r| r.exclusive_owner == Some(user))
        {
            if let Some(oldest) = self
                .restaurants
                .iter_mut()
                .find(|r| r.restaurant.user == user)
            {
                oldest.exclusive_owner = Some(user);
            }
        }
    }
}

/// Store holding every collection behind a single async lock
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut data = self.inner.write().await;
        if data.email_taken(&user.email, None) {
            return Err(StoreError::Duplicate(Constraint::UserEmail));
        }

        let credentials = UserCredentials {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            role: user.role,
            password_hash: user.password_hash,
            reset_password_token: None,
            reset_password_expire: None,
            created_at: Utc::now(),
        };
        data.users.push(credentials.clone());

        Ok(credentials.into())
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.find_credentials(id).await?.map(User::from))
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().cloned().map(User::from).collect())
    }

    async fn find_credentials(&self, id: Uuid) -> StoreResult<Option<UserCredentials>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> StoreResult<Option<UserCredentials>> {
        let data = self.inner.read().await;
        Ok(data.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_credentials_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserCredentials>> {
        let data = self.inner.read().await;
        Ok(data
            .users
            .iter()
            .find(|u| {
                u.reset_password_token.as_deref() == Some(token_hash)
                    && u.reset_password_expire.is_some_and(|expire| expire > now)
            })
            .cloned())
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>> {
        let mut data = self.inner.write().await;
        if let Some(email) = &changes.email {
            if data.email_taken(email, Some(id)) {
                return Err(StoreError::Duplicate(Constraint::UserEmail));
            }
        }

        let Some(user) = data.user_mut(id) else {
            return Ok(None);
        };
        let was_admin = user.role.is_admin();
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        let updated: User = user.clone().into();

        data.reconcile_owner_slot(id, was_admin, updated.role.is_admin());
        Ok(Some(updated))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        Ok(match data.user_mut(id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                true
            }
            None => false,
        })
    }

    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<(String, DateTime<Utc>)>,
    ) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        let Some(user) = data.user_mut(id) else {
            return Ok(false);
        };

        let (hash, expires_at) = token.unzip();
        user.reset_password_token = hash;
        user.reset_password_expire = expires_at;
        Ok(true)
    }

    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: &str,
    ) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        match data.user_mut(id) {
            Some(user) if user.reset_password_token.as_deref() == Some(token_hash) => {
                user.password_hash = password_hash.to_string();
                user.reset_password_token = None;
                user.reset_password_expire = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<Option<Vec<Uuid>>> {
        let mut data = self.inner.write().await;
        if !data.users.iter().any(|u| u.id == id) {
            return Ok(None);
        }
        if data
            .restaurants
            .iter()
            .any(|r| r.restaurant.user == id || r.exclusive_owner == Some(id))
        {
            return Err(StoreError::UserOwnsRestaurant);
        }

        let mut affected: Vec<Uuid> = data
            .reviews
            .iter()
            .filter(|r| r.user == id)
            .map(|r| r.restaurant)
            .collect();
        affected.sort();
        affected.dedup();

        data.reviews.retain(|r| r.user != id);
        data.offerings.retain(|o| o.user != id);
        data.users.retain(|u| u.id != id);

        Ok(Some(affected))
    }
}

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> StoreResult<Restaurant> {
        let mut data = self.inner.write().await;
        if data.restaurant_name_taken(&restaurant.name, None) {
            return Err(StoreError::Duplicate(Constraint::RestaurantName));
        }

        let exclusive_owner = restaurant.exclusive_owner.then_some(restaurant.user);
        if exclusive_owner.is_some()
            && data
                .restaurants
                .iter()
                .any(|r| r.exclusive_owner == exclusive_owner)
        {
            return Err(StoreError::Duplicate(Constraint::RestaurantOwner));
        }

        let created = Restaurant {
            id: Uuid::new_v4(),
            name: restaurant.name,
            slug: restaurant.slug,
            description: restaurant.description,
            website: restaurant.website,
            phone: restaurant.phone,
            email: restaurant.email,
            location: restaurant.location,
            cuisines: restaurant.cuisines,
            delivery: restaurant.delivery,
            average_rating: None,
            average_bill: restaurant.average_bill,
            photo: NO_PHOTO.to_string(),
            user: restaurant.user,
            created_at: Utc::now(),
        };
        data.restaurants.push(RestaurantRecord {
            restaurant: created.clone(),
            exclusive_owner,
        });

        Ok(created)
    }

    async fn find_restaurant(&self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        let data = self.inner.read().await;
        Ok(data
            .restaurants
            .iter()
            .find(|r| r.restaurant.id == id)
            .map(|r| r.restaurant.clone()))
    }

    async fn list_restaurants(&self) -> StoreResult<Vec<Restaurant>> {
        let data = self.inner.read().await;
        Ok(data
            .restaurants
            .iter()
            .map(|r| r.restaurant.clone())
            .collect())
    }

    async fn restaurants_within(
        &self,
        center: (f64, f64),
        radius_km: f64,
        earth_radius_km: f64,
    ) -> StoreResult<Vec<Restaurant>> {
        let data = self.inner.read().await;
        Ok(data
            .restaurants
            .iter()
            .map(|r| &r.restaurant)
            .filter(|r| {
                let point = (r.location.longitude(), r.location.latitude());
                great_circle_distance_km(center, point, earth_radius_km) <= radius_km
            })
            .cloned()
            .collect())
    }

    async fn update_restaurant(
        &self,
        id: Uuid,
        changes: RestaurantChanges,
    ) -> StoreResult<Option<Restaurant>> {
        let mut data = self.inner.write().await;
        if let Some(name) = &changes.name {
            if data.restaurant_name_taken(name, Some(id)) {
                return Err(StoreError::Duplicate(Constraint::RestaurantName));
            }
        }

        let Some(restaurant) = data.restaurant_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            restaurant.name = name;
        }
        if let Some(slug) = changes.slug {
            restaurant.slug = slug;
        }
        if let Some(description) = changes.description {
            restaurant.description = description;
        }
        if changes.website.is_some() {
            restaurant.website = changes.website;
        }
        if changes.phone.is_some() {
            restaurant.phone = changes.phone;
        }
        if changes.email.is_some() {
            restaurant.email = changes.email;
        }
        if let Some(location) = changes.location {
            restaurant.location = location;
        }
        if let Some(cuisines) = changes.cuisines {
            restaurant.cuisines = cuisines;
        }
        if let Some(delivery) = changes.delivery {
            restaurant.delivery = delivery;
        }
        if changes.average_bill.is_some() {
            restaurant.average_bill = changes.average_bill;
        }

        Ok(Some(restaurant.clone()))
    }

    async fn set_restaurant_photo(&self, id: Uuid, photo: &str) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        Ok(match data.restaurant_mut(id) {
            Some(restaurant) => {
                restaurant.photo = photo.to_string();
                true
            }
            None => false,
        })
    }

    async fn recompute_average_rating(&self, id: Uuid) -> StoreResult<Option<f64>> {
        let mut data = self.inner.write().await;
        let ratings: Vec<i32> = data
            .reviews
            .iter()
            .filter(|r| r.restaurant == id)
            .map(|r| r.rating)
            .collect();
        let average = if ratings.is_empty() {
            None
        } else {
            Some(ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64)
        };

        Ok(match data.restaurant_mut(id) {
            Some(restaurant) => {
                restaurant.average_rating = average;
                average
            }
            None => None,
        })
    }

    async fn delete_restaurant_cascade(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        let before = data.restaurants.len();
        data.restaurants.retain(|r| r.restaurant.id != id);
        if data.restaurants.len() == before {
            return Ok(false);
        }

        data.offerings.retain(|o| o.restaurant != id);
        data.reviews.retain(|r| r.restaurant != id);
        Ok(true)
    }
}

#[async_trait]
impl OfferingStore for MemoryStore {
    async fn insert_offering(&self, offering: NewOffering) -> StoreResult<ServiceOffering> {
        let mut data = self.inner.write().await;
        let created = ServiceOffering {
            id: Uuid::new_v4(),
            description: offering.description,
            service_type: offering.service_type,
            events_booking: offering.events_booking,
            vegan_menu: offering.vegan_menu,
            booking_required: offering.booking_required,
            kids_friendly: offering.kids_friendly,
            seat_capacity: offering.seat_capacity,
            restaurant: offering.restaurant,
            user: offering.user,
            created_at: Utc::now(),
        };
        data.offerings.push(created.clone());
        Ok(created)
    }

    async fn find_offering(&self, id: Uuid) -> StoreResult<Option<ServiceOffering>> {
        let data = self.inner.read().await;
        Ok(data.offerings.iter().find(|o| o.id == id).cloned())
    }

    async fn list_offerings(&self, restaurant: Option<Uuid>) -> StoreResult<Vec<ServiceOffering>> {
        let data = self.inner.read().await;
        Ok(data
            .offerings
            .iter()
            .filter(|o| restaurant.map_or(true, |id| o.restaurant == id))
            .cloned()
            .collect())
    }

    async fn update_offering(
        &self,
        id: Uuid,
        changes: OfferingChanges,
    ) -> StoreResult<Option<ServiceOffering>> {
        let mut data = self.inner.write().await;
        let Some(offering) = data.offerings.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };

        if let Some(description) = changes.description {
            offering.description = description;
        }
        if let Some(service_type) = changes.service_type {
            offering.service_type = service_type;
        }
        if let Some(value) = changes.events_booking {
            offering.events_booking = value;
        }
        if let Some(value) = changes.vegan_menu {
            offering.vegan_menu = value;
        }
        if let Some(value) = changes.booking_required {
            offering.booking_required = value;
        }
        if let Some(value) = changes.kids_friendly {
            offering.kids_friendly = value;
        }
        if changes.seat_capacity.is_some() {
            offering.seat_capacity = changes.seat_capacity;
        }

        Ok(Some(offering.clone()))
    }

    async fn delete_offering(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        let before = data.offerings.len();
        data.offerings.retain(|o| o.id != id);
        Ok(data.offerings.len() < before)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn insert_review(&self, review: NewReview) -> StoreResult<Review> {
        let mut data = self.inner.write().await;
        if data
            .reviews
            .iter()
            .any(|r| r.restaurant == review.restaurant && r.user == review.user)
        {
            return Err(StoreError::Duplicate(Constraint::ReviewAuthor));
        }

        let created = Review {
            id: Uuid::new_v4(),
            title: review.title,
            text: review.text,
            rating: review.rating,
            restaurant: review.restaurant,
            user: review.user,
            created_at: Utc::now(),
        };
        data.reviews.push(created.clone());
        Ok(created)
    }

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let data = self.inner.read().await;
        Ok(data.reviews.iter().find(|r| r.id == id).cloned())
    }

    async fn list_reviews(&self, restaurant: Option<Uuid>) -> StoreResult<Vec<Review>> {
        let data = self.inner.read().await;
        Ok(data
            .reviews
            .iter()
            .filter(|r| restaurant.map_or(true, |id| r.restaurant == id))
            .cloned()
            .collect())
    }

    async fn update_review(
        &self,
        id: Uuid,
        changes: ReviewChanges,
    ) -> StoreResult<Option<Review>> {
        let mut data = self.inner.write().await;
        let Some(review) = data.reviews.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            review.title = title;
        }
        if let Some(text) = changes.text {
            review.text = text;
        }
        if let Some(rating) = changes.rating {
            review.rating = rating;
        }

        Ok(Some(review.clone()))
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        let mut data = self.inner.write().await;
        let before = data.reviews.len();
        data.reviews.retain(|r| r.id != id);
        Ok(data.reviews.len() < before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        *self.inner.write().await = Collections::default();
        Ok(())
    }
}
