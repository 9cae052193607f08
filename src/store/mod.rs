//! Document Store
//!
//! Persistence seam for users, restaurants, service offerings and reviews.
//! Every uniqueness rule of the directory lives here as a store constraint so
//! that concurrent writers cannot race past a read-then-write check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Cuisine, Location, Restaurant, Review, Role, ServiceOffering, User, UserCredentials};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Uniqueness rules enforced by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// One account per email address
    UserEmail,
    /// Restaurant names are unique
    RestaurantName,
    /// A non-admin user publishes at most one restaurant
    RestaurantOwner,
    /// One review per user and restaurant
    ReviewAuthor,
}

/// Store-level failures
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate key violates {0:?}")]
    Duplicate(Constraint),

    /// The user is still recorded as owning a restaurant
    #[error("user still owns a restaurant")]
    UserOwnsRestaurant,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// Persisted data that no longer maps onto the domain types
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Account to insert; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

/// Partial account update; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone)]
pub struct NewRestaurant {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Location,
    pub cuisines: Vec<Cuisine>,
    pub delivery: bool,
    pub average_bill: Option<f64>,
    pub user: Uuid,
    /// Occupy the owner's single restaurant slot
    pub exclusive_owner: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RestaurantChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub location: Option<Location>,
    pub cuisines: Option<Vec<Cuisine>>,
    pub delivery: Option<bool>,
    pub average_bill: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewOffering {
    pub description: String,
    pub service_type: String,
    pub events_booking: bool,
    pub vegan_menu: bool,
    pub booking_required: bool,
    pub kids_friendly: bool,
    pub seat_capacity: Option<i32>,
    pub restaurant: Uuid,
    pub user: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct OfferingChanges {
    pub description: Option<String>,
    pub service_type: Option<String>,
    pub events_booking: Option<bool>,
    pub vegan_menu: Option<bool>,
    pub booking_required: Option<bool>,
    pub kids_friendly: Option<bool>,
    pub seat_capacity: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub title: String,
    pub text: String,
    pub rating: i32,
    pub restaurant: Uuid,
    pub user: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct ReviewChanges {
    pub title: Option<String>,
    pub text: Option<String>,
    pub rating: Option<i32>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Secret-bearing lookup by id
    async fn find_credentials(&self, id: Uuid) -> StoreResult<Option<UserCredentials>>;

    /// Secret-bearing lookup by normalized email
    async fn find_credentials_by_email(&self, email: &str)
        -> StoreResult<Option<UserCredentials>>;

    /// Account holding this reset-token hash with an expiry later than `now`
    async fn find_credentials_by_reset_token(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<UserCredentials>>;

    /// Apply the changes. A role change across the admin boundary also
    /// reconciles the single-restaurant slot: promotion releases it, demotion
    /// assigns it to the user's oldest restaurant when none is held.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<Option<User>>;

    /// Returns `false` when the user does not exist
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;

    /// Store or clear (`None`) the reset-token state
    async fn set_reset_token(
        &self,
        id: Uuid,
        token: Option<(String, DateTime<Utc>)>,
    ) -> StoreResult<bool>;

    /// Atomically clear the reset token and set the new password, but only if
    /// the stored token hash still equals `token_hash`. Returns `false` when
    /// another request consumed the token first.
    async fn consume_reset_token(
        &self,
        id: Uuid,
        token_hash: &str,
        password_hash: &str,
    ) -> StoreResult<bool>;

    /// Delete the user together with their reviews and offerings. Returns the
    /// restaurants whose reviews were removed, or `None` if the user is unknown.
    /// Fails with [`StoreError::UserOwnsRestaurant`] while a restaurant is still
    /// recorded against the user; the check and the delete are one atomic step.
    async fn delete_user(&self, id: Uuid) -> StoreResult<Option<Vec<Uuid>>>;
}

#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn insert_restaurant(&self, restaurant: NewRestaurant) -> StoreResult<Restaurant>;

    async fn find_restaurant(&self, id: Uuid) -> StoreResult<Option<Restaurant>>;

    async fn list_restaurants(&self) -> StoreResult<Vec<Restaurant>>;

    /// Restaurants whose location lies within `radius_km` of `center`
    /// (`(longitude, latitude)`) on a sphere of `earth_radius_km`.
    async fn restaurants_within(
        &self,
        center: (f64, f64),
        radius_km: f64,
        earth_radius_km: f64,
    ) -> StoreResult<Vec<Restaurant>>;

    async fn update_restaurant(
        &self,
        id: Uuid,
        changes: RestaurantChanges,
    ) -> StoreResult<Option<Restaurant>>;

    async fn set_restaurant_photo(&self, id: Uuid, photo: &str) -> StoreResult<bool>;

    /// Set the average rating to the mean of the restaurant's reviews in a
    /// single statement; `None` when no reviews remain.
    async fn recompute_average_rating(&self, id: Uuid) -> StoreResult<Option<f64>>;

    /// Delete the restaurant with its offerings and reviews in one transaction
    async fn delete_restaurant_cascade(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait OfferingStore: Send + Sync {
    async fn insert_offering(&self, offering: NewOffering) -> StoreResult<ServiceOffering>;

    async fn find_offering(&self, id: Uuid) -> StoreResult<Option<ServiceOffering>>;

    /// All offerings, or only those of one restaurant
    async fn list_offerings(&self, restaurant: Option<Uuid>) -> StoreResult<Vec<ServiceOffering>>;

    async fn update_offering(
        &self,
        id: Uuid,
        changes: OfferingChanges,
    ) -> StoreResult<Option<ServiceOffering>>;

    async fn delete_offering(&self, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn insert_review(&self, review: NewReview) -> StoreResult<Review>;

    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>>;

    /// All reviews, or only those of one restaurant
    async fn list_reviews(&self, restaurant: Option<Uuid>) -> StoreResult<Vec<Review>>;

    async fn update_review(&self, id: Uuid, changes: ReviewChanges)
        -> StoreResult<Option<Review>>;

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool>;
}

/// Complete document store used by the services
#[async_trait]
pub trait Store: UserStore + RestaurantStore + OfferingStore + ReviewStore {
    /// Connectivity check for health checks
    async fn ping(&self) -> StoreResult<()>;

    /// Remove every record; used by the seeder
    async fn clear(&self) -> StoreResult<()>;
}
