//! Service Layer
//!
//! Business logic for the directory: authentication flows, account
//! management, restaurants and their offerings and reviews, plus the
//! upstream seams (geocoding, mail, photo storage).

pub mod auth;
pub mod email_service;
pub mod geocoder;
pub mod jwt;
pub mod offering;
pub mod photo_store;
pub mod rating;
pub mod restaurant;
pub mod review;
pub mod user;

use uuid::Uuid;

use crate::models::CurrentUser;
use crate::utils::error::{AppError, AppResult};

// Re-export services
pub use auth::{AuthOutcome, AuthService};
pub use email_service::{DisabledMailer, EmailService, EmailTemplates, MailMessage, Mailer};
pub use geocoder::{GeocodedAddress, Geocoder, MapQuestGeocoder};
pub use jwt::JwtService;
pub use offering::OfferingService;
pub use photo_store::{LocalPhotoStore, PhotoStore};
pub use rating::RatingAggregator;
pub use restaurant::{PhotoUpload, RestaurantService, EARTH_RADIUS_KM};
pub use review::ReviewService;
pub use user::UserService;

/// Ownership gate: the recorded owner or an admin may modify a resource
pub fn ensure_owner(caller: &CurrentUser, owner_id: Uuid, resource: &str) -> AppResult<()> {
    if caller.is_admin() || caller.id == owner_id {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "User {} is not authorized to modify this {}",
            caller.id, resource
        )))
    }
}
