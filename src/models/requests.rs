//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::restaurant::Cuisine;
use super::user::Role;
use crate::utils::validation::{
    email_validator, name_validator, not_blank, password_validator, url_validator,
};

/// Strip surrounding whitespace while deserializing, so that length rules
/// see the value that is stored
fn trimmed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    String::deserialize(deserializer).map(|s| s.trim().to_string())
}

fn trimmed_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(deserializer).map(|s| s.map(|s| s.trim().to_string()))
}

/// Request payload for self-registration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom(function = "name_validator"))]
    pub name: String,

    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(custom(function = "password_validator"))]
    pub password: String,

    /// `user` or `owner`; `admin` cannot be self-assigned
    pub role: Option<Role>,
}

/// Request payload for login
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Please provide an email and password"))]
    pub email: String,

    #[validate(length(min = 1, message = "Please provide an email and password"))]
    pub password: String,
}

/// Request payload for starting a password reset
#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(custom(function = "email_validator"))]
    pub email: String,
}

/// Request payload for completing a password reset
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(custom(function = "password_validator"))]
    pub password: String,
}

/// Request payload for changing name and email of the current user
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateDetailsRequest {
    #[validate(custom(function = "name_validator"))]
    pub name: Option<String>,

    #[validate(custom(function = "email_validator"))]
    pub email: Option<String>,
}

/// Request payload for changing the current user's password
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Please provide the current password"))]
    pub current_password: String,

    #[validate(custom(function = "password_validator"))]
    pub new_password: String,
}

/// Request payload for admin user provisioning
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(custom(function = "name_validator"))]
    pub name: String,

    #[validate(custom(function = "email_validator"))]
    pub email: String,

    #[validate(custom(function = "password_validator"))]
    pub password: String,

    pub role: Option<Role>,
}

/// Request payload for admin user updates
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(custom(function = "name_validator"))]
    pub name: Option<String>,

    #[validate(custom(function = "email_validator"))]
    pub email: Option<String>,

    pub role: Option<Role>,
}

/// Request payload for publishing a restaurant
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRestaurantRequest {
    #[serde(deserialize_with = "trimmed")]
    #[validate(
        custom(function = "not_blank"),
        length(max = 20, message = "Name cannot be greater than 20 characters")
    )]
    pub name: String,

    #[serde(deserialize_with = "trimmed")]
    #[validate(
        custom(function = "not_blank"),
        length(
            max = 500,
            message = "Description cannot be greater than 500 characters"
        )
    )]
    pub description: String,

    #[validate(custom(function = "url_validator"))]
    pub website: Option<String>,

    #[validate(length(max = 20, message = "Phone number cannot be longer than 20 digits"))]
    pub phone: Option<String>,

    #[validate(custom(function = "email_validator"))]
    pub email: Option<String>,

    /// Raw address; geocoded and then discarded
    #[validate(custom(function = "not_blank"))]
    pub address: String,

    #[validate(length(min = 1, message = "Please add at least one cuisine"))]
    pub cuisines: Vec<Cuisine>,

    #[serde(default)]
    pub delivery: bool,

    #[validate(range(min = 0.0, message = "Average bill cannot be negative"))]
    pub average_bill: Option<f64>,

    /// Owner on whose behalf an admin publishes; ignored for other roles
    pub user: Option<Uuid>,
}

/// Request payload for updating a restaurant
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRestaurantRequest {
    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(
        custom(function = "not_blank"),
        length(max = 20, message = "Name cannot be greater than 20 characters")
    )]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "trimmed_opt")]
    #[validate(
        custom(function = "not_blank"),
        length(
            max = 500,
            message = "Description cannot be greater than 500 characters"
        )
    )]
    pub description: Option<String>,

    #[validate(custom(function = "url_validator"))]
    pub website: Option<String>,

    #[validate(length(max = 20, message = "Phone number cannot be longer than 20 digits"))]
    pub phone: Option<String>,

    #[validate(custom(function = "email_validator"))]
    pub email: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub address: Option<String>,

    #[validate(length(min = 1, message = "Please add at least one cuisine"))]
    pub cuisines: Option<Vec<Cuisine>>,

    pub delivery: Option<bool>,

    #[validate(range(min = 0.0, message = "Average bill cannot be negative"))]
    pub average_bill: Option<f64>,
}

/// Request payload for adding a service offering to a restaurant
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferingRequest {
    #[validate(custom(function = "not_blank"))]
    pub description: String,

    #[validate(custom(function = "not_blank"))]
    pub service_type: String,

    #[serde(default)]
    pub events_booking: bool,

    #[serde(default)]
    pub vegan_menu: bool,

    #[serde(default)]
    pub booking_required: bool,

    #[serde(default, alias = "kindsFriendly")]
    pub kids_friendly: bool,

    #[validate(range(min = 0, message = "Seat capacity cannot be negative"))]
    pub seat_capacity: Option<i32>,
}

/// Request payload for updating a service offering
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOfferingRequest {
    #[validate(custom(function = "not_blank"))]
    pub description: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub service_type: Option<String>,

    pub events_booking: Option<bool>,
    pub vegan_menu: Option<bool>,
    pub booking_required: Option<bool>,

    #[serde(alias = "kindsFriendly")]
    pub kids_friendly: Option<bool>,

    #[validate(range(min = 0, message = "Seat capacity cannot be negative"))]
    pub seat_capacity: Option<i32>,
}

/// Request payload for reviewing a restaurant
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Title cannot be greater than 100 characters")
    )]
    pub title: String,

    #[validate(custom(function = "not_blank"))]
    pub text: String,

    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: i32,
}

/// Request payload for updating a review
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReviewRequest {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Title cannot be greater than 100 characters")
    )]
    pub title: Option<String>,

    #[validate(custom(function = "not_blank"))]
    pub text: Option<String>,

    #[validate(range(min = 1, max = 10, message = "Please add a rating between 1 and 10"))]
    pub rating: Option<i32>,
}

/// Response for health check
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}
