//! Restaurant Handlers
//!
//! Public listings and radius search, owner/admin mutations and photo upload.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handlers::{AppJson, AppState, Empty, SuccessResponse};
use super::middleware::AuthUser;
use crate::models::{CreateRestaurantRequest, Restaurant, UpdateRestaurantRequest};
use crate::service::PhotoUpload;
use crate::utils::error::{AppError, AppResult};

/// Multipart field carrying the photo
const PHOTO_FIELD: &str = "file";

/// GET /restaurants
pub async fn list_restaurants(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<Vec<Restaurant>>>> {
    let restaurants = state.restaurant_service.list().await?;
    Ok(Json(SuccessResponse::list(restaurants)))
}

/// GET /restaurants/{id}
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Restaurant>>> {
    let restaurant = state.restaurant_service.get(restaurant_id).await?;
    Ok(Json(SuccessResponse::new(restaurant)))
}

/// GET /restaurants/radius/{zipcode}/{distance}
pub async fn restaurants_in_radius(
    State(state): State<AppState>,
    Path((zipcode, distance)): Path<(String, f64)>,
) -> AppResult<Json<SuccessResponse<Vec<Restaurant>>>> {
    let restaurants = state
        .restaurant_service
        .within_radius(&zipcode, distance)
        .await?;
    Ok(Json(SuccessResponse::list(restaurants)))
}

/// POST /restaurants
pub async fn create_restaurant(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    AppJson(request): AppJson<CreateRestaurantRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<Restaurant>>)> {
    let restaurant = state.restaurant_service.create(&caller, request).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(restaurant))))
}

/// PUT /restaurants/{id}
pub async fn update_restaurant(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(restaurant_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateRestaurantRequest>,
) -> AppResult<Json<SuccessResponse<Restaurant>>> {
    let restaurant = state
        .restaurant_service
        .update(&caller, restaurant_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(restaurant)))
}

/// DELETE /restaurants/{id}
pub async fn delete_restaurant(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Empty>>> {
    state
        .restaurant_service
        .delete(&caller, restaurant_id)
        .await?;
    Ok(Json(SuccessResponse::new(Empty {})))
}

/// PUT /restaurants/{id}/photo
///
/// Expects a multipart body with the image in the `file` field and answers
/// with the stored file name.
pub async fn upload_photo(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(restaurant_id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<SuccessResponse<String>>> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some(PHOTO_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        upload = Some(PhotoUpload {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload =
        upload.ok_or_else(|| AppError::Validation("Please upload a file".to_string()))?;
    let file_name = state
        .restaurant_service
        .upload_photo(&caller, restaurant_id, upload)
        .await?;

    Ok(Json(SuccessResponse::new(file_name)))
}
