//! Service offering handlers
//!
//! Offerings are listed publicly, either all at once or per restaurant, and
//! mutated by the restaurant's publisher or an admin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handlers::{AppJson, AppState, Empty, SuccessResponse};
use super::middleware::AuthUser;
use crate::models::{CreateOfferingRequest, ServiceOffering, UpdateOfferingRequest};
use crate::utils::error::AppResult;

/// GET /services
pub async fn list_offerings(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<Vec<ServiceOffering>>>> {
    let offerings = state.offering_service.list(None).await?;
    Ok(Json(SuccessResponse::list(offerings)))
}

/// GET /restaurants/{id}/services
pub async fn list_restaurant_offerings(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Vec<ServiceOffering>>>> {
    let offerings = state.offering_service.list(Some(restaurant_id)).await?;
    Ok(Json(SuccessResponse::list(offerings)))
}

/// GET /services/{id}
pub async fn get_offering(
    State(state): State<AppState>,
    Path(offering_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<ServiceOffering>>> {
    let offering = state.offering_service.get(offering_id).await?;
    Ok(Json(SuccessResponse::new(offering)))
}

/// POST /restaurants/{id}/services
pub async fn create_offering(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(restaurant_id): Path<Uuid>,
    AppJson(request): AppJson<CreateOfferingRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<ServiceOffering>>)> {
    let offering = state
        .offering_service
        .create(&caller, restaurant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(offering))))
}

/// PUT /services/{id}
pub async fn update_offering(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(offering_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateOfferingRequest>,
) -> AppResult<Json<SuccessResponse<ServiceOffering>>> {
    let offering = state
        .offering_service
        .update(&caller, offering_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(offering)))
}

/// DELETE /services/{id}
pub async fn delete_offering(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(offering_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Empty>>> {
    state.offering_service.delete(&caller, offering_id).await?;
    Ok(Json(SuccessResponse::new(Empty {})))
}
