//! Review handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handlers::{AppJson, AppState, Empty, SuccessResponse};
use super::middleware::AuthUser;
use crate::models::{CreateReviewRequest, Review, UpdateReviewRequest};
use crate::utils::error::AppResult;

/// GET /reviews
pub async fn list_reviews(
    State(state): State<AppState>,
) -> AppResult<Json<SuccessResponse<Vec<Review>>>> {
    let reviews = state.review_service.list(None).await?;
    Ok(Json(SuccessResponse::list(reviews)))
}

/// GET /restaurants/{id}/reviews
pub async fn list_restaurant_reviews(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Vec<Review>>>> {
    let reviews = state.review_service.list(Some(restaurant_id)).await?;
    Ok(Json(SuccessResponse::list(reviews)))
}

/// GET /reviews/{id}
pub async fn get_review(
    State(state): State<AppState>,
    Path(review_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Review>>> {
    let review = state.review_service.get(review_id).await?;
    Ok(Json(SuccessResponse::new(review)))
}

/// POST /restaurants/{id}/reviews
pub async fn create_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(restaurant_id): Path<Uuid>,
    AppJson(request): AppJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<Review>>)> {
    let review = state
        .review_service
        .create(&caller, restaurant_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(review))))
}

/// PUT /reviews/{id}
pub async fn update_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(review_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateReviewRequest>,
) -> AppResult<Json<SuccessResponse<Review>>> {
    let review = state
        .review_service
        .update(&caller, review_id, request)
        .await?;
    Ok(Json(SuccessResponse::new(review)))
}

/// DELETE /reviews/{id}
pub async fn delete_review(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(review_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Empty>>> {
    state.review_service.delete(&caller, review_id).await?;
    Ok(Json(SuccessResponse::new(Empty {})))
}
