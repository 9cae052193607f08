//! Account administration handlers (admin only)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handlers::{AppJson, AppState, Empty, SuccessResponse};
use crate::models::{CreateUserRequest, UpdateUserRequest, User};
use crate::utils::error::AppResult;

/// GET /auth/users
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<SuccessResponse<Vec<User>>>> {
    let users = state.user_service.list_users().await?;
    Ok(Json(SuccessResponse::list(users)))
}

/// GET /auth/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let user = state.user_service.get_user(user_id).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// POST /auth/users
///
/// Unlike self-registration, admins may provision any role.
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<SuccessResponse<User>>)> {
    let user = state.user_service.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(SuccessResponse::new(user))))
}

/// PUT /auth/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    AppJson(request): AppJson<UpdateUserRequest>,
) -> AppResult<Json<SuccessResponse<User>>> {
    let user = state.user_service.update_user(user_id, request).await?;
    Ok(Json(SuccessResponse::new(user)))
}

/// DELETE /auth/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<SuccessResponse<Empty>>> {
    state.user_service.delete_user(user_id).await?;
    Ok(Json(SuccessResponse::new(Empty {})))
}
