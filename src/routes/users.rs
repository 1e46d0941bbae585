use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{auth::CurrentUser, user::UserProfile},
    AppState,
};

/// List all users. Gated to staff roles in the router.
pub async fn list_users(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    let users = state.store.list().await.map_err(AppError::Internal)?;
    Ok(Json(users.into_iter().map(UserProfile::from).collect()))
}

/// Delete a user by id. Gated to admins in the router.
pub async fn delete_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    if state.store.delete(id).await.map_err(AppError::Internal)? {
        Ok(Json(json!({ "success": true })))
    } else {
        Err(AppError::IdentityNotFound)
    }
}
