use axum::{extract::State, http::StatusCode, Json};

use crate::{
    errors::AppError,
    models::{
        auth::CurrentUser,
        user::{LoginRequest, LoginResponse, RegisterRequest, UserProfile},
    },
    services::auth::AuthService,
    AppState,
};

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    let profile = AuthService::register(state.store.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let response = AuthService::login(state.store.as_ref(), &state.codec, body).await?;
    Ok(Json(response))
}

/// Profile of the authenticated caller. The row can vanish between the
/// gate's check and this read; that surfaces as the same 404.
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let found = state
        .store
        .find_by_id(user.id)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::IdentityNotFound)?;
    Ok(Json(found.into()))
}
