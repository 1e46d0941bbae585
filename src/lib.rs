pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use std::sync::Arc;

use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};

use crate::middleware::auth::{authorize, AllowedRoles};
use crate::models::user::UserRole;
use crate::services::token::TokenCodec;
use crate::store::UserStore;

/// Application state shared across all handlers. The codec and store handle
/// are read-only after startup; requests share nothing mutable.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub codec: TokenCodec,
}

/// Assemble the API router. Role policy is declared per route here, not
/// inside the gate.
pub fn router(state: AppState) -> Router {
    let authenticated = from_fn_with_state((state.clone(), AllowedRoles::any()), authorize);
    let staff = from_fn_with_state(
        (
            state.clone(),
            AllowedRoles::only(&[UserRole::Admin, UserRole::Moderator]),
        ),
        authorize,
    );
    let admin_only = from_fn_with_state(
        (state.clone(), AllowedRoles::only(&[UserRole::Admin])),
        authorize,
    );

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/auth/register", post(routes::auth::register))
        .route("/auth/login", post(routes::auth::login))
        .route("/auth/me", get(routes::auth::me).route_layer(authenticated))
        .route(
            "/users",
            get(routes::users::list_users).route_layer(staff),
        )
        .route(
            "/users/{id}",
            delete(routes::users::delete_user).route_layer(admin_only),
        )
        .with_state(state)
}
