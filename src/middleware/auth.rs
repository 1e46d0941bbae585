use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    errors::AppError,
    models::{auth::CurrentUser, user::UserRole},
    services::token::TokenKind,
    AppState,
};

/// Per-route policy: which roles may pass the gate. An empty set admits any
/// authenticated identity. Supplied per call site, so one gate serves every
/// route with different policy parameters.
#[derive(Debug, Clone, Default)]
pub struct AllowedRoles(Vec<UserRole>);

impl AllowedRoles {
    /// Any authenticated identity is accepted.
    pub fn any() -> Self {
        Self(Vec::new())
    }

    pub fn only(roles: &[UserRole]) -> Self {
        Self(roles.to_vec())
    }

    fn admits(&self, role: UserRole) -> bool {
        self.0.is_empty() || self.0.contains(&role)
    }
}

/// Request interceptor guarding protected routes. Apply per route with
/// `axum::middleware::from_fn_with_state((state, allowed), authorize)`.
///
/// Extracts the bearer token, verifies it against the access secret,
/// resolves the subject against the user store and enforces the allowed-role
/// policy; on success the resolved `CurrentUser` rides in the request
/// extensions for the downstream handler.
pub async fn authorize(
    State((state, allowed)): State<(AppState, AllowedRoles)>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(req.headers())
        .ok_or(AppError::Unauthenticated("Authorization token required"))?;

    // Malformed, badly signed and expired all answer with the same message
    // so the response does not reveal which check failed.
    let claims = state
        .codec
        .verify(token, TokenKind::Access)
        .map_err(|e| {
            tracing::debug!("access token rejected: {e}");
            AppError::Unauthenticated("Invalid or expired token")
        })?;

    let subject: Uuid = claims
        .sub
        .parse()
        .map_err(|_| AppError::Unauthenticated("Invalid or expired token"))?;

    // Existence and role are read fresh from the store on every request so
    // deletions and role changes take effect immediately.
    let identity = state
        .store
        .find_identity(subject)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::IdentityNotFound)?;

    if !allowed.admits(identity.role) {
        return Err(AppError::Forbidden);
    }

    req.extensions_mut().insert(CurrentUser {
        id: identity.id,
        role: identity.role,
    });
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or(AppError::Unauthenticated("Authorization token required"))
    }
}
