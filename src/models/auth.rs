use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;

/// Claims embedded in both JWT flavors. Access tokens carry the role the
/// subject held at issuance; refresh tokens share the schema with no role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user UUID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    pub iat: i64,
    pub exp: i64,
}

/// Identity resolved by the authorization gate for the current request,
/// available to handlers via the Axum extractor. Looked up fresh from the
/// store on every request — never cached across requests.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: UserRole,
}
