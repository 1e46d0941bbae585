use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// Minimal read-only view of a user needed for an authorization decision.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub id: Uuid,
    pub role: UserRole,
}

/// A user record to persist at registration time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
    pub avatar_url: Option<String>,
}

/// The user-record store the gateway reads identities from. Behind a trait
/// so the authorization gate runs against an in-memory store in tests.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> anyhow::Result<User>;
    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    /// Per-request lookup used by the authorization gate. Always hits the
    /// store, so role changes and deletions apply on the next request.
    async fn find_identity(&self, id: Uuid) -> anyhow::Result<Option<Identity>>;
    async fn username_or_email_taken(&self, username: &str, email: &str) -> anyhow::Result<bool>;
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> anyhow::Result<()>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const USER_COLUMNS: &str =
    "id, username, email, password_hash, role, avatar_url, created_at, updated_at";

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> anyhow::Result<User> {
        let row = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, email, password_hash, role, avatar_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(&user.avatar_url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn find_identity(&self, id: Uuid) -> anyhow::Result<Option<Identity>> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, role FROM users WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id, role)| Identity {
            id,
            role: role.parse().unwrap_or(UserRole::User),
        }))
    }

    async fn username_or_email_taken(&self, username: &str, email: &str) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(taken)
    }

    async fn list(&self) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY username"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::Utc;
    use uuid::Uuid;

    use super::{Identity, NewUser, UserStore};
    use crate::models::user::{User, UserRole};

    /// In-memory stand-in for the Postgres store, used by gate and service
    /// tests.
    #[derive(Default)]
    pub struct MemoryStore {
        users: Mutex<HashMap<Uuid, User>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn seed(&self, username: &str, role: UserRole, password_hash: &str) -> Uuid {
            let id = Uuid::new_v4();
            let now = Utc::now();
            let user = User {
                id,
                username: username.to_string(),
                email: format!("{username}@example.com"),
                password_hash: password_hash.to_string(),
                role: role.to_string(),
                avatar_url: None,
                created_at: now,
                updated_at: now,
            };
            self.users.lock().unwrap().insert(id, user);
            id
        }

        pub fn remove(&self, id: Uuid) {
            self.users.lock().unwrap().remove(&id);
        }

        pub fn set_role(&self, id: Uuid, role: UserRole) {
            if let Some(u) = self.users.lock().unwrap().get_mut(&id) {
                u.role = role.to_string();
            }
        }
    }

    #[async_trait]
    impl UserStore for MemoryStore {
        async fn create(&self, user: NewUser) -> anyhow::Result<User> {
            let now = Utc::now();
            let row = User {
                id: Uuid::new_v4(),
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                role: user.role.to_string(),
                avatar_url: user.avatar_url,
                created_at: now,
                updated_at: now,
            };
            self.users.lock().unwrap().insert(row.id, row.clone());
            Ok(row)
        }

        async fn find_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
            Ok(self.users.lock().unwrap().get(&id).cloned())
        }

        async fn find_identity(&self, id: Uuid) -> anyhow::Result<Option<Identity>> {
            Ok(self.users.lock().unwrap().get(&id).map(|u| Identity {
                id: u.id,
                role: u.role.parse().unwrap_or(UserRole::User),
            }))
        }

        async fn username_or_email_taken(
            &self,
            username: &str,
            email: &str,
        ) -> anyhow::Result<bool> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .values()
                .any(|u| u.username == username || u.email == email))
        }

        async fn list(&self) -> anyhow::Result<Vec<User>> {
            let mut users: Vec<User> = self.users.lock().unwrap().values().cloned().collect();
            users.sort_by(|a, b| a.username.cmp(&b.username));
            Ok(users)
        }

        async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
            Ok(self.users.lock().unwrap().remove(&id).is_some())
        }

        async fn ping(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }
}
