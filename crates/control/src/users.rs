use dockhand_auth::{hash_password, verify_password};
use dockhand_models::{DockhandError, User};
use sqlx::{Row, SqlitePool};
use tracing::{info, instrument};

/// SQLite-backed user store.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
}

impl UserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, DockhandError> {
        let row = sqlx::query("SELECT user_id, username, password_hash FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| User {
            user_id: row.get("user_id"),
            username: row.get("username"),
            password_hash: row.get("password_hash"),
        }))
    }

    /// Create the bootstrap user on first start. Never overwrites an
    /// existing row, so a changed default password does not rotate a
    /// deployed credential.
    #[instrument(skip(self, password))]
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<(), DockhandError> {
        if self.find_user(username).await?.is_some() {
            return Ok(());
        }

        let password_hash = hash_password(password)?;
        sqlx::query("INSERT INTO users (username, password_hash) VALUES (?, ?)")
            .bind(username)
            .bind(&password_hash)
            .execute(&self.pool)
            .await?;

        info!("Created default admin user: {}", username);
        Ok(())
    }

    /// Verify credentials against the store.
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<User, DockhandError> {
        let user = self
            .find_user(username)
            .await?
            .ok_or(DockhandError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(DockhandError::InvalidCredentials);
        }
        Ok(user)
    }
}
