use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use crate::db::directory::{GuestStore, UserDirectory};
use crate::db::models::{GuestId, User};
use crate::error::DirectoryError;

const USER_COLUMNS: &str = "id, phone, first_name, last_name, refresh_token, refresh_token_expiry, \
                            deleted_at, created_at, updated_at";

/// Postgres-backed user directory and guest store.
pub struct DbOperations {
    pool: Arc<PgPool>,
}

impl DbOperations {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    pub async fn new_with_options(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DirectoryError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn migrate(&self) -> Result<(), DirectoryError> {
        sqlx::migrate!("./migrations")
            .run(self.pool.as_ref())
            .await
            .map_err(|e| DirectoryError::QueryError(e.to_string()))
    }

    pub fn get_pool_status(&self) -> DbPoolStatus {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;

        DbPoolStatus {
            total_connections: size,
            active_connections: size.saturating_sub(idle),
            idle_connections: idle,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl UserDirectory for DbOperations {
    async fn find_by_phone(&self, phone: &str) -> Result<User, DirectoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE phone = $1",
            USER_COLUMNS
        ))
        .bind(phone)
        .fetch_optional(self.pool.as_ref())
        .await?;

        user.ok_or(DirectoryError::NotFound)
    }

    async fn find_by_refresh_token(&self, token: &str) -> Result<User, DirectoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE refresh_token = $1",
            USER_COLUMNS
        ))
        .bind(token)
        .fetch_optional(self.pool.as_ref())
        .await?;

        user.ok_or(DirectoryError::NotFound)
    }

    async fn create(&self, user: &User) -> Result<User, DirectoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (phone, first_name, last_name, refresh_token, refresh_token_expiry,
                               deleted_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&user.phone)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.refresh_token)
        .bind(user.refresh_token_expiry)
        .bind(user.deleted_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), DirectoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET phone = $2, first_name = $3, last_name = $4, refresh_token = $5,
                refresh_token_expiry = $6, deleted_at = $7, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.phone)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.refresh_token)
        .bind(user.refresh_token_expiry)
        .bind(user.deleted_at)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl GuestStore for DbOperations {
    async fn remove(&self, guest_id: GuestId) -> Result<(), DirectoryError> {
        sqlx::query("DELETE FROM guests WHERE id = $1")
            .bind(guest_id)
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct DbPoolStatus {
    pub total_connections: u32,
    pub active_connections: u32,
    pub idle_connections: u32,
}
