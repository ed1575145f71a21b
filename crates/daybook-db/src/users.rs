//! Per-user settings storage.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use daybook_core::{Error, Result, UserSettings, UserSettingsRepository};

/// PostgreSQL implementation of UserSettingsRepository.
pub struct PgUserSettingsRepository {
    pool: Pool<Postgres>,
}

impl PgUserSettingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserSettingsRepository for PgUserSettingsRepository {
    async fn get(&self, user_id: Uuid) -> Result<Option<UserSettings>> {
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            SELECT user_id, timezone, pendant_api_key, created_at, updated_at
            FROM user_settings
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(settings)
    }

    async fn upsert(
        &self,
        user_id: Uuid,
        timezone: Option<&str>,
        pendant_api_key: Option<&str>,
    ) -> Result<UserSettings> {
        let now = Utc::now();

        // Whole-value semantics: passing None clears the stored field.
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            INSERT INTO user_settings (user_id, timezone, pendant_api_key, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                timezone = EXCLUDED.timezone,
                pendant_api_key = EXCLUDED.pendant_api_key,
                updated_at = EXCLUDED.updated_at
            RETURNING user_id, timezone, pendant_api_key, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(timezone)
        .bind(pendant_api_key)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(settings)
    }

    async fn list_with_credentials(&self) -> Result<Vec<UserSettings>> {
        let settings = sqlx::query_as::<_, UserSettings>(
            r#"
            SELECT user_id, timezone, pendant_api_key, created_at, updated_at
            FROM user_settings
            WHERE pendant_api_key IS NOT NULL
            ORDER BY user_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(settings)
    }
}
