//! Known device model

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

/// A device fingerprint the account has logged in from before.
/// Created at most once per (email, device_hash) pair, never updated.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct KnownDevice {
    pub email: String,
    pub device_hash: String,
    pub created_at: DateTime<Utc>,
}

impl KnownDevice {
    pub async fn is_known(
        pool: &PgPool,
        email: &str,
        device_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let (known,): (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM known_devices WHERE email = $1 AND device_hash = $2)",
        )
        .bind(email)
        .bind(device_hash)
        .fetch_one(pool)
        .await?;

        Ok(known)
    }

    pub async fn register(
        pool: &PgPool,
        email: &str,
        device_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO known_devices (email, device_hash, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (email, device_hash) DO NOTHING
            "#,
        )
        .bind(email)
        .bind(device_hash)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(())
    }
}
