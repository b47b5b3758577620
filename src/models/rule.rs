//! Scoring rule (action range) model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

/// Maps a score interval to an action. Ranges are expected to be
/// non-overlapping and to cover 0-100, but that is an operator contract,
/// not an enforced invariant; resolution is deterministic either way
/// because listing always orders by (min, max, id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScoringRule {
    pub id: Uuid,
    #[serde(rename = "min")]
    pub min_score: i32,
    #[serde(rename = "max")]
    pub max_score: i32,
    pub action: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateScoringRule {
    #[validate(range(min = 0, max = 100))]
    pub min: i32,
    #[validate(range(min = 0, max = 100))]
    pub max: i32,
    #[validate(length(min = 1, max = 20))]
    pub action: String,
}

impl ScoringRule {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ScoringRule>(
            "SELECT * FROM scoring_rules ORDER BY min_score, max_score, id",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        min_score: i32,
        max_score: i32,
        action: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ScoringRule>(
            r#"
            UPDATE scoring_rules
            SET min_score = $2, max_score = $3, action = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(min_score)
        .bind(max_score)
        .bind(action)
        .fetch_optional(pool)
        .await
    }
}
