//! Rule weight model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use validator::Validate;

/// Configurable contribution of one scoring rule to the total score.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RuleWeight {
    pub rule_id: String,
    pub weight: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRuleWeight {
    #[validate(range(min = -100, max = 100))]
    pub weight: i32,
}

impl RuleWeight {
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, RuleWeight>("SELECT * FROM rule_weights ORDER BY rule_id")
            .fetch_all(pool)
            .await
    }

    /// Set a rule's weight, creating the row if the rule was never
    /// configured before.
    pub async fn upsert(pool: &PgPool, rule_id: &str, weight: i32) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RuleWeight>(
            r#"
            INSERT INTO rule_weights (rule_id, weight, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (rule_id) DO UPDATE SET weight = EXCLUDED.weight, updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(rule_id)
        .bind(weight)
        .fetch_one(pool)
        .await
    }
}
