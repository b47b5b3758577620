//! Risk event model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// A persisted scoring decision. Insert-only; rows age out via `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RiskEvent {
    pub id: Uuid,
    pub email: String,
    pub device_name: String,
    pub device_hash: String,
    pub ip_address: String,
    pub score: i32,
    pub action: String,
    pub reasons: serde_json::Value,
    pub country: String,
    pub abuse_score: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct NewRiskEvent {
    pub id: Uuid,
    pub email: String,
    pub device_name: String,
    pub device_hash: String,
    pub ip_address: String,
    pub score: i32,
    pub action: String,
    pub reasons: Vec<String>,
    pub country: String,
    pub abuse_score: i32,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Dashboard query filters, all optional
#[derive(Debug, Deserialize, Default)]
pub struct EventFilter {
    pub email: Option<String>,
    pub score_min: Option<i32>,
    pub country: Option<String>,
    pub action: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub next_token: Option<String>,
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// Opaque-to-the-caller cursor for keyset pagination over
/// `(created_at, id)` descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationToken {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl ContinuationToken {
    pub fn encode(&self) -> String {
        format!("{}.{}", self.created_at.timestamp_micros(), self.id)
    }

    pub fn parse(token: &str) -> Option<Self> {
        let (micros, id) = token.split_once('.')?;
        let micros: i64 = micros.parse().ok()?;
        Some(Self {
            created_at: DateTime::from_timestamp_micros(micros)?,
            id: id.parse().ok()?,
        })
    }
}

impl RiskEvent {
    pub async fn insert(pool: &PgPool, event: &NewRiskEvent) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO risk_events
                (id, email, device_name, device_hash, ip_address, score, action,
                 reasons, country, abuse_score, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(event.id)
        .bind(&event.email)
        .bind(&event.device_name)
        .bind(&event.device_hash)
        .bind(&event.ip_address)
        .bind(event.score)
        .bind(&event.action)
        .bind(serde_json::json!(event.reasons))
        .bind(&event.country)
        .bind(event.abuse_score)
        .bind(event.created_at)
        .bind(event.expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Filtered, newest-first page of events.
    ///
    /// Returns one page plus the cursor for the next one, if any. `after`
    /// must come from a previous page's cursor.
    pub async fn list(
        pool: &PgPool,
        filter: &EventFilter,
        after: Option<ContinuationToken>,
    ) -> Result<(Vec<RiskEvent>, Option<ContinuationToken>), sqlx::Error> {
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM risk_events WHERE 1=1");

        if let Some(email) = &filter.email {
            query.push(" AND email = ").push_bind(email.clone());
        }
        if let Some(score_min) = filter.score_min {
            if score_min > 0 {
                query.push(" AND score >= ").push_bind(score_min);
            }
        }
        if let Some(country) = &filter.country {
            query.push(" AND country = ").push_bind(country.clone());
        }
        if let Some(action) = &filter.action {
            query.push(" AND action = ").push_bind(action.clone());
        }
        if let Some(from_date) = filter.from_date {
            query.push(" AND created_at >= ").push_bind(from_date);
        }
        if let Some(cursor) = after {
            query
                .push(" AND (created_at, id) < (")
                .push_bind(cursor.created_at)
                .push(", ")
                .push_bind(cursor.id)
                .push(")");
        }

        // Fetch one extra row to know whether another page exists
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit + 1);

        let mut events: Vec<RiskEvent> = query.build_query_as().fetch_all(pool).await?;

        let next = if events.len() as i64 > limit {
            events.truncate(limit as usize);
            events.last().map(|event| ContinuationToken {
                created_at: event.created_at,
                id: event.id,
            })
        } else {
            None
        };

        Ok((events, next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuation_token_round_trips() {
        let token = ContinuationToken {
            created_at: DateTime::from_timestamp_micros(1_722_000_000_123_456).unwrap(),
            id: "7c9e6679-7425-40de-944b-e07fc1f90ae7".parse().unwrap(),
        };

        let parsed = ContinuationToken::parse(&token.encode()).unwrap();
        assert_eq!(parsed, token);
    }

    #[test]
    fn continuation_token_rejects_garbage() {
        assert!(ContinuationToken::parse("").is_none());
        assert!(ContinuationToken::parse("no-separator").is_none());
        assert!(ContinuationToken::parse("abc.7c9e6679-7425-40de-944b-e07fc1f90ae7").is_none());
        assert!(ContinuationToken::parse("1722000000123456.not-a-uuid").is_none());
        assert!(ContinuationToken::parse(".").is_none());
    }
}
