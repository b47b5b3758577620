//! Database module - PostgreSQL connection and migrations

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Create database connection pool
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create tables if not exist
    sqlx::raw_sql(SCHEMA_SQL).execute(pool).await?;

    // Seed default ranges and weights so a fresh install scores sensibly
    sqlx::raw_sql(SEED_SQL).execute(pool).await?;

    tracing::info!("Database schema applied successfully");
    Ok(())
}

/// Periodically delete risk events past their retention window.
///
/// Events are insert-only; expiry is the only delete path and it never
/// runs inline with a request.
pub fn spawn_expiry_sweep(pool: PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            match sqlx::query("DELETE FROM risk_events WHERE expires_at < NOW()")
                .execute(&pool)
                .await
            {
                Ok(result) if result.rows_affected() > 0 => {
                    tracing::info!("Expired {} risk events", result.rows_affected());
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!("Risk event expiry sweep failed: {}", err);
                }
            }
        }
    });
}

/// Database schema SQL
const SCHEMA_SQL: &str = r#"
-- Risk events (one per scored login, insert-only)
CREATE TABLE IF NOT EXISTS risk_events (
    id UUID PRIMARY KEY,
    email VARCHAR(255) NOT NULL,
    device_name VARCHAR(255) NOT NULL,
    device_hash VARCHAR(255) NOT NULL,
    ip_address VARCHAR(45) NOT NULL,
    score INT NOT NULL,
    action VARCHAR(20) NOT NULL,
    reasons JSONB NOT NULL,
    country CHAR(2) NOT NULL,
    abuse_score INT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL
);

-- Rule weights (admin-editable scoring configuration)
CREATE TABLE IF NOT EXISTS rule_weights (
    rule_id VARCHAR(64) PRIMARY KEY,
    weight INT NOT NULL DEFAULT 0,
    updated_at TIMESTAMPTZ DEFAULT NOW()
);

-- Scoring rules (score range -> action)
CREATE TABLE IF NOT EXISTS scoring_rules (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    min_score INT NOT NULL,
    max_score INT NOT NULL,
    action VARCHAR(20) NOT NULL,
    updated_at TIMESTAMPTZ DEFAULT NOW()
);

-- Known devices (one row per recognized email/device pair)
CREATE TABLE IF NOT EXISTS known_devices (
    email VARCHAR(255) NOT NULL,
    device_hash VARCHAR(255) NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (email, device_hash)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_events_created ON risk_events(created_at DESC, id DESC);
CREATE INDEX IF NOT EXISTS idx_events_email ON risk_events(email);
CREATE INDEX IF NOT EXISTS idx_events_expires ON risk_events(expires_at);
"#;

/// Seed data SQL
const SEED_SQL: &str = r#"
-- Default action ranges, only when the table has never been configured
INSERT INTO scoring_rules (min_score, max_score, action)
SELECT v.min_score, v.max_score, v.action
FROM (VALUES (0, 40, 'ALLOW'), (41, 70, 'REVIEW'), (71, 100, 'BLOCK'))
    AS v(min_score, max_score, action)
WHERE NOT EXISTS (SELECT 1 FROM scoring_rules);

-- Known rule ids with starter weights; admin edits are never overwritten
INSERT INTO rule_weights (rule_id, weight) VALUES
    ('device_unknown', 30),
    ('device_known', 0),
    ('unexpected_timezone', 10),
    ('non_native_language', 10),
    ('suspicious_useragent', 20),
    ('high_abuse_score', 25),
    ('foreign_country', 15)
ON CONFLICT (rule_id) DO NOTHING;
"#;
