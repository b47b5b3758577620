//! Per-request decision pipeline.
//!
//! Orchestrates signal enrichment, scoring, action resolution and the two
//! side effects (event persistence, device registration). Every collaborator
//! failure degrades to a safe default; nothing on this path can prevent the
//! caller from receiving a decision.

use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::{KnownDevice, NewRiskEvent, RiskEvent, RuleWeight, ScoringRule};
use crate::reputation::{is_public_ip, IpReputation};
use crate::scoring::action::resolve_action;
use crate::scoring::engine::{calculate_risk_score, Signals, WeightTable};
use crate::AppState;

/// The gateway's answer for one login event.
#[derive(Debug, Serialize)]
pub struct Decision {
    pub score: i32,
    pub action: String,
    pub reason: Vec<String>,
}

/// Score one login event and record the outcome.
pub async fn evaluate(state: &AppState, signals: Signals) -> Decision {
    let pool = &state.pool;
    let policy = &state.config.policy;

    let known_device = match KnownDevice::is_known(pool, &signals.email, &signals.device_hash).await
    {
        Ok(known) => known,
        Err(err) => {
            tracing::warn!("Device lookup failed, treating device as unknown: {}", err);
            false
        }
    };

    // Private and unparsable source addresses never reach the provider
    let reputation = if is_public_ip(&signals.source_ip) {
        state.reputation.check(&signals.source_ip).await
    } else {
        IpReputation::unknown()
    };

    // One snapshot per request: a mid-flight admin edit cannot split a
    // single calculation across two weight sets
    let weights = match RuleWeight::list(pool).await {
        Ok(rows) => rows
            .into_iter()
            .map(|row| (row.rule_id, row.weight))
            .collect::<WeightTable>(),
        Err(err) => {
            tracing::warn!("Weight table unavailable, scoring with zero weights: {}", err);
            WeightTable::default()
        }
    };

    let (score, reasons) =
        calculate_risk_score(&signals, &reputation, known_device, &weights, policy);

    let action = match ScoringRule::list(pool).await {
        Ok(rules) => resolve_action(score, &rules, &policy.default_action),
        Err(err) => {
            tracing::warn!("Scoring rules unavailable, using default action: {}", err);
            policy.default_action.clone()
        }
    };

    let now = Utc::now();
    let event = NewRiskEvent {
        id: Uuid::new_v4(),
        email: signals.email.clone(),
        device_name: signals.device_name.clone(),
        device_hash: signals.device_hash.clone(),
        ip_address: signals.source_ip.clone(),
        score,
        action: action.clone(),
        reasons: reasons.clone(),
        country: reputation.country_code.clone(),
        abuse_score: reputation.abuse_score,
        created_at: now,
        expires_at: now + Duration::days(state.config.event_ttl_days),
    };
    if let Err(err) = RiskEvent::insert(pool, &event).await {
        tracing::error!("Failed to persist risk event {}: {}", event.id, err);
    }

    if !known_device {
        if let Err(err) =
            KnownDevice::register(pool, &signals.email, &signals.device_hash, now).await
        {
            tracing::warn!("Failed to register device for {}: {}", signals.email, err);
        }
    }

    Decision {
        score,
        action,
        reason: reasons,
    }
}
