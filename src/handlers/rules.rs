//! Admin handlers for scoring configuration.
//!
//! Changes take effect on the next scored request; the pipeline re-reads
//! weights and ranges every time.

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::models::{RuleWeight, ScoringRule, UpdateRuleWeight, UpdateScoringRule};
use crate::{AppError, AppResult, AppState};

/// List scoring ranges
pub async fn list_rules(State(state): State<AppState>) -> AppResult<Json<Vec<ScoringRule>>> {
    let rules = ScoringRule::list(&state.pool).await?;
    Ok(Json(rules))
}

/// Update one scoring range
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateScoringRule>,
) -> AppResult<Json<ScoringRule>> {
    request
        .validate()
        .map_err(|err| AppError::ValidationError(err.to_string()))?;
    if request.min > request.max {
        return Err(AppError::ValidationError(
            "min must not exceed max".to_string(),
        ));
    }

    let rule = ScoringRule::update(&state.pool, id, request.min, request.max, &request.action)
        .await?
        .ok_or_else(|| AppError::NotFound("Scoring rule not found".to_string()))?;

    Ok(Json(rule))
}

/// List rule weights
pub async fn list_weights(State(state): State<AppState>) -> AppResult<Json<Vec<RuleWeight>>> {
    let weights = RuleWeight::list(&state.pool).await?;
    Ok(Json(weights))
}

/// Set one rule weight, creating it if the rule was never configured
pub async fn update_weight(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
    Json(request): Json<UpdateRuleWeight>,
) -> AppResult<Json<RuleWeight>> {
    request
        .validate()
        .map_err(|err| AppError::ValidationError(err.to_string()))?;

    let weight = RuleWeight::upsert(&state.pool, &rule_id, request.weight).await?;
    Ok(Json(weight))
}
