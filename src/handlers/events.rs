//! Event query handlers (dashboard read API)

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Serialize;

use crate::models::{ContinuationToken, EventFilter, RiskEvent};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Serialize)]
pub struct EventPage {
    pub data: Vec<RiskEvent>,
    pub count: usize,
    pub next_token: Option<String>,
}

/// List historical risk events, newest first
pub async fn list(
    State(state): State<AppState>,
    Query(filter): Query<EventFilter>,
) -> AppResult<Json<EventPage>> {
    let after = match filter.next_token.as_deref() {
        // Some dashboard clients send the literal string "null"
        Some(token) if !token.is_empty() && !token.eq_ignore_ascii_case("null") => Some(
            ContinuationToken::parse(token)
                .ok_or_else(|| AppError::ValidationError("invalid next_token".to_string()))?,
        ),
        _ => None,
    };

    let (events, next) = RiskEvent::list(&state.pool, &filter, after).await?;

    Ok(Json(EventPage {
        count: events.len(),
        next_token: next.map(|token| token.encode()),
        data: events,
    }))
}
