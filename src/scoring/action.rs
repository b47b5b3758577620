//! Score to action resolution

use crate::models::ScoringRule;

/// Resolve the action for a score against the configured ranges.
///
/// The first range containing the score wins; callers pass ranges in the
/// store's deterministic (min, max, id) order. An empty or non-matching
/// range set yields the default action.
pub fn resolve_action(score: i32, rules: &[ScoringRule], default_action: &str) -> String {
    rules
        .iter()
        .find(|rule| rule.min_score <= score && score <= rule.max_score)
        .map(|rule| rule.action.clone())
        .unwrap_or_else(|| default_action.to_string())
}
