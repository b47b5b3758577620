//! Weighted risk scoring.
//!
//! The engine is a pure function over the request's signals, the IP
//! reputation, the device-known flag and a weight snapshot. It performs no
//! I/O and cannot fail: missing or malformed signals fall into the penalty
//! branch of their check.

use std::collections::HashMap;

use crate::config::ScoringPolicy;
use crate::reputation::IpReputation;

// Rule ids, as stored in the rule_weights table
pub const RULE_DEVICE_UNKNOWN: &str = "device_unknown";
pub const RULE_DEVICE_KNOWN: &str = "device_known";
pub const RULE_UNEXPECTED_TIMEZONE: &str = "unexpected_timezone";
pub const RULE_NON_NATIVE_LANGUAGE: &str = "non_native_language";
pub const RULE_SUSPICIOUS_USERAGENT: &str = "suspicious_useragent";
pub const RULE_HIGH_ABUSE_SCORE: &str = "high_abuse_score";
pub const RULE_FOREIGN_COUNTRY: &str = "foreign_country";

// Human-readable reasons, appended in check order
pub const REASON_DEVICE_UNKNOWN: &str = "device not recognized";
pub const REASON_UNEXPECTED_TIMEZONE: &str = "unexpected timezone";
pub const REASON_NON_NATIVE_LANGUAGE: &str = "language does not match expected locale";
pub const REASON_SUSPICIOUS_USERAGENT: &str = "suspicious user agent (headless browser)";
pub const REASON_HIGH_ABUSE_SCORE: &str = "IP flagged by abuse database";
pub const REASON_FOREIGN_COUNTRY: &str = "login from outside home country";

/// Abuse confidence at or above which the IP counts as bad
pub const HIGH_ABUSE_THRESHOLD: i32 = 50;

/// Lowercase substrings that mark an automated user agent
const AUTOMATION_MARKERS: [&str; 2] = ["headless", "phantom"];

/// Contextual attributes of one login event.
#[derive(Debug, Clone, Default)]
pub struct Signals {
    pub email: String,
    pub device_hash: String,
    pub device_name: String,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub user_agent: Option<String>,
    pub source_ip: String,
}

/// Immutable snapshot of the rule_weights table for one calculation.
/// Unconfigured rules weigh 0.
#[derive(Debug, Clone, Default)]
pub struct WeightTable {
    weights: HashMap<String, i32>,
}

impl WeightTable {
    pub fn get(&self, rule_id: &str) -> i32 {
        self.weights.get(rule_id).copied().unwrap_or(0)
    }
}

impl<S: Into<String>> FromIterator<(S, i32)> for WeightTable {
    fn from_iter<I: IntoIterator<Item = (S, i32)>>(iter: I) -> Self {
        Self {
            weights: iter
                .into_iter()
                .map(|(rule_id, weight)| (rule_id.into(), weight))
                .collect(),
        }
    }
}

/// Score one login event.
///
/// Returns the clamped score and the reasons for every check that fired,
/// in check order. A recognized device adds its (usually zero) weight
/// without appending a reason.
pub fn calculate_risk_score(
    signals: &Signals,
    reputation: &IpReputation,
    known_device: bool,
    weights: &WeightTable,
    policy: &ScoringPolicy,
) -> (i32, Vec<String>) {
    let mut score: i64 = 0;
    let mut reasons = Vec::new();

    if !known_device {
        score += i64::from(weights.get(RULE_DEVICE_UNKNOWN));
        reasons.push(REASON_DEVICE_UNKNOWN.to_string());
    } else {
        score += i64::from(weights.get(RULE_DEVICE_KNOWN));
    }

    let timezone_expected = signals
        .timezone
        .as_deref()
        .is_some_and(|tz| policy.expected_timezones.iter().any(|expected| expected == tz));
    if !timezone_expected {
        score += i64::from(weights.get(RULE_UNEXPECTED_TIMEZONE));
        reasons.push(REASON_UNEXPECTED_TIMEZONE.to_string());
    }

    let language_expected = signals
        .language
        .as_deref()
        .unwrap_or("")
        .starts_with(&policy.expected_language_prefix);
    if !language_expected {
        score += i64::from(weights.get(RULE_NON_NATIVE_LANGUAGE));
        reasons.push(REASON_NON_NATIVE_LANGUAGE.to_string());
    }

    let user_agent = signals.user_agent.as_deref().unwrap_or("").to_lowercase();
    if AUTOMATION_MARKERS.iter().any(|marker| user_agent.contains(marker)) {
        score += i64::from(weights.get(RULE_SUSPICIOUS_USERAGENT));
        reasons.push(REASON_SUSPICIOUS_USERAGENT.to_string());
    }

    if reputation.abuse_score >= HIGH_ABUSE_THRESHOLD {
        score += i64::from(weights.get(RULE_HIGH_ABUSE_SCORE));
        reasons.push(REASON_HIGH_ABUSE_SCORE.to_string());
    }

    if reputation.country_code != policy.home_country {
        score += i64::from(weights.get(RULE_FOREIGN_COUNTRY));
        reasons.push(REASON_FOREIGN_COUNTRY.to_string());
    }

    (score.clamp(0, 100) as i32, reasons)
}
