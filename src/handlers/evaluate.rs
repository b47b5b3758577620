//! Scoring endpoint.
//!
//! Deliberately fail-open: in the default lenient mode an unreadable body
//! is scored as an empty signal set and the caller always gets a decision.
//! `STRICT_BODY=true` turns parse failures into 400s instead.

use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::scoring::engine::Signals;
use crate::scoring::pipeline::{self, Decision};
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct EvaluateRequest {
    pub email: Option<String>,
    pub device_hash: Option<String>,
    pub device_name: Option<String>,
    pub timezone: Option<String>,
    pub language: Option<String>,
    pub user_agent: Option<String>,
}

/// Score a login event
pub async fn evaluate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<Decision>> {
    let request = parse_body(&body, state.config.strict_body)?;
    let signals = into_signals(request, client_ip(&headers));

    let decision = pipeline::evaluate(&state, signals).await;
    Ok(Json(decision))
}

fn parse_body(body: &[u8], strict: bool) -> Result<EvaluateRequest, AppError> {
    if body.is_empty() {
        return Ok(EvaluateRequest::default());
    }

    match serde_json::from_slice(body) {
        Ok(request) => Ok(request),
        Err(err) if strict => Err(AppError::ValidationError(format!(
            "invalid request body: {}",
            err
        ))),
        Err(err) => {
            tracing::debug!("Unparsable evaluate body, scoring empty signal set: {}", err);
            Ok(EvaluateRequest::default())
        }
    }
}

/// Best available client IP: first X-Forwarded-For entry, then X-Real-IP.
fn client_ip(headers: &HeaderMap) -> String {
    if let Some(value) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(ip) = value.split(',').next() {
            let ip = ip.trim();
            if !ip.is_empty() && ip != "unknown" {
                return ip.to_string();
            }
        }
    }

    if let Some(value) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let ip = value.trim();
        if !ip.is_empty() && ip != "unknown" {
            return ip.to_string();
        }
    }

    "0.0.0.0".to_string()
}

fn into_signals(request: EvaluateRequest, source_ip: String) -> Signals {
    Signals {
        email: request
            .email
            .filter(|email| !email.is_empty())
            .unwrap_or_else(|| format!("unknown_user@{}", Uuid::new_v4())),
        device_hash: request.device_hash.unwrap_or_else(|| "unknown".to_string()),
        device_name: request
            .device_name
            .unwrap_or_else(|| "unknown_device".to_string()),
        timezone: request.timezone,
        language: request.language,
        user_agent: request.user_agent,
        source_ip,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn lenient_mode_turns_garbage_into_an_empty_signal_set() {
        let request = parse_body(b"not json at all", false).unwrap();
        assert!(request.email.is_none());
        assert!(request.device_hash.is_none());

        let request = parse_body(b"", false).unwrap();
        assert!(request.email.is_none());
    }

    #[test]
    fn strict_mode_rejects_garbage() {
        let err = parse_body(b"{broken", true).unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        // An empty body is an empty signal set even in strict mode
        assert!(parse_body(b"", true).is_ok());
    }

    #[test]
    fn well_formed_bodies_parse_in_both_modes() {
        let body = br#"{"email":"a@x.com","device_hash":"d1","timezone":"America/Sao_Paulo"}"#;

        for strict in [false, true] {
            let request = parse_body(body, strict).unwrap();
            assert_eq!(request.email.as_deref(), Some("a@x.com"));
            assert_eq!(request.device_hash.as_deref(), Some("d1"));
            assert_eq!(request.timezone.as_deref(), Some("America/Sao_Paulo"));
            assert!(request.language.is_none());
        }
    }

    #[test]
    fn forwarded_header_wins_and_takes_the_first_entry() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_ip(&headers), "203.0.113.9");
    }

    #[test]
    fn real_ip_is_the_fallback_and_absent_headers_yield_unspecified() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));
        assert_eq!(client_ip(&headers), "198.51.100.2");

        assert_eq!(client_ip(&HeaderMap::new()), "0.0.0.0");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("unknown"));
        assert_eq!(client_ip(&headers), "0.0.0.0");
    }

    #[test]
    fn missing_identity_fields_get_the_documented_defaults() {
        let signals = into_signals(EvaluateRequest::default(), "0.0.0.0".to_string());

        assert!(signals.email.starts_with("unknown_user@"));
        assert_eq!(signals.device_hash, "unknown");
        assert_eq!(signals.device_name, "unknown_device");

        // Empty email is treated as absent
        let signals = into_signals(
            EvaluateRequest {
                email: Some(String::new()),
                ..Default::default()
            },
            "0.0.0.0".to_string(),
        );
        assert!(signals.email.starts_with("unknown_user@"));
    }
}
