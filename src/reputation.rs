//! IP reputation lookups via AbuseIPDB.
//!
//! Every failure path (missing key, timeout, rate limit, bad payload,
//! private address) collapses to [`IpReputation::unknown`] so the scoring
//! pipeline never has to handle a reputation error.

use std::net::IpAddr;
use std::time::Duration;

use serde::Deserialize;

use crate::config::Config;

/// Country code reported when the origin is unknown
pub const UNKNOWN_COUNTRY: &str = "ZZ";

/// Reputation of a source IP as seen by the abuse database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpReputation {
    /// Abuse confidence score, 0-100
    pub abuse_score: i32,
    /// ISO 3166-1 alpha-2 country code, "ZZ" when unknown
    pub country_code: String,
}

impl IpReputation {
    /// Sentinel for private addresses and failed lookups.
    pub fn unknown() -> Self {
        Self {
            abuse_score: 0,
            country_code: UNKNOWN_COUNTRY.to_string(),
        }
    }
}

/// True if the address is routable on the public internet.
///
/// Private, loopback, link-local, unspecified and unparsable addresses are
/// all treated as non-public; the reputation provider is never queried for
/// them.
pub fn is_public_ip(ip: &str) -> bool {
    match ip.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast())
        }
        Ok(IpAddr::V6(v6)) => {
            let segments = v6.segments();
            !(v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique-local
                || (segments[0] & 0xfe00) == 0xfc00
                // fe80::/10 link-local
                || (segments[0] & 0xffc0) == 0xfe80)
        }
        Err(_) => false,
    }
}

// Wire shape of the AbuseIPDB v2 check response
#[derive(Debug, Deserialize)]
struct CheckResponse {
    data: CheckData,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckData {
    abuse_confidence_score: Option<i32>,
    country_code: Option<String>,
}

/// AbuseIPDB client.
#[derive(Debug, Clone)]
pub struct ReputationClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ReputationClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.reputation_timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_url: config.abuseipdb_api_url.clone(),
            api_key: config.abuseipdb_api_key.clone(),
        }
    }

    /// Check if lookups are configured
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Look up the reputation of a public IP.
    ///
    /// Falls back to [`IpReputation::unknown`] on any error, including
    /// provider rate limits and timeouts.
    pub async fn check(&self, ip: &str) -> IpReputation {
        if !self.is_configured() {
            return IpReputation::unknown();
        }

        let response = self
            .http
            .get(&self.api_url)
            .query(&[("ipAddress", ip), ("maxAgeInDays", "90")])
            .header("Key", &self.api_key)
            .header("Accept", "application/json")
            .send()
            .await;

        let response = match response {
            Ok(resp) => resp,
            Err(err) => {
                tracing::warn!("Reputation lookup failed for {}: {}", ip, err);
                return IpReputation::unknown();
            }
        };

        if !response.status().is_success() {
            tracing::warn!(
                "Reputation provider returned {} for {}",
                response.status(),
                ip
            );
            return IpReputation::unknown();
        }

        match response.json::<CheckResponse>().await {
            Ok(body) => IpReputation {
                abuse_score: body.data.abuse_confidence_score.unwrap_or(0),
                country_code: body
                    .data
                    .country_code
                    .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
            },
            Err(err) => {
                tracing::warn!("Reputation payload unreadable for {}: {}", ip, err);
                IpReputation::unknown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn public_addresses_are_recognized() {
        assert!(is_public_ip("8.8.8.8"));
        assert!(is_public_ip("201.10.44.7"));
        assert!(is_public_ip("172.15.0.1"));
        assert!(is_public_ip("2001:4860:4860::8888"));
    }

    #[test]
    fn private_and_reserved_addresses_are_not_public() {
        assert!(!is_public_ip("10.1.2.3"));
        assert!(!is_public_ip("192.168.0.1"));
        assert!(!is_public_ip("172.16.5.5"));
        assert!(!is_public_ip("172.31.255.255"));
        assert!(!is_public_ip("127.0.0.1"));
        assert!(!is_public_ip("169.254.1.1"));
        assert!(!is_public_ip("0.0.0.0"));
        assert!(!is_public_ip("::1"));
        assert!(!is_public_ip("fe80::1"));
        assert!(!is_public_ip("fd12:3456::1"));
    }

    #[test]
    fn garbage_is_not_public() {
        assert!(!is_public_ip(""));
        assert!(!is_public_ip("unknown"));
        assert!(!is_public_ip("999.1.1.1"));
    }

    #[test]
    fn check_response_parses_provider_payload() {
        let body: CheckResponse = serde_json::from_str(
            r#"{"data":{"abuseConfidenceScore":87,"countryCode":"US","ipAddress":"8.8.8.8"}}"#,
        )
        .unwrap();
        assert_eq!(body.data.abuse_confidence_score, Some(87));
        assert_eq!(body.data.country_code.as_deref(), Some("US"));
    }

    #[test]
    fn check_response_tolerates_missing_fields() {
        let body: CheckResponse = serde_json::from_str(r#"{"data":{}}"#).unwrap();
        assert_eq!(body.data.abuse_confidence_score, None);
        assert_eq!(body.data.country_code, None);
    }

    #[test]
    fn unconfigured_client_short_circuits_to_sentinel() {
        std::env::remove_var("ABUSEIPDB_API_KEY");
        let client = ReputationClient::new(&Config::from_env());
        assert!(!client.is_configured());

        let reputation = tokio_test::block_on(client.check("8.8.8.8"));
        assert_eq!(reputation, IpReputation::unknown());
        assert_eq!(reputation.country_code, "ZZ");
        assert_eq!(reputation.abuse_score, 0);
    }
}
