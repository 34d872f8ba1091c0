// crates/strata-remote/src/ledger.rs
//
// HTTP ledger client: queries `GET {base}/v1/balances/{identity}` and maps
// the response onto the engine's classification. Performs no pacing or
// retries of its own; the engine's ledger gate owns that.

use async_trait::async_trait;
use serde::Deserialize;

use strata_core::{LedgerClient, LedgerError, LedgerRecord, LedgerResponse};

/// Response envelope: `{ "balance": { ... } }`.
#[derive(Debug, Deserialize)]
struct BalanceEnvelope {
    balance: BalanceBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceBody {
    /// The ledger reports balances as decimal strings.
    #[serde(default)]
    balance: Option<serde_json::Value>,
    #[serde(default)]
    valid_for_tick: Option<u64>,
    #[serde(default)]
    number_of_incoming_transfers: Option<u32>,
    #[serde(default)]
    number_of_outgoing_transfers: Option<u32>,
}

/// Ledger client over the ledger node's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpLedgerClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLedgerClient {
    /// Create a client for the given base URL (e.g. `https://rpc.example.org`).
    ///
    /// The connect/read timeout here is a transport-level guard; the
    /// engine's per-call timeout still applies on top.
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn query(&self, identity: &str) -> Result<LedgerResponse, LedgerError> {
        let url = format!("{}/v1/balances/{}", self.base_url, identity);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LedgerError::Network(format!("HTTP error: {}", e)))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(LedgerResponse::NotFound);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LedgerError::RateLimited);
        }
        if !status.is_success() {
            return Err(LedgerError::Network(format!(
                "unexpected status {} from {}",
                status, url
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| LedgerError::Network(format!("failed to read body: {}", e)))?;

        parse_balance_body(&body)
    }
}

/// Parse a 200-status body into a ledger response.
///
/// Some ledger gateways answer 200 with an error object instead of an HTTP
/// error code; a well-formed "not found" message there is still a
/// definitive negative.
fn parse_balance_body(body: &str) -> Result<LedgerResponse, LedgerError> {
    if let Ok(envelope) = serde_json::from_str::<BalanceEnvelope>(body) {
        let balance = match envelope.balance.balance {
            Some(serde_json::Value::String(s)) => s.parse::<u64>().unwrap_or(0),
            Some(serde_json::Value::Number(n)) => n.as_u64().unwrap_or(0),
            _ => 0,
        };
        return Ok(LedgerResponse::Found(LedgerRecord {
            balance,
            valid_for_tick: envelope.balance.valid_for_tick,
            incoming_transfers: envelope.balance.number_of_incoming_transfers.unwrap_or(0),
            outgoing_transfers: envelope.balance.number_of_outgoing_transfers.unwrap_or(0),
        }));
    }

    let lowered = body.to_ascii_lowercase();
    if lowered.contains("not found") || lowered.contains("does not exist") {
        return Ok(LedgerResponse::NotFound);
    }
    if lowered.contains("too many requests") {
        return Err(LedgerError::RateLimited);
    }

    // Char-based truncation: the body is arbitrary bytes-as-text and byte
    // slicing could land inside a multibyte character.
    Err(LedgerError::Network(format!(
        "unparseable ledger response: {}",
        body.chars().take(200).collect::<String>()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_balance_body() {
        let body = r#"{
            "balance": {
                "id": "ABC",
                "balance": "12345",
                "validForTick": 19000000,
                "numberOfIncomingTransfers": 3,
                "numberOfOutgoingTransfers": 1
            }
        }"#;
        match parse_balance_body(body).unwrap() {
            LedgerResponse::Found(record) => {
                assert_eq!(record.balance, 12345);
                assert_eq!(record.valid_for_tick, Some(19000000));
                assert_eq!(record.incoming_transfers, 3);
                assert_eq!(record.outgoing_transfers, 1);
            }
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_numeric_balance() {
        let body = r#"{ "balance": { "balance": 99 } }"#;
        match parse_balance_body(body).unwrap() {
            LedgerResponse::Found(record) => assert_eq!(record.balance, 99),
            other => panic!("expected Found, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_zero_balance_is_still_found() {
        let body = r#"{ "balance": { "balance": "0" } }"#;
        assert!(matches!(
            parse_balance_body(body).unwrap(),
            LedgerResponse::Found(_)
        ));
    }

    #[test]
    fn test_body_level_not_found_is_definitive() {
        let body = r#"{ "error": "identity not found" }"#;
        assert_eq!(parse_balance_body(body).unwrap(), LedgerResponse::NotFound);
    }

    #[test]
    fn test_body_level_rate_limit_is_retryable() {
        let body = "Too Many Requests";
        assert_eq!(parse_balance_body(body), Err(LedgerError::RateLimited));
    }

    #[test]
    fn test_garbage_body_is_network_error() {
        assert!(matches!(
            parse_balance_body("<html>gateway error</html>"),
            Err(LedgerError::Network(_))
        ));
    }

    #[test]
    fn test_long_multibyte_garbage_body_is_network_error() {
        // Over 200 bytes of multibyte characters; truncation for the error
        // message must not split a character.
        let body = "€".repeat(150);
        assert!(matches!(
            parse_balance_body(&body),
            Err(LedgerError::Network(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = HttpLedgerClient::new("https://rpc.example.org/");
        assert_eq!(client.base_url, "https://rpc.example.org");
    }
}
