//! Testnet faucet client

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::ToolchainConfig;
use crate::error::{Result, ToolchainError};
use crate::types::FundingOutcome;

/// Request timeout for a single faucet call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// What a successful faucet request returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundingReceipt {
    /// Funding transaction id, when the faucet reported one
    pub txid: Option<String>,
}

/// Source of testnet funds
#[async_trait]
pub trait Faucet: Send + Sync {
    /// One funding attempt for `address`
    async fn request_funds(&self, address: &str) -> Result<FundingReceipt>;
}

/// Faucet reached over HTTP
///
/// Speaks the Liquid testnet faucet's query interface:
/// `GET <url>?address=<addr>&action=lbtc`.
pub struct HttpFaucet {
    url: String,
    client: Client,
}

impl HttpFaucet {
    pub fn new(config: &ToolchainConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ToolchainError::Faucet(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            url: config.faucet_url.clone(),
            client,
        })
    }
}

#[async_trait]
impl Faucet for HttpFaucet {
    async fn request_funds(&self, address: &str) -> Result<FundingReceipt> {
        debug!(url = %self.url, address = %address, "Requesting faucet funds");

        let response = self
            .client
            .get(&self.url)
            .query(&[("address", address), ("action", "lbtc")])
            .send()
            .await
            .map_err(|e| ToolchainError::Faucet(format!("Faucet request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolchainError::Faucet(format!("Failed to read faucet response: {}", e)))?;

        if !status.is_success() {
            return Err(ToolchainError::Faucet(format!(
                "Faucet returned {}: {}",
                status,
                excerpt(&body)
            )));
        }

        let txid = find_txid(&body);
        if txid.is_none() && reports_error(&body) {
            return Err(ToolchainError::Faucet(excerpt(&body)));
        }

        Ok(FundingReceipt { txid })
    }
}

/// Fund an address, retrying failed attempts after `delay`
pub async fn fund_with_retry(
    faucet: &dyn Faucet,
    address: &str,
    max_attempts: u32,
    delay: Duration,
) -> FundingOutcome {
    let max_attempts = max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match faucet.request_funds(address).await {
            Ok(receipt) => {
                info!(address = %address, attempt, txid = ?receipt.txid, "Address funded");
                return FundingOutcome {
                    success: true,
                    address: address.to_string(),
                    txid: receipt.txid,
                    attempts: attempt,
                    error: None,
                };
            }
            Err(e) => {
                warn!(address = %address, attempt, max_attempts, error = %e, "Faucet attempt failed");
                last_error = e.to_string();
                if attempt < max_attempts && !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    FundingOutcome {
        success: false,
        address: address.to_string(),
        txid: None,
        attempts: max_attempts,
        error: Some(last_error),
    }
}

/// First standalone 64-hex-digit run in a response body
pub fn find_txid(body: &str) -> Option<String> {
    body.split(|c: char| !c.is_ascii_hexdigit())
        .find(|run| run.len() == 64)
        .map(str::to_ascii_lowercase)
}

fn reports_error(body: &str) -> bool {
    let lower = body.to_ascii_lowercase();
    ["error", "invalid", "failed", "too many"]
        .iter()
        .any(|needle| lower.contains(needle))
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= 200 {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(200).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::ScriptedFaucet;

    const TXID: &str = "5a1f8c3e9b7d2a4c6e8f0a1b3c5d7e9f1a2b4c6d8e0f1a3b5c7d9e1f3a5b7c9d";

    #[test]
    fn test_find_txid_in_html() {
        let body = format!("<p>Sent 100000 sats to tex1q... in transaction {}</p>", TXID);
        assert_eq!(find_txid(&body).as_deref(), Some(TXID));
    }

    #[test]
    fn test_find_txid_ignores_longer_runs() {
        let long = "a".repeat(65);
        assert!(find_txid(&long).is_none());
        assert!(find_txid("no transaction here").is_none());
    }

    #[test]
    fn test_find_txid_lowercases() {
        let upper = TXID.to_ascii_uppercase();
        assert_eq!(find_txid(&upper).as_deref(), Some(TXID));
    }

    #[test]
    fn test_reports_error() {
        assert!(reports_error("Error: invalid address"));
        assert!(!reports_error("Sent!"));
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let faucet = ScriptedFaucet::new()
            .then_fail("rate limited")
            .then_fail("rate limited")
            .then_pay(TXID);

        let outcome = fund_with_retry(&faucet, "tex1q", 3, Duration::ZERO).await;
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.txid.as_deref(), Some(TXID));
        assert_eq!(faucet.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_retry_exhausted() {
        let faucet = ScriptedFaucet::new().then_fail("down").then_fail("still down");

        let outcome = fund_with_retry(&faucet, "tex1q", 2, Duration::ZERO).await;
        assert!(!outcome.success);
        assert_eq!(outcome.attempts, 2);
        assert!(outcome.error.unwrap().contains("still down"));
    }

    #[tokio::test]
    async fn test_zero_attempts_still_tries_once() {
        let faucet = ScriptedFaucet::paying(TXID);
        let outcome = fund_with_retry(&faucet, "tex1q", 0, Duration::ZERO).await;
        assert!(outcome.success);
        assert_eq!(outcome.attempts, 1);
    }
}
