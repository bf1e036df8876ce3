//! Low-level JSON-RPC client for Soroban RPC.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use stellar_xdr::curr::{LedgerEntryData, TransactionEnvelope};

use crate::error::RpcError;
use crate::types::{
    AccountKey, GetHealthResponse, GetLatestLedgerResponse, GetLedgerEntriesResponse,
    GetNetworkResponse, GetTransactionResponse, SendTransactionResponse,
    SimulateTransactionResponse, SourceAccount, to_base64,
};

/// Soroban RPC endpoint of the SDF test network.
pub const TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org";

/// Soroban RPC endpoint of the SDF future network.
pub const FUTURENET_RPC_URL: &str = "https://rpc-futurenet.stellar.org";

/// Retry configuration for RPC calls.
///
/// Nothing is retried unless `max_retries` is raised.
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial delay in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

/// JSON-RPC request structure.
#[derive(Serialize)]
struct JsonRpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

/// JSON-RPC response structure.
#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Low-level JSON-RPC client for a Soroban RPC node.
pub struct RpcClient {
    url: String,
    client: reqwest::Client,
    retry_config: RetryConfig,
    request_id: AtomicU64,
}

impl RpcClient {
    /// Create a new RPC client with the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_retry_config(url, RetryConfig::default())
    }

    /// Create a new RPC client with custom retry configuration.
    pub fn with_retry_config(url: impl Into<String>, retry_config: RetryConfig) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            retry_config,
            request_id: AtomicU64::new(0),
        }
    }

    /// Get the RPC URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a raw RPC call, retrying transient failures per the retry config.
    pub async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RpcError> {
        let total_attempts = self.retry_config.max_retries + 1;

        for attempt in 0..total_attempts {
            let request_id = self.request_id.fetch_add(1, Ordering::Relaxed);

            let request = JsonRpcRequest {
                jsonrpc: "2.0",
                id: request_id,
                method,
                params: &params,
            };

            tracing::debug!(method, request_id, attempt, "rpc request");

            match self.try_call::<R>(&request).await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < total_attempts - 1 => {
                    let delay = std::cmp::min(
                        self.retry_config.initial_delay_ms * 2u64.pow(attempt),
                        self.retry_config.max_delay_ms,
                    );
                    tracing::warn!(method, attempt, delay_ms = delay, error = %e, "retrying rpc request");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        Err(RpcError::Timeout(total_attempts))
    }

    /// Single attempt to make an RPC call.
    async fn try_call<R: DeserializeOwned>(
        &self,
        request: &JsonRpcRequest<'_, impl Serialize>,
    ) -> Result<R, RpcError> {
        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let retryable = is_retryable_status(status.as_u16());
            return Err(RpcError::network(
                format!("HTTP {}: {}", status, body),
                Some(status.as_u16()),
                retryable,
            ));
        }

        parse_response(&body)
    }

    // ========================================================================
    // Soroban RPC methods
    // ========================================================================

    /// Fetch an account's sequence number through `getLedgerEntries`.
    pub async fn get_account(&self, key: &AccountKey) -> Result<SourceAccount, RpcError> {
        let ledger_key = to_base64(&key.ledger_key())
            .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
        let response: GetLedgerEntriesResponse = self
            .call("getLedgerEntries", serde_json::json!({ "keys": [ledger_key] }))
            .await?;

        let entry = response
            .entries
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| RpcError::AccountNotFound(key.to_string()))?;

        match entry.data() {
            Ok(LedgerEntryData::Account(account)) => {
                Ok(SourceAccount::new(*key, account.seq_num.0))
            }
            Ok(_) => Err(RpcError::InvalidResponse(
                "ledger entry is not an account".to_string(),
            )),
            Err(e) => Err(RpcError::InvalidResponse(e.to_string())),
        }
    }

    /// Dry-run a transaction and report its footprint, fee and return value.
    pub async fn simulate_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulateTransactionResponse, RpcError> {
        let transaction = encode_envelope(envelope)?;
        self.call(
            "simulateTransaction",
            serde_json::json!({ "transaction": transaction }),
        )
        .await
    }

    /// Submit a signed transaction. Does not wait for it to be applied.
    pub async fn send_transaction(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SendTransactionResponse, RpcError> {
        let transaction = encode_envelope(envelope)?;
        self.call(
            "sendTransaction",
            serde_json::json!({ "transaction": transaction }),
        )
        .await
    }

    /// Look up a submitted transaction by hash.
    pub async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, RpcError> {
        self.call("getTransaction", serde_json::json!({ "hash": hash }))
            .await
    }

    /// Node health.
    pub async fn health(&self) -> Result<GetHealthResponse, RpcError> {
        self.call("getHealth", serde_json::json!({})).await
    }

    /// Network passphrase and protocol version the node serves.
    pub async fn network(&self) -> Result<GetNetworkResponse, RpcError> {
        self.call("getNetwork", serde_json::json!({})).await
    }

    /// Most recent ledger known to the node.
    pub async fn latest_ledger(&self) -> Result<GetLatestLedgerResponse, RpcError> {
        self.call("getLatestLedger", serde_json::json!({})).await
    }
}

impl Clone for RpcClient {
    fn clone(&self) -> Self {
        Self {
            url: self.url.clone(),
            client: self.client.clone(),
            retry_config: self.retry_config.clone(),
            request_id: AtomicU64::new(0),
        }
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("url", &self.url)
            .field("retry_config", &self.retry_config)
            .finish()
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check if an HTTP status code is retryable.
fn is_retryable_status(status: u16) -> bool {
    // 408 Request Timeout, 429 Too Many Requests, 5xx Server Errors
    status == 408 || status == 429 || (500..600).contains(&status)
}

fn encode_envelope(envelope: &TransactionEnvelope) -> Result<String, RpcError> {
    to_base64(envelope).map_err(|e| RpcError::InvalidResponse(e.to_string()))
}

/// Parse a JSON-RPC response body into its result or error.
fn parse_response<R: DeserializeOwned>(body: &str) -> Result<R, RpcError> {
    let rpc_response: JsonRpcResponse<R> = serde_json::from_str(body).map_err(RpcError::Json)?;

    if let Some(error) = rpc_response.error {
        return Err(RpcError::Rpc {
            code: error.code,
            message: error.message,
            data: error.data,
        });
    }

    rpc_response
        .result
        .ok_or_else(|| RpcError::InvalidResponse("Missing result in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // RetryConfig tests
    // ========================================================================

    #[test]
    fn test_retry_config_default_does_not_retry() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.initial_delay_ms, 500);
        assert_eq!(config.max_delay_ms, 5000);
    }

    // ========================================================================
    // RpcClient tests
    // ========================================================================

    #[test]
    fn test_rpc_client_new() {
        let client = RpcClient::new(TESTNET_RPC_URL);
        assert_eq!(client.url(), "https://soroban-testnet.stellar.org");
    }

    #[test]
    fn test_rpc_client_clone_and_debug() {
        let config = RetryConfig {
            max_retries: 2,
            initial_delay_ms: 100,
            max_delay_ms: 1000,
        };
        let client = RpcClient::with_retry_config("http://localhost:8000/rpc", config);
        let cloned = client.clone();
        assert_eq!(cloned.url(), client.url());

        let debug = format!("{:?}", client);
        assert!(debug.contains("RpcClient"));
        assert!(debug.contains("localhost:8000"));
        assert!(debug.contains("max_retries: 2"));
    }

    #[test]
    fn test_request_serialization() {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "getTransaction",
            params: serde_json::json!({ "hash": "abc" }),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "jsonrpc": "2.0",
                "id": 7,
                "method": "getTransaction",
                "params": { "hash": "abc" }
            })
        );
    }

    // ========================================================================
    // Response parsing tests
    // ========================================================================

    #[test]
    fn test_parse_response_result() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"id":"aa","protocolVersion":22,"sequence":512}}"#;
        let ledger: GetLatestLedgerResponse = parse_response(body).unwrap();
        assert_eq!(ledger.sequence, 512);
    }

    #[test]
    fn test_parse_response_error() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32602,"message":"invalid parameters"}}"#;
        let err = parse_response::<GetLatestLedgerResponse>(body).unwrap_err();
        match err {
            RpcError::Rpc { code, message, .. } => {
                assert_eq!(code, -32602);
                assert_eq!(message, "invalid parameters");
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_response_missing_result() {
        let body = r#"{"jsonrpc":"2.0","id":1}"#;
        let err = parse_response::<GetLatestLedgerResponse>(body).unwrap_err();
        assert!(matches!(err, RpcError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_response_bad_json() {
        let err = parse_response::<GetLatestLedgerResponse>("<html>").unwrap_err();
        assert!(matches!(err, RpcError::Json(_)));
    }

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(408));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(599));

        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
    }
}
