//! Soroban RPC response types.
//!
//! Field names follow the node's camelCase JSON. XDR payloads stay base64
//! strings here and are decoded on demand by the accessor methods.

use std::fmt;

use serde::Deserialize;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use stellar_xdr::curr::{
    LedgerEntryData, ScVal, SorobanAuthorizationEntry, SorobanTransactionData, TransactionMeta,
};

use crate::error::Error;

use super::transaction::from_base64;

// ============================================================================
// Ledger entries
// ============================================================================

/// One entry from `getLedgerEntries`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryResult {
    pub key: String,
    pub xdr: String,
    #[serde(default)]
    pub last_modified_ledger_seq: Option<u32>,
    #[serde(default)]
    pub live_until_ledger_seq: Option<u32>,
}

impl LedgerEntryResult {
    pub fn data(&self) -> Result<LedgerEntryData, Error> {
        from_base64(&self.xdr)
    }
}

/// Response of `getLedgerEntries`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLedgerEntriesResponse {
    #[serde(default)]
    pub entries: Option<Vec<LedgerEntryResult>>,
    pub latest_ledger: u32,
}

// ============================================================================
// Simulation
// ============================================================================

/// Result of one simulated host function.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulateHostFunctionResult {
    #[serde(default)]
    pub auth: Vec<String>,
    pub xdr: String,
}

/// Present when the simulated call touches archived entries.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestorePreamble {
    pub transaction_data: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub min_resource_fee: i64,
}

/// Response of `simulateTransaction`.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateTransactionResponse {
    pub latest_ledger: u32,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub min_resource_fee: Option<i64>,
    #[serde(default)]
    pub results: Option<Vec<SimulateHostFunctionResult>>,
    #[serde(default)]
    pub transaction_data: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<String>>,
    #[serde(default)]
    pub restore_preamble: Option<RestorePreamble>,
}

impl SimulateTransactionResponse {
    /// The simulation ran and nothing has to be restored first.
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.restore_preamble.is_none()
    }

    /// Human readable reason the simulation cannot be used, if any.
    pub fn failure_message(&self) -> Option<String> {
        if let Some(error) = &self.error {
            return Some(error.clone());
        }
        self.restore_preamble
            .as_ref()
            .map(|_| "contract state is archived and must be restored first".to_string())
    }

    /// Return value of the first (and only) invoked host function.
    pub fn return_value(&self) -> Result<Option<ScVal>, Error> {
        match self.results.as_deref().and_then(<[_]>::first) {
            Some(result) => from_base64(&result.xdr).map(Some),
            None => Ok(None),
        }
    }

    /// Authorization entries the invocation requires.
    pub fn auth_entries(&self) -> Result<Vec<SorobanAuthorizationEntry>, Error> {
        self.results
            .as_deref()
            .and_then(<[_]>::first)
            .map(|result| result.auth.iter().map(|a| from_base64(a)).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    /// Resource footprint and fee data to attach to the transaction.
    pub fn soroban_data(&self) -> Result<Option<SorobanTransactionData>, Error> {
        self.transaction_data
            .as_deref()
            .map(from_base64)
            .transpose()
    }
}

// ============================================================================
// Submission
// ============================================================================

/// Status returned by `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum SendStatus {
    /// Accepted into the queue.
    Pending,
    /// Already seen by the node.
    Duplicate,
    /// Node is overloaded.
    TryAgainLater,
    /// Rejected; see `errorResultXdr`.
    Error,
    Other(String),
}

impl From<String> for SendStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => SendStatus::Pending,
            "DUPLICATE" => SendStatus::Duplicate,
            "TRY_AGAIN_LATER" => SendStatus::TryAgainLater,
            "ERROR" => SendStatus::Error,
            _ => SendStatus::Other(s),
        }
    }
}

impl fmt::Display for SendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendStatus::Pending => f.write_str("PENDING"),
            SendStatus::Duplicate => f.write_str("DUPLICATE"),
            SendStatus::TryAgainLater => f.write_str("TRY_AGAIN_LATER"),
            SendStatus::Error => f.write_str("ERROR"),
            SendStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Response of `sendTransaction`.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub hash: String,
    pub status: SendStatus,
    pub latest_ledger: u32,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub latest_ledger_close_time: Option<i64>,
    #[serde(default)]
    pub error_result_xdr: Option<String>,
}

// ============================================================================
// Transaction status
// ============================================================================

/// Status returned by `getTransaction`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum TransactionStatus {
    Success,
    /// Not yet observed by the node.
    NotFound,
    Failed,
    Other(String),
}

impl TransactionStatus {
    /// Everything except `NOT_FOUND` is final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::NotFound)
    }
}

impl From<String> for TransactionStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "SUCCESS" => TransactionStatus::Success,
            "NOT_FOUND" => TransactionStatus::NotFound,
            "FAILED" => TransactionStatus::Failed,
            _ => TransactionStatus::Other(s),
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionStatus::Success => f.write_str("SUCCESS"),
            TransactionStatus::NotFound => f.write_str("NOT_FOUND"),
            TransactionStatus::Failed => f.write_str("FAILED"),
            TransactionStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Response of `getTransaction`.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetTransactionResponse {
    pub status: TransactionStatus,
    pub latest_ledger: u32,
    #[serde(default)]
    pub ledger: Option<u32>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub application_order: Option<u32>,
    #[serde(default)]
    pub envelope_xdr: Option<String>,
    #[serde(default)]
    pub result_xdr: Option<String>,
    #[serde(default)]
    pub result_meta_xdr: Option<String>,
}

impl GetTransactionResponse {
    /// A response for a hash the node has not seen yet.
    pub fn not_found(latest_ledger: u32) -> Self {
        Self {
            status: TransactionStatus::NotFound,
            latest_ledger,
            ledger: None,
            created_at: None,
            application_order: None,
            envelope_xdr: None,
            result_xdr: None,
            result_meta_xdr: None,
        }
    }

    /// Return value of the invoked contract function, read from the result meta.
    pub fn return_value(&self) -> Result<Option<ScVal>, Error> {
        let Some(meta) = self.result_meta_xdr.as_deref() else {
            return Ok(None);
        };
        let meta: TransactionMeta = from_base64(meta)?;
        Ok(match meta {
            TransactionMeta::V3(v3) => v3.soroban_meta.map(|m| m.return_value),
            TransactionMeta::V4(v4) => v4.soroban_meta.and_then(|m| m.return_value),
            _ => None,
        })
    }
}

// ============================================================================
// Node info
// ============================================================================

/// Response of `getHealth`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetHealthResponse {
    pub status: String,
    #[serde(default)]
    pub latest_ledger: Option<u32>,
    #[serde(default)]
    pub oldest_ledger: Option<u32>,
    #[serde(default)]
    pub ledger_retention_window: Option<u32>,
}

/// Response of `getNetwork`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetNetworkResponse {
    pub passphrase: String,
    pub protocol_version: u32,
    #[serde(default)]
    pub friendbot_url: Option<String>,
}

/// Response of `getLatestLedger`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLatestLedgerResponse {
    pub id: String,
    pub protocol_version: u32,
    pub sequence: u32,
}
