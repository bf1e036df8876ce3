//! Error types for supply-kit.
//!
//! # Error Hierarchy
//!
//! - [`Error`](enum@Error) — Main error type, returned by most operations
//!   - [`RpcError`] — Node transport and JSON-RPC failures
//!   - [`WalletError`] — Wallet unavailable, declined or failing
//!   - [`ParseProductIdError`] — User-entered identifier is not a `u64`
//!
//! Every variant renders a message that can be shown to a user as-is.
//!
//! # Example
//!
//! ```rust,no_run
//! use supply_kit::*;
//!
//! # async fn example(tracker: SupplyChain) {
//! match tracker.get_product_str("12x").await {
//!     Ok(Some(product)) => println!("{}", product.name),
//!     Ok(None) => println!("not found"),
//!     Err(Error::InvalidInput(e)) => println!("bad input: {e}"),
//!     Err(e) => println!("request failed: {e}"),
//! }
//! # }
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::types::{SendStatus, TransactionStatus};

/// Error parsing a product identifier typed by a user.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseProductIdError {
    #[error("Product ID is empty")]
    Empty,

    #[error("Product ID '{0}' is not a non-negative whole number")]
    NotANumber(String),

    #[error("Product ID '{0}' is too large")]
    Overflow(String),
}

/// Error parsing a product status.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown product status '{0}', expected manufactured, in_transit or delivered")]
pub struct ParseStatusError(pub String);

/// Error reported by a wallet.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("Wallet is not available. Make sure the wallet extension is installed")]
    Unavailable,

    #[error("Wallet is locked")]
    Locked,

    #[error("Request was declined in the wallet")]
    Declined,

    #[error("Wallet error: {0}")]
    Failed(String),
}

// ============================================================================
// RPC Errors
// ============================================================================

/// Errors talking to the Soroban RPC node.
#[derive(Debug, Error)]
pub enum RpcError {
    // ─── Network/Transport ───
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Network error: {message}")]
    Network {
        message: String,
        status_code: Option<u16>,
        retryable: bool,
    },

    #[error("Timeout after {0} attempts")]
    Timeout(u32),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ─── Generic RPC Error ───
    #[error("RPC error: {message} (code: {code})")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    // ─── Ledger Errors ───
    #[error("Account not found: {0}")]
    AccountNotFound(String),
}

impl RpcError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Http(e) => e.is_timeout() || e.is_connect(),
            RpcError::Timeout(_) => true,
            RpcError::Network { retryable, .. } => *retryable,
            // Internal error and server-defined errors
            RpcError::Rpc { code, .. } => *code == -32603 || (-32099..=-32000).contains(code),
            _ => false,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>, status_code: Option<u16>, retryable: bool) -> Self {
        RpcError::Network {
            message: message.into(),
            status_code,
            retryable,
        }
    }

    /// Returns true if this error indicates the account was not found.
    pub fn is_account_not_found(&self) -> bool {
        matches!(self, RpcError::AccountNotFound(_))
    }
}

// ============================================================================
// Main Error Type
// ============================================================================

/// Main error type for supply-kit operations.
#[derive(Debug, Error)]
pub enum Error {
    // ─── Configuration ───
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Wallet not connected. Call connect() first")]
    NotConnected,

    #[error("No wallet configured. Call .wallet() on SupplyChainBuilder")]
    NoWallet,

    // ─── Wallet ───
    #[error(transparent)]
    Wallet(#[from] WalletError),

    // ─── RPC ───
    #[error(transparent)]
    Rpc(#[from] RpcError),

    // ─── Input validation ───
    #[error(transparent)]
    InvalidInput(#[from] ParseProductIdError),

    #[error(transparent)]
    InvalidStatus(#[from] ParseStatusError),

    #[error("Another {0} request is already in progress")]
    Busy(&'static str),

    // ─── Simulation / preparation ───
    #[error("Simulation of {function} failed: {message}")]
    Simulation { function: String, message: String },

    #[error("Could not prepare transaction: {0}")]
    Prepare(String),

    // ─── Submission lifecycle ───
    #[error("Transaction {hash} was rejected on submission (status: {status})")]
    Submission {
        hash: String,
        status: SendStatus,
        error_result_xdr: Option<String>,
    },

    #[error("Transaction failed for {operation}. Status: {status}")]
    TransactionFailed {
        operation: String,
        hash: String,
        status: TransactionStatus,
    },

    #[error("Transaction {hash} was not confirmed within {waited:?}")]
    PollTimeout { hash: String, waited: Duration },

    /// `hash` is `None` when the request was cancelled before it was sent.
    #[error("{}", cancelled_message(.hash))]
    Cancelled { hash: Option<String> },

    // ─── Encoding ───
    #[error("XDR error: {0}")]
    Xdr(#[from] stellar_xdr::curr::Error),

    #[error("Invalid strkey: {0}")]
    StrKey(#[from] stellar_strkey::DecodeError),

    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Could not decode {what}: {message}")]
    Decode { what: &'static str, message: String },
}

impl Error {
    pub(crate) fn decode(what: &'static str, message: impl std::fmt::Display) -> Self {
        Error::Decode {
            what,
            message: message.to_string(),
        }
    }

    /// Returns true if the error came from user input rather than the
    /// wallet or the network.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::InvalidStatus(_))
    }
}

fn cancelled_message(hash: &Option<String>) -> String {
    match hash {
        Some(hash) => format!("Waiting for transaction {hash} was cancelled"),
        None => "Request was cancelled before the transaction was sent".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_product_id_error_display() {
        assert_eq!(ParseProductIdError::Empty.to_string(), "Product ID is empty");
        assert_eq!(
            ParseProductIdError::NotANumber("abc".to_string()).to_string(),
            "Product ID 'abc' is not a non-negative whole number"
        );
        assert_eq!(
            ParseProductIdError::Overflow("99999999999999999999".to_string()).to_string(),
            "Product ID '99999999999999999999' is too large"
        );
    }

    #[test]
    fn test_wallet_error_display() {
        assert_eq!(
            WalletError::Unavailable.to_string(),
            "Wallet is not available. Make sure the wallet extension is installed"
        );
        assert_eq!(
            WalletError::Declined.to_string(),
            "Request was declined in the wallet"
        );
        assert_eq!(
            WalletError::Failed("boom".to_string()).to_string(),
            "Wallet error: boom"
        );
    }

    #[test]
    fn test_rpc_error_retryable() {
        assert!(RpcError::Timeout(3).is_retryable());
        assert!(RpcError::network("503", Some(503), true).is_retryable());
        assert!(!RpcError::network("400", Some(400), false).is_retryable());
        assert!(
            RpcError::Rpc {
                code: -32603,
                message: "internal".to_string(),
                data: None,
            }
            .is_retryable()
        );
        assert!(
            !RpcError::Rpc {
                code: -32602,
                message: "invalid params".to_string(),
                data: None,
            }
            .is_retryable()
        );
        assert!(!RpcError::AccountNotFound("GABC".to_string()).is_retryable());
    }

    #[test]
    fn test_transaction_failed_display() {
        let err = Error::TransactionFailed {
            operation: "Register Product".to_string(),
            hash: "ab".repeat(32),
            status: TransactionStatus::Failed,
        };
        assert_eq!(
            err.to_string(),
            "Transaction failed for Register Product. Status: FAILED"
        );
    }

    #[test]
    fn test_cancelled_display() {
        let err = Error::Cancelled {
            hash: Some("ab".repeat(32)),
        };
        assert_eq!(
            err.to_string(),
            format!("Waiting for transaction {} was cancelled", "ab".repeat(32))
        );
        assert_eq!(
            Error::Cancelled { hash: None }.to_string(),
            "Request was cancelled before the transaction was sent"
        );
    }

    #[test]
    fn test_input_errors_are_classified() {
        assert!(Error::from(ParseProductIdError::Empty).is_input_error());
        assert!(Error::from(ParseStatusError("lost".to_string())).is_input_error());
        assert!(!Error::NotConnected.is_input_error());
    }

    #[test]
    fn test_transparent_wallet_error() {
        let err: Error = WalletError::Declined.into();
        assert_eq!(err.to_string(), "Request was declined in the wallet");
    }
}
