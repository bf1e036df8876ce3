//! Signing and submission of state-changing calls.
//!
//! A submission runs four steps against the chain and the wallet:
//!
//! 1. **Prepare**: simulate and attach footprint, resource fee and auth.
//! 2. **Sign**: hand the prepared envelope to the wallet.
//! 3. **Send**: submit the signed envelope; only `PENDING` is accepted.
//! 4. **Poll**: ask for the transaction status every [`PollConfig::interval`]
//!    until it leaves `NOT_FOUND`, the deadline passes, or the wait is
//!    cancelled.

use std::sync::Arc;
use std::time::Duration;

use futures::future::{self, Either};
use stellar_xdr::curr::{ScVal, TransactionEnvelope};
use tokio::time::Instant;

use crate::error::Error;
use crate::types::{SendStatus, TransactionStatus, from_base64, to_base64, to_native_opt};

use super::activity::CancelToken;
use super::chain::ChainClient;
use super::wallet::{SignOptions, Wallet};

/// How to wait for a submitted transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between status requests.
    pub interval: Duration,
    /// Give up after this long. `None` waits indefinitely.
    pub max_wait: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_wait: Some(Duration::from_secs(60)),
        }
    }
}

impl PollConfig {
    /// Poll until a terminal status, however long it takes.
    pub fn unbounded() -> Self {
        Self {
            max_wait: None,
            ..Self::default()
        }
    }
}

/// A transaction that reached `SUCCESS`.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionOutcome {
    pub hash: String,
    pub ledger: Option<u32>,
    pub status: TransactionStatus,
    pub return_value: Option<ScVal>,
}

impl TransactionOutcome {
    /// The return value decoded to plain data.
    pub fn native_return(&self) -> serde_json::Value {
        to_native_opt(self.return_value.as_ref())
    }
}

/// A submitted transaction being waited on.
struct PendingTransaction {
    hash: String,
    attempts: u32,
    started: Instant,
}

/// Prepares, signs, submits and confirms transactions.
pub struct Submitter {
    chain: Arc<dyn ChainClient>,
    wallet: Arc<dyn Wallet>,
    passphrase: String,
    poll: PollConfig,
}

impl Submitter {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        wallet: Arc<dyn Wallet>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            wallet,
            passphrase: passphrase.into(),
            poll: PollConfig::default(),
        }
    }

    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Submit an unprepared envelope and wait for its final status.
    ///
    /// `operation` names the request in error messages.
    pub async fn submit(
        &self,
        envelope: &TransactionEnvelope,
        operation: &str,
    ) -> Result<TransactionOutcome, Error> {
        self.submit_with_cancel(envelope, operation, &CancelToken::new())
            .await
    }

    /// Like [`submit`](Self::submit), stopping early when `cancel` fires.
    pub async fn submit_with_cancel(
        &self,
        envelope: &TransactionEnvelope,
        operation: &str,
        cancel: &CancelToken,
    ) -> Result<TransactionOutcome, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled { hash: None });
        }

        let prepared = self
            .chain
            .prepare_transaction(envelope)
            .await
            .map_err(|e| match e {
                Error::Prepare(_) => e,
                other => Error::Prepare(other.to_string()),
            })?;

        let options = SignOptions::new(self.passphrase.clone());
        let signed_xdr = self
            .wallet
            .sign_transaction(&to_base64(&prepared)?, &options)
            .await?;
        let signed: TransactionEnvelope = from_base64(&signed_xdr)?;
        if cancel.is_cancelled() {
            tracing::debug!(operation, "cancelled before sending");
            return Err(Error::Cancelled { hash: None });
        }

        let sent = self.chain.send_transaction(&signed).await?;
        if sent.status != SendStatus::Pending {
            tracing::warn!(hash = %sent.hash, status = %sent.status, operation, "transaction rejected");
            return Err(Error::Submission {
                hash: sent.hash,
                status: sent.status,
                error_result_xdr: sent.error_result_xdr,
            });
        }
        tracing::info!(hash = %sent.hash, operation, "transaction submitted");

        let mut pending = PendingTransaction {
            hash: sent.hash,
            attempts: 0,
            started: Instant::now(),
        };

        let response = loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled {
                    hash: Some(pending.hash),
                });
            }

            let response = self.chain.get_transaction(&pending.hash).await?;
            pending.attempts += 1;
            tracing::debug!(
                hash = %pending.hash,
                attempt = pending.attempts,
                status = %response.status,
                "polled transaction"
            );
            if response.status.is_terminal() {
                break response;
            }

            let waited = pending.started.elapsed();
            if self.poll.max_wait.is_some_and(|max| waited >= max) {
                tracing::warn!(hash = %pending.hash, ?waited, "gave up waiting for transaction");
                return Err(Error::PollTimeout {
                    hash: pending.hash,
                    waited,
                });
            }

            let tick = Box::pin(tokio::time::sleep(self.poll.interval));
            let cancelled = Box::pin(cancel.cancelled());
            if let Either::Right(_) = future::select(tick, cancelled).await {
                return Err(Error::Cancelled {
                    hash: Some(pending.hash),
                });
            }
        };

        tracing::info!(hash = %pending.hash, status = %response.status, operation, "transaction finished");

        if response.status != TransactionStatus::Success {
            return Err(Error::TransactionFailed {
                operation: operation.to_string(),
                hash: pending.hash,
                status: response.status,
            });
        }

        Ok(TransactionOutcome {
            return_value: response.return_value()?,
            hash: pending.hash,
            ledger: response.ledger,
            status: response.status,
        })
    }
}

impl std::fmt::Debug for Submitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Submitter")
            .field("passphrase", &self.passphrase)
            .field("poll", &self.poll)
            .finish()
    }
}
