//! Scripted fakes for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::FutureExt;
use futures::future::BoxFuture;
use stellar_xdr::curr::{Limits, ScVal, TransactionEnvelope, WriteXdr};

use crate::error::{Error, WalletError};
use crate::types::{
    AccountKey, GetTransactionResponse, SendStatus, SendTransactionResponse,
    SimulateTransactionResponse, SourceAccount, TransactionStatus, to_base64,
};

use super::chain::ChainClient;
use super::wallet::{SignOptions, Wallet};

pub(crate) const TX_HASH: &str = "5f8cbd2c2a5e7a1fc9ac3bfd0c2b1e3a9d4b5e6f708192a3b4c5d6e7f8091a2b";

/// A `SorobanTransactionData` with an empty footprint and the given
/// resource fee, as base64 XDR.
pub(crate) fn soroban_data_b64(resource_fee: i64) -> String {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0u32.to_be_bytes()); // ext
    bytes.extend_from_slice(&0u32.to_be_bytes()); // read_only
    bytes.extend_from_slice(&0u32.to_be_bytes()); // read_write
    bytes.extend_from_slice(&1_000u32.to_be_bytes()); // instructions
    bytes.extend_from_slice(&200u32.to_be_bytes()); // read bytes
    bytes.extend_from_slice(&100u32.to_be_bytes()); // write bytes
    bytes.extend_from_slice(&resource_fee.to_be_bytes());
    STANDARD.encode(bytes)
}

/// `TransactionMeta::V3` with no ledger changes and a soroban meta carrying
/// `value`, as base64 XDR.
pub(crate) fn meta_v3_with_return(value: &ScVal) -> String {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&3u32.to_be_bytes()); // TransactionMeta::V3
    bytes.extend_from_slice(&0u32.to_be_bytes()); // ext
    bytes.extend_from_slice(&0u32.to_be_bytes()); // tx_changes_before
    bytes.extend_from_slice(&0u32.to_be_bytes()); // operations
    bytes.extend_from_slice(&0u32.to_be_bytes()); // tx_changes_after
    bytes.extend_from_slice(&1u32.to_be_bytes()); // soroban_meta: Some
    bytes.extend_from_slice(&0u32.to_be_bytes()); // soroban ext
    bytes.extend_from_slice(&0u32.to_be_bytes()); // events
    bytes.extend_from_slice(&value.to_xdr(Limits::none()).unwrap());
    bytes.extend_from_slice(&0u32.to_be_bytes()); // diagnostic_events
    STANDARD.encode(bytes)
}

pub(crate) fn simulation_ok(retval: &ScVal) -> SimulateTransactionResponse {
    serde_json::from_value(serde_json::json!({
        "latestLedger": 100,
        "minResourceFee": "1000",
        "results": [{ "auth": [], "xdr": to_base64(retval).unwrap() }],
        "transactionData": soroban_data_b64(1000),
    }))
    .unwrap()
}

pub(crate) fn simulation_err(message: &str) -> SimulateTransactionResponse {
    serde_json::from_value(serde_json::json!({
        "latestLedger": 100,
        "error": message,
    }))
    .unwrap()
}

pub(crate) fn sent(status: SendStatus) -> SendTransactionResponse {
    SendTransactionResponse {
        hash: TX_HASH.to_string(),
        status,
        latest_ledger: 100,
        latest_ledger_close_time: None,
        error_result_xdr: None,
    }
}

pub(crate) fn tx_status(status: TransactionStatus, retval: Option<&ScVal>) -> GetTransactionResponse {
    let mut response = GetTransactionResponse::not_found(101);
    response.status = status;
    response.ledger = Some(101);
    response.result_meta_xdr = retval.map(meta_v3_with_return);
    response
}

// ============================================================================
// FakeChain
// ============================================================================

/// A chain client answering from queues.
///
/// Empty queues fall back to: a successful simulation returning `Void`, a
/// `PENDING` submission, and `NOT_FOUND` forever.
#[derive(Default)]
pub(crate) struct FakeChain {
    simulations: Mutex<VecDeque<Result<SimulateTransactionResponse, Error>>>,
    sends: Mutex<VecDeque<Result<SendTransactionResponse, Error>>>,
    statuses: Mutex<VecDeque<Result<GetTransactionResponse, Error>>>,
    sent: Mutex<Vec<TransactionEnvelope>>,
    simulate_calls: AtomicUsize,
    get_calls: AtomicUsize,
}

impl FakeChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_simulation(&self, result: Result<SimulateTransactionResponse, Error>) {
        self.simulations.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_send(&self, result: Result<SendTransactionResponse, Error>) {
        self.sends.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_status(&self, result: Result<GetTransactionResponse, Error>) {
        self.statuses.lock().unwrap().push_back(result);
    }

    pub(crate) fn sent(&self) -> Vec<TransactionEnvelope> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn simulate_calls(&self) -> usize {
        self.simulate_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

impl ChainClient for FakeChain {
    fn get_account<'a>(&'a self, key: &'a AccountKey) -> BoxFuture<'a, Result<SourceAccount, Error>> {
        let account = SourceAccount::new(*key, 41);
        async move { Ok(account) }.boxed()
    }

    fn simulate_transaction<'a>(
        &'a self,
        _envelope: &'a TransactionEnvelope,
    ) -> BoxFuture<'a, Result<SimulateTransactionResponse, Error>> {
        self.simulate_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .simulations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(simulation_ok(&ScVal::Void)));
        async move { next }.boxed()
    }

    fn send_transaction<'a>(
        &'a self,
        envelope: &'a TransactionEnvelope,
    ) -> BoxFuture<'a, Result<SendTransactionResponse, Error>> {
        self.sent.lock().unwrap().push(envelope.clone());
        let next = self
            .sends
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(sent(SendStatus::Pending)));
        async move { next }.boxed()
    }

    fn get_transaction<'a>(
        &'a self,
        _hash: &'a str,
    ) -> BoxFuture<'a, Result<GetTransactionResponse, Error>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GetTransactionResponse::not_found(100)));
        async move { next }.boxed()
    }
}

// ============================================================================
// FakeWallet
// ============================================================================

/// A wallet with scripted answers. Signing returns the envelope unchanged.
pub(crate) struct FakeWallet {
    key: Option<AccountKey>,
    allowed: bool,
    grants_access: bool,
    declines_signing: bool,
    set_allowed_calls: AtomicUsize,
    sign_calls: AtomicUsize,
}

impl FakeWallet {
    pub(crate) fn allowed(key: [u8; 32]) -> Self {
        Self {
            key: Some(AccountKey::from_bytes(key)),
            allowed: true,
            grants_access: true,
            declines_signing: false,
            set_allowed_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn not_allowed(key: [u8; 32], grants_access: bool) -> Self {
        Self {
            allowed: false,
            grants_access,
            ..Self::allowed(key)
        }
    }

    pub(crate) fn unavailable() -> Self {
        Self {
            key: None,
            ..Self::allowed([0; 32])
        }
    }

    pub(crate) fn declining(key: [u8; 32]) -> Self {
        Self {
            declines_signing: true,
            ..Self::allowed(key)
        }
    }

    pub(crate) fn set_allowed_calls(&self) -> usize {
        self.set_allowed_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<AccountKey, WalletError> {
        self.key.ok_or(WalletError::Unavailable)
    }
}

impl Wallet for FakeWallet {
    fn is_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>> {
        let result = self.check_available().map(|_| self.allowed);
        async move { result }.boxed()
    }

    fn set_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>> {
        self.set_allowed_calls.fetch_add(1, Ordering::SeqCst);
        let result = self.check_available().map(|_| self.grants_access);
        async move { result }.boxed()
    }

    fn get_public_key(&self) -> BoxFuture<'_, Result<AccountKey, WalletError>> {
        let result = self.check_available();
        async move { result }.boxed()
    }

    fn sign_transaction<'a>(
        &'a self,
        xdr: &'a str,
        _options: &'a SignOptions,
    ) -> BoxFuture<'a, Result<String, WalletError>> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        let result = if self.declines_signing {
            Err(WalletError::Declined)
        } else {
            self.check_available().map(|_| xdr.to_string())
        };
        async move { result }.boxed()
    }
}
