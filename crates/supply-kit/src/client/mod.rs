//! Client module for the supply-chain tracker.
//!
//! - [`SupplyChain`] — The main client, one method per contract flow
//! - [`SupplyChainBuilder`] — Fluent builder for configuring the client
//! - [`RpcClient`] — Low-level Soroban JSON-RPC client with retry logic
//!
//! # Capabilities
//!
//! Two traits separate the client from the outside world:
//!
//! | Trait | Provided implementation |
//! |-------|-------------------------|
//! | [`ChainClient`] | [`RpcClient`] over JSON-RPC |
//! | [`Wallet`] | [`KeypairWallet`] with an in-memory ed25519 key |
//!
//! # Building Blocks
//!
//! - [`Session`] — Wallet connection and source account lookup
//! - [`TransactionBuilder`] — Envelope for one contract call
//! - [`simulate_call`] — Read-only calls through simulation
//! - [`Submitter`] — Prepare, sign, send and confirm
//! - [`ActivityTracker`] — Refuses duplicate in-flight requests

mod activity;
mod builder;
mod chain;
mod rpc;
mod session;
mod submit;
#[cfg(test)]
pub(crate) mod testing;
mod tracker;
mod wallet;

pub use activity::{ActivityTracker, CancelToken, OperationGuard};
pub use builder::{CallClass, DEFAULT_TIMEOUT, TransactionBuilder, parse_product_id};
pub use chain::{ChainClient, assemble, simulate_call};
pub use rpc::{FUTURENET_RPC_URL, RetryConfig, RpcClient, TESTNET_RPC_URL};
pub use session::{Session, WalletSession};
pub use submit::{PollConfig, Submitter, TransactionOutcome};
pub use tracker::{
    CONTRACT_ENV, DEFAULT_CONTRACT_ID, NETWORK_ENV, NodeStatus, PASSPHRASE_ENV, SupplyChain,
    SupplyChainBuilder, TrackerState,
};
pub use wallet::{KeypairWallet, SECRET_KEY_ENV, SignOptions, Wallet};
