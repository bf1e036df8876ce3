//! A typed Rust client for the Soroban supply-chain tracker contract.
//!
//! **supply-kit** registers products, moves them through their lifecycle and
//! looks them up, against a tracker contract deployed on Stellar.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use supply_kit::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), supply_kit::Error> {
//!     let tracker = SupplyChain::from_env()?;
//!     tracker.connect().await?;
//!
//!     println!("{} products registered", tracker.total_products().await?);
//!     match tracker.get_product(1).await? {
//!         Some(product) => println!("{} ({})", product.name, product.status),
//!         None => println!("no product 1"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Contract
//!
//! | Function | Kind | Returns |
//! |----------|------|---------|
//! | `get_total_products()` | read | `u64` |
//! | `register_product(name, manufacturer, location)` | write | new `u64` id |
//! | `update_product_status(id, location, status)` | write | nothing |
//! | `get_product(id)` | read | product map, id `0` if unknown |
//!
//! Reads are answered by simulation and never signed. Writes are simulated,
//! signed by the [`Wallet`], submitted and polled until the network reports
//! a final status.
//!
//! # Core Types
//!
//! - [`ProductRecord`], [`ProductStatus`], [`NewProduct`] - Contract data
//! - [`AccountKey`], [`ContractAddress`] - Stellar strkeys
//! - [`to_native`] - Contract values as plain JSON data

pub mod client;
pub mod error;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{Error, ParseProductIdError, ParseStatusError, RpcError, WalletError};
pub use types::*;

// Re-export client types
pub use client::{
    ActivityTracker, CallClass, CancelToken, ChainClient, DEFAULT_CONTRACT_ID, KeypairWallet,
    NodeStatus, OperationGuard, PollConfig, RetryConfig, RpcClient, SECRET_KEY_ENV, Session,
    SignOptions, Submitter, SupplyChain, SupplyChainBuilder, TrackerState, TransactionBuilder,
    TransactionOutcome, Wallet, WalletSession, assemble, parse_product_id, simulate_call,
};
