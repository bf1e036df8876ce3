//! Core types for the supply-chain client.
//!
//! Chain-level types wrap `stellar-xdr`; the domain types describe what the
//! tracker contract stores.

mod account;
mod network;
mod product;
mod rpc;
mod transaction;
pub mod value;

pub use account::{AccountKey, SourceAccount};
pub use network::{FUTURENET_PASSPHRASE, Network, PUBLIC_PASSPHRASE, TESTNET_PASSPHRASE, network_id};
pub use product::{NOT_FOUND_ID, NewProduct, ProductRecord, ProductStatus};
pub use rpc::{
    GetHealthResponse, GetLatestLedgerResponse, GetLedgerEntriesResponse, GetNetworkResponse,
    GetTransactionResponse, LedgerEntryResult, RestorePreamble, SendStatus,
    SendTransactionResponse, SimulateHostFunctionResult, SimulateTransactionResponse,
    TransactionStatus,
};
pub use transaction::{
    ContractAddress, contract_call, from_base64, signature_payload_hash, to_base64,
    transaction_hash,
};
pub use value::{UNSUPPORTED_SCVAL, to_native, to_native_opt};
