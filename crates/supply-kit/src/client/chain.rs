//! The chain capability: everything the client needs from a Soroban RPC node.
//!
//! [`ChainClient`] is the seam between the orchestration code and the network.
//! [`RpcClient`] implements it over JSON-RPC; tests substitute in-memory fakes.

use futures::FutureExt;
use futures::future::BoxFuture;
use stellar_xdr::curr::{
    OperationBody, ScVal, TransactionEnvelope, TransactionExt, TransactionV1Envelope, VecM,
};

use crate::error::Error;
use crate::types::{
    AccountKey, GetTransactionResponse, SendTransactionResponse, SimulateTransactionResponse,
    SourceAccount, contract_call,
};

use super::rpc::RpcClient;

// ============================================================================
// ChainClient Trait
// ============================================================================

/// Access to a Soroban node.
///
/// `prepare_transaction` has a default built from `simulate_transaction` and
/// [`assemble`]; implementors normally only provide the four primitives.
pub trait ChainClient: Send + Sync {
    /// Current sequence number of an account.
    fn get_account<'a>(&'a self, key: &'a AccountKey) -> BoxFuture<'a, Result<SourceAccount, Error>>;

    /// Dry-run an envelope.
    fn simulate_transaction<'a>(
        &'a self,
        envelope: &'a TransactionEnvelope,
    ) -> BoxFuture<'a, Result<SimulateTransactionResponse, Error>>;

    /// Simulate an envelope and apply the result so it can be signed.
    fn prepare_transaction<'a>(
        &'a self,
        envelope: &'a TransactionEnvelope,
    ) -> BoxFuture<'a, Result<TransactionEnvelope, Error>> {
        async move {
            let simulation = self.simulate_transaction(envelope).await?;
            assemble(envelope, &simulation)
        }
        .boxed()
    }

    /// Submit a signed envelope.
    fn send_transaction<'a>(
        &'a self,
        envelope: &'a TransactionEnvelope,
    ) -> BoxFuture<'a, Result<SendTransactionResponse, Error>>;

    /// Status of a submitted transaction.
    fn get_transaction<'a>(&'a self, hash: &'a str)
    -> BoxFuture<'a, Result<GetTransactionResponse, Error>>;
}

impl ChainClient for RpcClient {
    fn get_account<'a>(&'a self, key: &'a AccountKey) -> BoxFuture<'a, Result<SourceAccount, Error>> {
        async move { Ok(RpcClient::get_account(self, key).await?) }.boxed()
    }

    fn simulate_transaction<'a>(
        &'a self,
        envelope: &'a TransactionEnvelope,
    ) -> BoxFuture<'a, Result<SimulateTransactionResponse, Error>> {
        async move { Ok(RpcClient::simulate_transaction(self, envelope).await?) }.boxed()
    }

    fn send_transaction<'a>(
        &'a self,
        envelope: &'a TransactionEnvelope,
    ) -> BoxFuture<'a, Result<SendTransactionResponse, Error>> {
        async move { Ok(RpcClient::send_transaction(self, envelope).await?) }.boxed()
    }

    fn get_transaction<'a>(
        &'a self,
        hash: &'a str,
    ) -> BoxFuture<'a, Result<GetTransactionResponse, Error>> {
        async move { Ok(RpcClient::get_transaction(self, hash).await?) }.boxed()
    }
}

// ============================================================================
// Assembly
// ============================================================================

/// Apply a simulation to an envelope.
///
/// Attaches the resource footprint, raises the fee by the minimum resource
/// fee, and fills in the authorization entries the simulation asked for when
/// the operation carries none. Signatures on the input are dropped.
pub fn assemble(
    envelope: &TransactionEnvelope,
    simulation: &SimulateTransactionResponse,
) -> Result<TransactionEnvelope, Error> {
    if let Some(message) = simulation.failure_message() {
        return Err(Error::Prepare(message));
    }

    let TransactionEnvelope::Tx(v1) = envelope else {
        return Err(Error::Prepare(
            "only v1 transaction envelopes can be assembled".to_string(),
        ));
    };

    let soroban_data = simulation
        .soroban_data()?
        .ok_or_else(|| Error::Prepare("simulation returned no transaction data".to_string()))?;
    let resource_fee = u32::try_from(simulation.min_resource_fee.unwrap_or(0))
        .map_err(|_| Error::Prepare("resource fee out of range".to_string()))?;

    let mut tx = v1.tx.clone();
    tx.fee = tx
        .fee
        .checked_add(resource_fee)
        .ok_or_else(|| Error::Prepare("fee overflow".to_string()))?;

    let auth = simulation.auth_entries()?;
    let mut operations = tx.operations.to_vec();
    for op in &mut operations {
        if let OperationBody::InvokeHostFunction(invoke) = &mut op.body {
            if invoke.auth.is_empty() && !auth.is_empty() {
                invoke.auth = auth.clone().try_into()?;
            }
        }
    }
    tx.operations = operations.try_into()?;
    tx.ext = TransactionExt::V1(soroban_data);

    Ok(TransactionEnvelope::Tx(TransactionV1Envelope {
        tx,
        signatures: VecM::default(),
    }))
}

// ============================================================================
// Read-only calls
// ============================================================================

/// Run a read-only contract call through simulation and return its value.
///
/// No wallet is involved and nothing is submitted.
pub async fn simulate_call<C: ChainClient + ?Sized>(
    chain: &C,
    envelope: &TransactionEnvelope,
) -> Result<ScVal, Error> {
    let function = contract_call(envelope)
        .map(|(name, _)| name)
        .unwrap_or_else(|| "transaction".to_string());

    tracing::debug!(%function, "simulating contract call");

    let simulation = chain.simulate_transaction(envelope).await?;
    if let Some(message) = simulation.failure_message() {
        return Err(Error::Simulation { function, message });
    }

    simulation
        .return_value()?
        .ok_or_else(|| Error::Simulation {
            function,
            message: "simulation returned no result".to_string(),
        })
}
