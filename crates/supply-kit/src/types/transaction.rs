//! Transaction envelope helpers.

use std::fmt;
use std::str::FromStr;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    ContractId, Hash, HostFunction, Limits, OperationBody, ReadXdr, ScAddress, ScVal,
    Transaction, TransactionEnvelope, TransactionSignaturePayload,
    TransactionSignaturePayloadTaggedTransaction, WriteXdr,
};

use crate::error::Error;

use super::network::network_id;

/// Serialize an XDR value to base64, the form the RPC and wallets exchange.
pub fn to_base64<T: WriteXdr>(value: &T) -> Result<String, Error> {
    let bytes = value.to_xdr(Limits::none())?;
    Ok(STANDARD.encode(bytes))
}

/// Parse an XDR value from base64.
pub fn from_base64<T: ReadXdr>(encoded: &str) -> Result<T, Error> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(T::from_xdr(bytes, Limits::none())?)
}

/// A Soroban contract address (`C...` strkey).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractAddress([u8; 32]);

impl ContractAddress {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// The address as a contract-invocation target.
    pub fn to_sc_address(&self) -> ScAddress {
        ScAddress::Contract(ContractId(Hash(self.0)))
    }
}

impl FromStr for ContractAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let contract = stellar_strkey::Contract::from_string(s.trim())?;
        Ok(Self(contract.0))
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", stellar_strkey::Contract(self.0))
    }
}

impl fmt::Debug for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContractAddress({self})")
    }
}

/// The hash a signer commits to: SHA-256 of the network id and the transaction.
pub fn signature_payload_hash(tx: &Transaction, passphrase: &str) -> Result<[u8; 32], Error> {
    let payload = TransactionSignaturePayload {
        network_id: Hash(network_id(passphrase)),
        tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
    };
    let bytes = payload.to_xdr(Limits::none())?;
    Ok(Sha256::digest(bytes).into())
}

/// The transaction hash the network reports, hex encoded.
pub fn transaction_hash(envelope: &TransactionEnvelope, passphrase: &str) -> Result<String, Error> {
    match envelope {
        TransactionEnvelope::Tx(v1) => Ok(hex::encode(signature_payload_hash(&v1.tx, passphrase)?)),
        _ => Err(Error::decode(
            "transaction",
            "only v1 transaction envelopes are supported",
        )),
    }
}

/// The contract function and arguments invoked by an envelope.
///
/// Returns `None` unless the envelope holds a single contract invocation.
pub fn contract_call(envelope: &TransactionEnvelope) -> Option<(String, Vec<ScVal>)> {
    let TransactionEnvelope::Tx(v1) = envelope else {
        return None;
    };
    let [op] = v1.tx.operations.as_slice() else {
        return None;
    };
    let OperationBody::InvokeHostFunction(invoke) = &op.body else {
        return None;
    };
    let HostFunction::InvokeContract(call) = &invoke.host_function else {
        return None;
    };
    Some((
        call.function_name.0.to_utf8_string_lossy(),
        call.args.to_vec(),
    ))
}
