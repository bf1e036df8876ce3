//! Stellar account identity and state.

use std::fmt;
use std::str::FromStr;

use stellar_xdr::curr::{
    AccountId, LedgerKey, LedgerKeyAccount, MuxedAccount, PublicKey as XdrPublicKey, Uint256,
};

use crate::error::Error;

/// An ed25519 account public key (`G...` strkey).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountKey([u8; 32]);

impl AccountKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Last four bytes of the key, used as the signature hint.
    pub fn hint(&self) -> [u8; 4] {
        [self.0[28], self.0[29], self.0[30], self.0[31]]
    }

    pub fn to_muxed_account(&self) -> MuxedAccount {
        MuxedAccount::Ed25519(Uint256(self.0))
    }

    /// The ledger key of this account's entry.
    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey::Account(LedgerKeyAccount {
            account_id: AccountId(XdrPublicKey::PublicKeyTypeEd25519(Uint256(self.0))),
        })
    }
}

impl FromStr for AccountKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = stellar_strkey::ed25519::PublicKey::from_string(s.trim())?;
        Ok(Self(key.0))
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&stellar_strkey::ed25519::PublicKey(self.0).to_string())
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountKey({self})")
    }
}

/// Snapshot of an account's state, the base for a new transaction.
///
/// Transactions must use `sequence + 1`; the network rejects a transaction
/// built against a stale sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceAccount {
    pub key: AccountKey,
    pub sequence: i64,
}

impl SourceAccount {
    pub fn new(key: AccountKey, sequence: i64) -> Self {
        Self { key, sequence }
    }

    /// Sequence number for the next transaction from this account.
    pub fn next_sequence(&self) -> i64 {
        self.sequence.saturating_add(1)
    }

    pub fn account_id(&self) -> String {
        self.key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_key_round_trip() {
        let key = AccountKey::from_bytes([5; 32]);
        let encoded = key.to_string();
        assert!(encoded.starts_with('G'));
        assert_eq!(encoded.len(), 56);
        assert_eq!(encoded.parse::<AccountKey>().unwrap(), key);
    }

    #[test]
    fn test_account_key_rejects_garbage() {
        assert!(matches!(
            "GNOTAKEY".parse::<AccountKey>(),
            Err(Error::StrKey(_))
        ));
    }

    #[test]
    fn test_hint_is_last_four_bytes() {
        let mut bytes = [0u8; 32];
        bytes[28..].copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(AccountKey::from_bytes(bytes).hint(), [1, 2, 3, 4]);
    }

    #[test]
    fn test_next_sequence() {
        let account = SourceAccount::new(AccountKey::from_bytes([1; 32]), 41);
        assert_eq!(account.next_sequence(), 42);
    }
}
