//! Wallet connection state.

use std::fmt;
use std::sync::{Arc, RwLock};

use crate::error::{Error, WalletError};
use crate::types::{AccountKey, SourceAccount};

use super::chain::ChainClient;
use super::wallet::Wallet;

/// A connected wallet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WalletSession {
    pub public_key: AccountKey,
}

impl WalletSession {
    /// The key shortened for display, e.g. `GABC...WXYZ`.
    pub fn short_key(&self) -> String {
        let key = self.public_key.to_string();
        format!("{}...{}", &key[..4], &key[key.len() - 4..])
    }
}

impl fmt::Display for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_key())
    }
}

/// Connects a wallet and resolves the account it signs for.
///
/// There is no disconnect; a session lives as long as its owner.
pub struct Session {
    wallet: Arc<dyn Wallet>,
    chain: Arc<dyn ChainClient>,
    public_key: RwLock<Option<AccountKey>>,
}

impl Session {
    pub fn new(wallet: Arc<dyn Wallet>, chain: Arc<dyn ChainClient>) -> Self {
        Self {
            wallet,
            chain,
            public_key: RwLock::new(None),
        }
    }

    /// Connect the wallet, asking for access first if needed.
    pub async fn connect(&self) -> Result<WalletSession, Error> {
        if !self.wallet.is_allowed().await? && !self.wallet.set_allowed().await? {
            return Err(WalletError::Declined.into());
        }
        let public_key = self.wallet.get_public_key().await?;

        if let Ok(mut slot) = self.public_key.write() {
            *slot = Some(public_key);
        }
        tracing::info!(account = %public_key, "wallet connected");

        Ok(WalletSession { public_key })
    }

    pub fn public_key(&self) -> Option<AccountKey> {
        self.public_key.read().ok().and_then(|key| *key)
    }

    pub fn is_connected(&self) -> bool {
        self.public_key().is_some()
    }

    /// The connected session, if any.
    pub fn current(&self) -> Option<WalletSession> {
        self.public_key().map(|public_key| WalletSession { public_key })
    }

    /// Fetch the connected account's current sequence number.
    pub async fn source_account(&self) -> Result<SourceAccount, Error> {
        let key = self.public_key().ok_or(Error::NotConnected)?;
        self.chain.get_account(&key).await
    }

    pub fn wallet(&self) -> &Arc<dyn Wallet> {
        &self.wallet
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("public_key", &self.public_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::{FakeChain, FakeWallet};

    fn session(wallet: FakeWallet) -> (Session, Arc<FakeWallet>) {
        let wallet = Arc::new(wallet);
        let session = Session::new(wallet.clone(), Arc::new(FakeChain::new()));
        (session, wallet)
    }

    #[tokio::test]
    async fn test_connect_when_allowed() {
        let (session, wallet) = session(FakeWallet::allowed([1; 32]));
        let connected = session.connect().await.unwrap();
        assert_eq!(connected.public_key, AccountKey::from_bytes([1; 32]));
        assert!(session.is_connected());
        assert_eq!(wallet.set_allowed_calls(), 0);
    }

    #[tokio::test]
    async fn test_connect_requests_access() {
        let (session, wallet) = session(FakeWallet::not_allowed([2; 32], true));
        session.connect().await.unwrap();
        assert_eq!(wallet.set_allowed_calls(), 1);
        assert_eq!(session.public_key(), Some(AccountKey::from_bytes([2; 32])));
    }

    #[tokio::test]
    async fn test_connect_declined() {
        let (session, _) = session(FakeWallet::not_allowed([2; 32], false));
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, Error::Wallet(WalletError::Declined)));
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn test_connect_wallet_missing() {
        let (session, _) = session(FakeWallet::unavailable());
        let err = session.connect().await.unwrap_err();
        assert!(matches!(err, Error::Wallet(WalletError::Unavailable)));
        assert!(session.current().is_none());
    }

    #[tokio::test]
    async fn test_source_account_requires_connection() {
        let (session, _) = session(FakeWallet::allowed([1; 32]));
        assert!(matches!(
            session.source_account().await,
            Err(Error::NotConnected)
        ));

        session.connect().await.unwrap();
        let account = session.source_account().await.unwrap();
        assert_eq!(account.key, AccountKey::from_bytes([1; 32]));
    }

    #[test]
    fn test_short_key() {
        let session = WalletSession {
            public_key: AccountKey::from_bytes([0; 32]),
        };
        let full = session.public_key.to_string();
        let short = session.short_key();
        assert_eq!(short.len(), 11);
        assert!(short.starts_with(&full[..4]));
        assert!(short.ends_with(&full[52..]));
        assert_eq!(session.to_string(), short);
    }
}
