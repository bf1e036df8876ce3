//! Wallet trait and the in-memory keypair wallet.
//!
//! A `Wallet` holds the user's key and signs on their behalf. It mirrors the
//! browser-extension interface: ask for access, read the public key, sign a
//! base64 transaction envelope.
//!
//! # Implementations
//!
//! - [`KeypairWallet`] - Single ed25519 key stored in memory
//!
//! # Example
//!
//! ```rust,no_run
//! use supply_kit::{KeypairWallet, SupplyChain};
//!
//! # async fn example() -> Result<(), supply_kit::Error> {
//! let wallet = KeypairWallet::from_env()?;
//!
//! let tracker = SupplyChain::testnet()
//!     .contract("CBX6DIAW47UHW7CLUOH2OK3JO326NFFNMLFXOTLGOEMWISALNIXMCFG7")
//!     .wallet(wallet)
//!     .build()?;
//! # let _ = tracker;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ed25519_dalek::Signer as _;
use futures::FutureExt;
use futures::future::BoxFuture;
use stellar_xdr::curr::{
    BytesM, DecoratedSignature, Signature, SignatureHint, TransactionEnvelope,
};

use crate::error::{Error, WalletError};
use crate::types::{AccountKey, Network, from_base64, signature_payload_hash, to_base64};

/// Environment variable holding the `S...` secret seed used by [`KeypairWallet::from_env`].
pub const SECRET_KEY_ENV: &str = "STELLAR_SECRET_KEY";

/// Network details passed along with a signing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignOptions {
    pub network: Network,
    pub network_passphrase: String,
}

impl SignOptions {
    pub fn new(passphrase: impl Into<String>) -> Self {
        let network_passphrase = passphrase.into();
        Self {
            network: Network::from_passphrase(&network_passphrase),
            network_passphrase,
        }
    }
}

// ============================================================================
// Wallet Trait
// ============================================================================

/// An external signer.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use supply_kit::{AccountKey, SignOptions, Wallet, WalletError};
/// use futures::future::{BoxFuture, FutureExt};
///
/// struct Extension { /* ... */ }
///
/// impl Wallet for Extension {
///     fn is_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>> {
///         async { Ok(true) }.boxed()
///     }
///     // ...
/// }
/// ```
pub trait Wallet: Send + Sync {
    /// Whether this application may use the wallet without prompting.
    fn is_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>>;

    /// Ask the user to allow this application. Returns the user's answer.
    fn set_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>>;

    /// The key of the account the wallet signs for.
    fn get_public_key(&self) -> BoxFuture<'_, Result<AccountKey, WalletError>>;

    /// Sign a base64 transaction envelope and return the signed envelope.
    fn sign_transaction<'a>(
        &'a self,
        xdr: &'a str,
        options: &'a SignOptions,
    ) -> BoxFuture<'a, Result<String, WalletError>>;
}

/// Implement `Wallet` for `Arc<dyn Wallet>` for convenience.
impl Wallet for Arc<dyn Wallet> {
    fn is_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>> {
        (**self).is_allowed()
    }

    fn set_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>> {
        (**self).set_allowed()
    }

    fn get_public_key(&self) -> BoxFuture<'_, Result<AccountKey, WalletError>> {
        (**self).get_public_key()
    }

    fn sign_transaction<'a>(
        &'a self,
        xdr: &'a str,
        options: &'a SignOptions,
    ) -> BoxFuture<'a, Result<String, WalletError>> {
        (**self).sign_transaction(xdr, options)
    }
}

// ============================================================================
// KeypairWallet
// ============================================================================

/// A wallet with a single ed25519 key stored in memory.
///
/// Always allowed. Suitable for scripts, bots and tests.
///
/// ```rust
/// use supply_kit::KeypairWallet;
///
/// let wallet = KeypairWallet::generate();
/// assert!(wallet.public_key().to_string().starts_with('G'));
/// ```
#[derive(Clone)]
pub struct KeypairWallet {
    signing_key: ed25519_dalek::SigningKey,
    public_key: AccountKey,
}

impl KeypairWallet {
    /// Create a wallet from an `S...` secret seed.
    pub fn from_secret(secret: &str) -> Result<Self, Error> {
        let seed = stellar_strkey::ed25519::PrivateKey::from_string(secret.trim())?;
        Ok(Self::from_seed(seed.0))
    }

    /// Create a wallet from raw seed bytes.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let signing_key = ed25519_dalek::SigningKey::from_bytes(&seed);
        let public_key = AccountKey::from_bytes(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            public_key,
        }
    }

    /// Load from the `STELLAR_SECRET_KEY` environment variable.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_env_var(SECRET_KEY_ENV)
    }

    /// Load from a custom environment variable.
    pub fn from_env_var(var: &str) -> Result<Self, Error> {
        let secret = std::env::var(var)
            .map_err(|_| Error::Config(format!("Environment variable {} not set", var)))?;
        Self::from_secret(&secret)
    }

    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let signing_key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_seed(signing_key.to_bytes())
    }

    pub fn public_key(&self) -> AccountKey {
        self.public_key
    }

    /// The secret seed as an `S...` strkey.
    pub fn secret(&self) -> String {
        stellar_strkey::ed25519::PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    /// Add this key's signature to an envelope.
    pub fn sign_envelope(
        &self,
        envelope: &TransactionEnvelope,
        passphrase: &str,
    ) -> Result<TransactionEnvelope, Error> {
        let TransactionEnvelope::Tx(v1) = envelope else {
            return Err(Error::decode(
                "transaction",
                "only v1 transaction envelopes can be signed",
            ));
        };

        let hash = signature_payload_hash(&v1.tx, passphrase)?;
        let signature = self.signing_key.sign(&hash);
        let decorated = DecoratedSignature {
            hint: SignatureHint(self.public_key.hint()),
            signature: Signature(BytesM::try_from(signature.to_bytes().to_vec())?),
        };

        let mut signed = v1.clone();
        let mut signatures = signed.signatures.to_vec();
        signatures.push(decorated);
        signed.signatures = signatures.try_into()?;
        Ok(TransactionEnvelope::Tx(signed))
    }

    fn sign_xdr(&self, xdr: &str, options: &SignOptions) -> Result<String, Error> {
        let envelope: TransactionEnvelope = from_base64(xdr)?;
        let signed = self.sign_envelope(&envelope, &options.network_passphrase)?;
        to_base64(&signed)
    }
}

impl std::fmt::Debug for KeypairWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeypairWallet")
            .field("public_key", &self.public_key)
            .finish()
    }
}

impl Wallet for KeypairWallet {
    fn is_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>> {
        async { Ok(true) }.boxed()
    }

    fn set_allowed(&self) -> BoxFuture<'_, Result<bool, WalletError>> {
        async { Ok(true) }.boxed()
    }

    fn get_public_key(&self) -> BoxFuture<'_, Result<AccountKey, WalletError>> {
        let key = self.public_key;
        async move { Ok(key) }.boxed()
    }

    fn sign_transaction<'a>(
        &'a self,
        xdr: &'a str,
        options: &'a SignOptions,
    ) -> BoxFuture<'a, Result<String, WalletError>> {
        let result = self
            .sign_xdr(xdr, options)
            .map_err(|e| WalletError::Failed(e.to_string()));
        async move { result }.boxed()
    }
}
