//! Network identification for Stellar.

use std::fmt;

use sha2::{Digest, Sha256};

/// Passphrase of the Stellar public network.
pub const PUBLIC_PASSPHRASE: &str = "Public Global Stellar Network ; September 2015";
/// Passphrase of the SDF test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
/// Passphrase of the SDF future network.
pub const FUTURENET_PASSPHRASE: &str = "Test SDF Future Network ; October 2022";

/// The Stellar network the client is connected to.
///
/// The network name is what wallets expect next to the passphrase when asked
/// to sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Stellar public network.
    Public,
    /// SDF test network.
    #[default]
    Testnet,
    /// SDF future network.
    Futurenet,
    /// Standalone or otherwise unknown network.
    Custom,
}

impl Network {
    /// Returns the network name as wallets expect it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Public => "PUBLIC",
            Network::Testnet => "TESTNET",
            Network::Futurenet => "FUTURENET",
            Network::Custom => "STANDALONE",
        }
    }

    /// Returns the well-known passphrase for this network, if any.
    pub fn passphrase(&self) -> Option<&'static str> {
        match self {
            Network::Public => Some(PUBLIC_PASSPHRASE),
            Network::Testnet => Some(TESTNET_PASSPHRASE),
            Network::Futurenet => Some(FUTURENET_PASSPHRASE),
            Network::Custom => None,
        }
    }

    /// Identify a network from its passphrase.
    pub fn from_passphrase(passphrase: &str) -> Self {
        match passphrase {
            PUBLIC_PASSPHRASE => Network::Public,
            TESTNET_PASSPHRASE => Network::Testnet,
            FUTURENET_PASSPHRASE => Network::Futurenet,
            _ => Network::Custom,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SHA-256 of the passphrase. Every transaction signature commits to it.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    Sha256::digest(passphrase.as_bytes()).into()
}
