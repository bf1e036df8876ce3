//! The supply-chain tracker client.

use std::future::Future;
use std::sync::{Arc, RwLock};

use stellar_xdr::curr::{ScVal, TransactionEnvelope};

use crate::error::Error;
use crate::types::{
    AccountKey, ContractAddress, FUTURENET_PASSPHRASE, GetNetworkResponse, Network, NewProduct,
    ProductRecord, ProductStatus, TESTNET_PASSPHRASE, to_native_opt,
};

use super::activity::{ActivityTracker, CancelToken};
use super::builder::{CallClass, TransactionBuilder, parse_product_id};
use super::chain::{ChainClient, simulate_call};
use super::rpc::{FUTURENET_RPC_URL, RetryConfig, RpcClient, TESTNET_RPC_URL};
use super::session::{Session, WalletSession};
use super::submit::{PollConfig, Submitter, TransactionOutcome};
use super::wallet::{KeypairWallet, SECRET_KEY_ENV, Wallet};

/// The tracker contract deployed on the SDF test network.
pub const DEFAULT_CONTRACT_ID: &str = "CBX6DIAW47UHW7CLUOH2OK3JO326NFFNMLFXOTLGOEMWISALNIXMCFG7";

/// `testnet`, `futurenet`, or a custom RPC URL.
pub const NETWORK_ENV: &str = "SUPPLY_CHAIN_NETWORK";
/// Passphrase for a custom RPC URL. Overrides the preset's passphrase.
pub const PASSPHRASE_ENV: &str = "SUPPLY_CHAIN_NETWORK_PASSPHRASE";
/// Contract address. Overrides [`DEFAULT_CONTRACT_ID`].
pub const CONTRACT_ENV: &str = "SUPPLY_CHAIN_CONTRACT_ID";

// Contract entry points.
const FN_TOTAL: &str = "get_total_products";
const FN_REGISTER: &str = "register_product";
const FN_UPDATE: &str = "update_product_status";
const FN_GET: &str = "get_product";

// Activity names.
const OP_CONNECT: &str = "connect";
const OP_TOTAL: &str = "total";
const OP_REGISTER: &str = "register";
const OP_UPDATE: &str = "update";
const OP_RETRIEVE: &str = "retrieve";

/// Snapshot of what the client knows, for display.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackerState {
    pub public_key: Option<AccountKey>,
    pub total_products: Option<u64>,
    /// Identifier returned by the most recent registration.
    pub last_product_id: Option<u64>,
    /// Whether a request is in flight.
    pub busy: bool,
    /// Message of the most recent failure, until dismissed.
    pub last_error: Option<String>,
}

/// What the RPC node reports about itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeStatus {
    /// `healthy` when the node is in sync.
    pub health: String,
    pub protocol_version: u32,
    pub latest_ledger: u32,
}

#[derive(Debug, Default)]
struct Counters {
    total_products: Option<u64>,
    last_product_id: Option<u64>,
    last_error: Option<String>,
}

/// Client for the supply-chain tracker contract.
///
/// Reads go through simulation and need no signature. Registrations and
/// updates are signed by the wallet, submitted, and awaited.
///
/// # Example
///
/// ```rust,no_run
/// use supply_kit::*;
///
/// #[tokio::main]
/// async fn main() -> Result<(), supply_kit::Error> {
///     let tracker = SupplyChain::testnet()
///         .wallet(KeypairWallet::from_env()?)
///         .build()?;
///
///     tracker.connect().await?;
///     let id = tracker
///         .register_product(&NewProduct::new("Laptop XPS 15", "Dell Inc.", "Factory A, China"))
///         .await?;
///     tracker
///         .update_product_status(id, "Warehouse B", ProductStatus::InTransit)
///         .await?;
///
///     if let Some(product) = tracker.get_product(id).await? {
///         println!("{} is {} at {}", product.name, product.status, product.current_location);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct SupplyChain {
    chain: Arc<dyn ChainClient>,
    /// Set when the chain is the JSON-RPC client.
    rpc: Option<RpcClient>,
    session: Arc<Session>,
    submitter: Arc<Submitter>,
    contract: ContractAddress,
    network: Network,
    passphrase: String,
    rpc_url: String,
    activity: ActivityTracker,
    counters: Arc<RwLock<Counters>>,
}

impl SupplyChain {
    /// Create a builder for the SDF test network, pointed at [`DEFAULT_CONTRACT_ID`].
    pub fn testnet() -> SupplyChainBuilder {
        SupplyChainBuilder::new(TESTNET_RPC_URL, TESTNET_PASSPHRASE, Network::Testnet)
            .contract(DEFAULT_CONTRACT_ID)
    }

    /// Create a builder for the SDF future network.
    pub fn futurenet() -> SupplyChainBuilder {
        SupplyChainBuilder::new(FUTURENET_RPC_URL, FUTURENET_PASSPHRASE, Network::Futurenet)
    }

    /// Create a builder with a custom RPC URL and network passphrase.
    pub fn custom(rpc_url: impl Into<String>, passphrase: impl Into<String>) -> SupplyChainBuilder {
        let passphrase = passphrase.into();
        let network = Network::from_passphrase(&passphrase);
        SupplyChainBuilder::new(rpc_url, passphrase, network)
    }

    /// Create a configured client from environment variables.
    ///
    /// Reads the following environment variables:
    /// - `SUPPLY_CHAIN_NETWORK` (optional): `"testnet"`, `"futurenet"`, or a
    ///   custom RPC URL. Defaults to `"testnet"`.
    /// - `SUPPLY_CHAIN_NETWORK_PASSPHRASE`: required with a custom URL.
    /// - `SUPPLY_CHAIN_CONTRACT_ID` (optional): the contract address.
    /// - `STELLAR_SECRET_KEY`: the `S...` seed of the signing account.
    ///
    /// ```bash
    /// export SUPPLY_CHAIN_NETWORK=testnet
    /// export STELLAR_SECRET_KEY=S...
    /// ```
    pub fn from_env() -> Result<SupplyChain, Error> {
        Self::from_lookup(|name| std::env::var(name).ok())?.build()
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<SupplyChainBuilder, Error> {
        let passphrase = lookup(PASSPHRASE_ENV);

        let mut builder = match lookup(NETWORK_ENV).as_deref().map(str::trim) {
            Some("testnet") | Some("") | None => SupplyChain::testnet(),
            Some("futurenet") => SupplyChain::futurenet(),
            Some(url) => {
                let passphrase = passphrase.clone().ok_or_else(|| {
                    Error::Config(format!("{NETWORK_ENV} is a custom URL but {PASSPHRASE_ENV} is not set"))
                })?;
                SupplyChain::custom(url, passphrase)
            }
        };

        if let Some(passphrase) = passphrase {
            builder = builder.passphrase(passphrase);
        }
        if let Some(contract) = lookup(CONTRACT_ENV) {
            builder = builder.contract(contract);
        }

        let secret = lookup(SECRET_KEY_ENV)
            .ok_or_else(|| Error::Config(format!("Environment variable {SECRET_KEY_ENV} not set")))?;
        Ok(builder.wallet(KeypairWallet::from_secret(&secret)?))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn contract(&self) -> &ContractAddress {
        &self.contract
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn chain(&self) -> &Arc<dyn ChainClient> {
        &self.chain
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Snapshot of the client state.
    pub fn state(&self) -> TrackerState {
        let counters = self.counters.read().ok();
        TrackerState {
            public_key: self.session.public_key(),
            total_products: counters.as_ref().and_then(|c| c.total_products),
            last_product_id: counters.as_ref().and_then(|c| c.last_product_id),
            busy: self.activity.is_busy(),
            last_error: counters.as_ref().and_then(|c| c.last_error.clone()),
        }
    }

    /// Clear the last error.
    pub fn dismiss_error(&self) {
        self.update_counters(|c| c.last_error = None);
    }

    /// Cancel every request in flight.
    ///
    /// A write that has not been sent yet is never sent. One already sent
    /// stops being awaited but may still be applied by the network.
    pub fn cancel_pending(&self) {
        let cancelled = self.activity.cancel_all();
        tracing::debug!(cancelled, "cancelled pending requests");
    }

    /// Check that the RPC node is reachable and serves the configured network.
    ///
    /// Only available with the JSON-RPC chain client.
    pub async fn check_network(&self) -> Result<NodeStatus, Error> {
        let rpc = self.rpc.as_ref().ok_or_else(|| {
            Error::Config("Node checks need the JSON-RPC chain client".into())
        })?;

        let health = rpc.health().await?;
        let network = rpc.network().await?;
        ensure_passphrase(&self.passphrase, &network)?;
        let latest = rpc.latest_ledger().await?;

        tracing::debug!(
            health = %health.status,
            protocol_version = network.protocol_version,
            latest_ledger = latest.sequence,
            "rpc node checked"
        );
        Ok(NodeStatus {
            health: health.status,
            protocol_version: network.protocol_version,
            latest_ledger: latest.sequence,
        })
    }

    // ========================================================================
    // Operations
    // ========================================================================

    /// Connect the wallet and load the product count.
    ///
    /// A failure to load the count is recorded but does not fail the connection.
    pub async fn connect(&self) -> Result<WalletSession, Error> {
        let session = self.run(OP_CONNECT, |_| self.session.connect()).await?;
        if let Err(e) = self.total_products().await {
            tracing::warn!(error = %e, "could not load product count after connecting");
        }
        Ok(session)
    }

    /// Number of registered products, refreshed from the contract.
    pub async fn total_products(&self) -> Result<u64, Error> {
        self.run(OP_TOTAL, |_| self.load_total()).await
    }

    /// Register a product and return its identifier.
    pub async fn register_product(&self, product: &NewProduct) -> Result<u64, Error> {
        self.dismiss_error();
        let id = self
            .run(OP_REGISTER, |cancel| async move {
                let envelope = self
                    .envelope(FN_REGISTER, |tx| {
                        tx.string_arg(&product.name)
                            .string_arg(&product.manufacturer)
                            .string_arg(&product.location)
                            .call_class(CallClass::StateChanging)
                    })
                    .await?;
                let outcome = self
                    .submitter
                    .submit_with_cancel(&envelope, "Register Product", &cancel)
                    .await?;
                let value = outcome.return_value.ok_or_else(|| {
                    Error::decode("product id", "transaction returned no value")
                })?;
                decode_u64(&value, "product id")
            })
            .await?;

        tracing::info!(product_id = id, name = %product.name, "product registered");
        self.update_counters(|c| c.last_product_id = Some(id));
        self.refresh_total().await;
        Ok(id)
    }

    /// Move a product to a new location and status.
    pub async fn update_product_status(
        &self,
        product_id: u64,
        location: &str,
        status: ProductStatus,
    ) -> Result<TransactionOutcome, Error> {
        self.dismiss_error();
        self.run(OP_UPDATE, |cancel| {
            self.send_update(product_id, location, status, cancel)
        })
        .await
    }

    /// Like [`update_product_status`](Self::update_product_status) for text input.
    ///
    /// The identifier and status are validated before anything is sent.
    pub async fn update_product_status_str(
        &self,
        product_id: &str,
        location: &str,
        status: &str,
    ) -> Result<TransactionOutcome, Error> {
        self.dismiss_error();
        self.run(OP_UPDATE, |cancel| async move {
            let product_id = parse_product_id(product_id)?;
            let status: ProductStatus = status.parse()?;
            self.send_update(product_id, location, status, cancel).await
        })
        .await
    }

    /// Look up a product. `None` if the contract does not know it.
    pub async fn get_product(&self, product_id: u64) -> Result<Option<ProductRecord>, Error> {
        self.dismiss_error();
        self.run(OP_RETRIEVE, |_| self.fetch_product(product_id)).await
    }

    /// Like [`get_product`](Self::get_product) for text input.
    pub async fn get_product_str(&self, product_id: &str) -> Result<Option<ProductRecord>, Error> {
        self.dismiss_error();
        self.run(OP_RETRIEVE, |_| async move {
            let product_id = parse_product_id(product_id)?;
            self.fetch_product(product_id).await
        })
        .await
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn send_update(
        &self,
        product_id: u64,
        location: &str,
        status: ProductStatus,
        cancel: CancelToken,
    ) -> Result<TransactionOutcome, Error> {
        let envelope = self
            .envelope(FN_UPDATE, |tx| {
                tx.u64_arg(product_id)
                    .string_arg(location)
                    .string_arg(status.as_str())
                    .call_class(CallClass::StateChanging)
            })
            .await?;
        let outcome = self
            .submitter
            .submit_with_cancel(&envelope, "Update Product", &cancel)
            .await?;
        tracing::info!(product_id, %status, location, "product updated");
        Ok(outcome)
    }

    async fn load_total(&self) -> Result<u64, Error> {
        let envelope = self.envelope(FN_TOTAL, |tx| tx).await?;
        let value = simulate_call(self.chain.as_ref(), &envelope).await?;
        let total = decode_u64(&value, "product count")?;
        self.update_counters(|c| c.total_products = Some(total));
        Ok(total)
    }

    /// Reload the count after a registration.
    ///
    /// Skipped when a load is already running; that load reports the count.
    async fn refresh_total(&self) {
        let Ok(_guard) = self.activity.begin(OP_TOTAL) else {
            tracing::debug!("product count already loading");
            return;
        };
        if let Err(e) = self.load_total().await {
            self.record_failure(OP_TOTAL, &e);
        }
    }

    async fn fetch_product(&self, product_id: u64) -> Result<Option<ProductRecord>, Error> {
        let envelope = self.envelope(FN_GET, |tx| tx.u64_arg(product_id)).await?;
        let value = simulate_call(self.chain.as_ref(), &envelope).await?;
        ProductRecord::from_sc_val(&value)
    }

    /// Build a call of `function` from the connected account.
    async fn envelope(
        &self,
        function: &str,
        args: impl FnOnce(TransactionBuilder) -> TransactionBuilder,
    ) -> Result<TransactionEnvelope, Error> {
        let account = self.session.source_account().await?;
        args(TransactionBuilder::new(&account, &self.contract, function)).build()
    }

    /// Run `request` as `operation`, recording any failure.
    ///
    /// `request` gets the operation's cancel token.
    async fn run<T, F, Fut>(&self, operation: &'static str, request: F) -> Result<T, Error>
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = Result<T, Error>>,
    {
        let result = match self.activity.begin(operation) {
            Ok(guard) => request(guard.cancel_token().clone()).await,
            Err(e) => Err(e),
        };
        if let Err(e) = &result {
            self.record_failure(operation, e);
        }
        result
    }

    fn record_failure(&self, operation: &'static str, error: &Error) {
        tracing::error!(operation, error = %error, "request failed");
        let message = error.to_string();
        self.update_counters(|c| c.last_error = Some(message));
    }

    fn update_counters(&self, update: impl FnOnce(&mut Counters)) {
        if let Ok(mut counters) = self.counters.write() {
            update(&mut counters);
        }
    }
}

impl std::fmt::Debug for SupplyChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplyChain")
            .field("rpc_url", &self.rpc_url)
            .field("network", &self.network)
            .field("contract", &self.contract)
            .field("public_key", &self.session.public_key())
            .finish()
    }
}

fn ensure_passphrase(expected: &str, network: &GetNetworkResponse) -> Result<(), Error> {
    if network.passphrase == expected {
        return Ok(());
    }
    Err(Error::Config(format!(
        "RPC node serves '{}' but the client is configured for '{expected}'",
        network.passphrase
    )))
}

/// Read an unsigned integer from a decoded contract value.
fn decode_u64(value: &ScVal, what: &'static str) -> Result<u64, Error> {
    match to_native_opt(Some(value)) {
        serde_json::Value::String(text) => text
            .parse()
            .map_err(|e| Error::decode(what, format!("'{text}': {e}"))),
        other => Err(Error::decode(what, format!("expected an integer, got {other}"))),
    }
}

// ============================================================================
// SupplyChainBuilder
// ============================================================================

/// Builder for creating a [`SupplyChain`] client.
///
/// # Example
///
/// ```rust,no_run
/// use supply_kit::*;
///
/// # fn example() -> Result<(), supply_kit::Error> {
/// let tracker = SupplyChain::custom("http://localhost:8000/rpc", "Standalone Network ; February 2017")
///     .contract("CBX6DIAW47UHW7CLUOH2OK3JO326NFFNMLFXOTLGOEMWISALNIXMCFG7")
///     .wallet(KeypairWallet::generate())
///     .poll_config(PollConfig::unbounded())
///     .build()?;
/// # let _ = tracker;
/// # Ok(())
/// # }
/// ```
pub struct SupplyChainBuilder {
    rpc_url: String,
    passphrase: String,
    network: Network,
    contract: Option<String>,
    wallet: Option<Arc<dyn Wallet>>,
    chain: Option<Arc<dyn ChainClient>>,
    poll_config: PollConfig,
    retry_config: RetryConfig,
}

impl SupplyChainBuilder {
    fn new(rpc_url: impl Into<String>, passphrase: impl Into<String>, network: Network) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            passphrase: passphrase.into(),
            network,
            contract: None,
            wallet: None,
            chain: None,
            poll_config: PollConfig::default(),
            retry_config: RetryConfig::default(),
        }
    }

    /// Set the contract address (`C...`). Parsed by [`build`](Self::build).
    pub fn contract(mut self, contract_id: impl Into<String>) -> Self {
        self.contract = Some(contract_id.into());
        self
    }

    /// Override the network passphrase.
    pub fn passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.passphrase = passphrase.into();
        self.network = Network::from_passphrase(&self.passphrase);
        self
    }

    /// Set the wallet that signs transactions.
    pub fn wallet(mut self, wallet: impl Wallet + 'static) -> Self {
        self.wallet = Some(Arc::new(wallet));
        self
    }

    /// Set the wallet from a shared handle.
    pub fn shared_wallet(mut self, wallet: Arc<dyn Wallet>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Sign with an in-memory key given as an `S...` seed.
    pub fn secret_key(self, secret: &str) -> Result<Self, Error> {
        Ok(self.wallet(KeypairWallet::from_secret(secret)?))
    }

    /// Use a custom chain client instead of JSON-RPC to the configured URL.
    pub fn chain_client(mut self, chain: impl ChainClient + 'static) -> Self {
        self.chain = Some(Arc::new(chain));
        self
    }

    /// Set how submitted transactions are awaited.
    pub fn poll_config(mut self, config: PollConfig) -> Self {
        self.poll_config = config;
        self
    }

    /// Set the retry configuration of the RPC client.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<SupplyChain, Error> {
        let contract_id = self.contract.ok_or_else(|| {
            Error::Config("No contract configured. Call .contract() on SupplyChainBuilder".into())
        })?;
        let contract: ContractAddress = contract_id.parse()?;
        let wallet = self.wallet.ok_or(Error::NoWallet)?;

        let (chain, rpc): (Arc<dyn ChainClient>, Option<RpcClient>) = match self.chain {
            Some(chain) => (chain, None),
            None => {
                let rpc = RpcClient::with_retry_config(self.rpc_url.clone(), self.retry_config);
                (Arc::new(rpc.clone()), Some(rpc))
            }
        };

        let submitter = Submitter::new(chain.clone(), wallet.clone(), self.passphrase.clone())
            .with_poll_config(self.poll_config);

        Ok(SupplyChain {
            session: Arc::new(Session::new(wallet, chain.clone())),
            submitter: Arc::new(submitter),
            chain,
            rpc,
            contract,
            network: self.network,
            passphrase: self.passphrase,
            rpc_url: self.rpc_url,
            activity: ActivityTracker::new(),
            counters: Arc::new(RwLock::new(Counters::default())),
        })
    }
}

impl std::fmt::Debug for SupplyChainBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupplyChainBuilder")
            .field("rpc_url", &self.rpc_url)
            .field("network", &self.network)
            .field("contract", &self.contract)
            .finish()
    }
}
