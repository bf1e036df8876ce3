//! Quickstart - The product lifecycle on testnet
//!
//! Covers: node check, connect, register, update, lookup
//!
//! Run: cargo run --example quickstart
//!
//! Environment variables:
//!   STELLAR_SECRET_KEY=S...               (required, a funded testnet account)
//!   SUPPLY_CHAIN_NETWORK=testnet          (optional)
//!   SUPPLY_CHAIN_CONTRACT_ID=C...         (optional)
//!   RUST_LOG=supply_kit=debug             (optional)

use supply_kit::*;

// ============================================================================
// 1. Read-only calls
// ============================================================================

async fn lookup_example(tracker: &SupplyChain, product_id: &str) -> Result<(), Error> {
    println!("\n=== Lookup ===\n");

    match tracker.get_product_str(product_id).await? {
        Some(product) => {
            println!("Product #{}: {}", product.product_id, product.name);
            println!("  Manufacturer: {}", product.manufacturer);
            println!("  Location:     {}", product.current_location);
            println!("  Status:       {}", product.status);
            println!("  Updated:      {}", product.readable_timestamp());
        }
        None => println!("Product {product_id} is not registered"),
    }

    Ok(())
}

// ============================================================================
// 2. Signed calls
// ============================================================================

async fn lifecycle_example(tracker: &SupplyChain) -> Result<u64, Error> {
    println!("\n=== Lifecycle ===\n");

    let id = tracker
        .register_product(&NewProduct::new(
            "Laptop XPS 15",
            "Dell Inc.",
            "Factory A, China",
        ))
        .await?;
    println!("Registered product #{id}");

    let outcome = tracker
        .update_product_status(id, "Warehouse B, Rotterdam", ProductStatus::InTransit)
        .await?;
    println!("Moved to warehouse in transaction {}", outcome.hash);

    tracker
        .update_product_status(id, "Store 12, Berlin", ProductStatus::Delivered)
        .await?;
    println!("Delivered");

    Ok(id)
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("supply-kit Quickstart\n");

    let tracker = match SupplyChain::from_env() {
        Ok(tracker) => tracker,
        Err(e) => {
            println!("{e}");
            println!("Set STELLAR_SECRET_KEY to a funded testnet account to run this example.");
            println!("Fund one at: https://lab.stellar.org/account/fund");
            return Ok(());
        }
    };

    let node = tracker.check_network().await?;
    println!(
        "RPC node is {} at ledger {} (protocol {})",
        node.health, node.latest_ledger, node.protocol_version
    );

    let session = tracker.connect().await?;
    println!("Connected as {session} on {}", tracker.network());
    if let Some(total) = tracker.state().total_products {
        println!("{total} products registered");
    }

    let id = lifecycle_example(&tracker).await?;
    lookup_example(&tracker, &id.to_string()).await?;

    println!("\nNow {} products registered", tracker.total_products().await?);

    Ok(())
}
