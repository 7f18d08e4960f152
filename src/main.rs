//! Leaf Bridge server
//!
//! Serves disease predictions and spray commands to field controllers.

use anyhow::{Context, Result};
use tracing::info;

use leaf_bridge::config::BridgeConfig;
use leaf_bridge::server::run_server;
use leaf_bridge::utils::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    init_logging();

    let config = BridgeConfig::from_env().context("Invalid bridge configuration")?;
    info!(
        "Leaf bridge v{} (model version {}, {} classes)",
        env!("CARGO_PKG_VERSION"),
        config.model_version,
        config.taxonomy.labels.len()
    );

    run_server(config).await
}
