//! Etherscan diagnostics for the known Symbiotic contract set.
//!
//! Small operational helpers, not part of the aggregation flow: one checks
//! recent activity on the tracked contracts, the other locates each
//! contract's first transaction (its deployment).

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::Subcommand;
use serde::Deserialize;
use tracing::{info, warn};

use symbiont_core::constants::{
    NETWORK_REGISTRY_ADDRESS, OPERATOR_NETWORK_OPT_IN_ADDRESS, OPERATOR_REGISTRY_ADDRESS,
    OPERATOR_VAULT_OPT_IN_ADDRESS, VAULT_FACTORY_ADDRESS,
};

const ETHERSCAN_API: &str = "https://api.etherscan.io/api";

/// Delay between consecutive Etherscan calls (free-tier rate limit).
const RATE_LIMIT_DELAY: Duration = Duration::from_millis(300);

#[derive(Subcommand, Debug)]
pub enum ScanCommand {
    /// Check transaction activity on the tracked contracts since a block.
    CheckActivity {
        /// Block to check activity from.
        #[arg(long, default_value = "20651000")]
        start_block: u64,

        /// Etherscan API key.
        #[arg(long, env = "ETHERSCAN_API_KEY", default_value = "demo")]
        api_key: String,
    },

    /// Find the deployment (first transaction) of each tracked contract.
    FindDeployment {
        /// Etherscan API key.
        #[arg(long, env = "ETHERSCAN_API_KEY", default_value = "demo")]
        api_key: String,
    },
}

/// Named contract for diagnostics output.
struct KnownContract {
    name: &'static str,
    address: &'static str,
}

const ACTIVITY_CONTRACTS: &[KnownContract] = &[
    KnownContract {
        name: "VaultFactory",
        address: VAULT_FACTORY_ADDRESS,
    },
    KnownContract {
        name: "NetworkRegistry",
        address: NETWORK_REGISTRY_ADDRESS,
    },
    KnownContract {
        name: "OperatorRegistry",
        address: OPERATOR_REGISTRY_ADDRESS,
    },
    KnownContract {
        name: "OperatorNetworkOptInService",
        address: OPERATOR_NETWORK_OPT_IN_ADDRESS,
    },
    KnownContract {
        name: "OperatorVaultOptInService",
        address: OPERATOR_VAULT_OPT_IN_ADDRESS,
    },
];

const DEPLOYMENT_CONTRACTS: &[KnownContract] = &[
    KnownContract {
        name: "VaultFactory",
        address: VAULT_FACTORY_ADDRESS,
    },
    KnownContract {
        name: "NetworkRegistry",
        address: NETWORK_REGISTRY_ADDRESS,
    },
    KnownContract {
        name: "OperatorRegistry",
        address: OPERATOR_REGISTRY_ADDRESS,
    },
];

#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    status: String,
    result: Option<Vec<TxRecord>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TxRecord {
    block_number: String,
    time_stamp: String,
    hash: String,
    #[serde(default)]
    input: String,
    #[serde(default)]
    to: String,
}

impl TxRecord {
    fn timestamp_iso(&self) -> String {
        self.time_stamp
            .parse::<i64>()
            .ok()
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| self.time_stamp.clone())
    }
}

pub async fn run(command: ScanCommand) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()
        .context("Failed to build HTTP client")?;

    match command {
        ScanCommand::CheckActivity {
            start_block,
            api_key,
        } => check_activity(&client, start_block, &api_key).await,
        ScanCommand::FindDeployment { api_key } => find_deployment(&client, &api_key).await,
    }
}

async fn check_activity(client: &reqwest::Client, start_block: u64, api_key: &str) -> Result<()> {
    info!("🔍 Checking Symbiotic contract activity since block {start_block}...");

    for contract in ACTIVITY_CONTRACTS {
        match fetch_transactions(client, contract.address, start_block, 10, api_key).await {
            Ok(txs) if !txs.is_empty() => {
                info!("📄 {} ({})", contract.name, contract.address);
                info!("   Transactions since block {}: {}", start_block, txs.len());
                let first = &txs[0];
                info!(
                    "   First TX: Block {} ({})",
                    first.block_number,
                    first.timestamp_iso()
                );
                info!("   TX Hash: {}", first.hash);
            }
            Ok(_) => info!("📄 {}: No transactions or API error", contract.name),
            Err(e) => warn!("📄 {}: {}", contract.name, e),
        }
        tokio::time::sleep(RATE_LIMIT_DELAY).await;
    }

    info!("✅ Activity check complete!");
    Ok(())
}

async fn find_deployment(client: &reqwest::Client, api_key: &str) -> Result<()> {
    info!("🔍 Finding deployment blocks for Symbiotic contracts...");

    for contract in DEPLOYMENT_CONTRACTS {
        match fetch_transactions(client, contract.address, 0, 1, api_key).await {
            Ok(txs) if !txs.is_empty() => {
                let first = &txs[0];
                info!("📄 {} ({})", contract.name, contract.address);
                info!(
                    "   First TX: Block {} ({})",
                    first.block_number,
                    first.timestamp_iso()
                );
                info!("   TX Hash: {}", first.hash);
                if first.input.len() >= 10 {
                    info!("   Method: {}", &first.input[..10]);
                }
                // An empty `to` field marks a contract creation transaction
                if first.to.is_empty() {
                    info!("   🎯 CONTRACT CREATION");
                }
            }
            Ok(_) => info!("📄 {}: No transactions found", contract.name),
            Err(e) => warn!("📄 {}: {}", contract.name, e),
        }
        tokio::time::sleep(RATE_LIMIT_DELAY).await;
    }

    info!("✅ Deployment check complete!");
    Ok(())
}

/// Fetch the oldest transactions of an address from Etherscan.
async fn fetch_transactions(
    client: &reqwest::Client,
    address: &str,
    start_block: u64,
    limit: u32,
    api_key: &str,
) -> Result<Vec<TxRecord>> {
    let response: EtherscanResponse = client
        .get(ETHERSCAN_API)
        .query(&[
            ("module", "account"),
            ("action", "txlist"),
            ("address", address),
            ("startblock", &start_block.to_string()),
            ("endblock", "latest"),
            ("page", "1"),
            ("offset", &limit.to_string()),
            ("sort", "asc"),
            ("apikey", api_key),
        ])
        .send()
        .await
        .context("Etherscan request failed")?
        .json()
        .await
        .context("Invalid Etherscan response")?;

    if response.status != "1" {
        return Ok(Vec::new());
    }
    Ok(response.result.unwrap_or_default())
}
