//! Olympus dashboard command line.
//!
//! Every chain command connects the configured wallet, logs in and runs one
//! dashboard action. `watch` keeps the session alive and follows account and
//! network changes until interrupted.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use olympus_chain::{
    Action, Dashboard, DashboardSettings, MarketClient, Network, RpcConfigStore, RpcWallet, WalletAccount,
    WalletProvider, WalletStore,
};
use olympus_core::DashboardConfig;
use olympus_core::logging;

/// Olympus token sale and staking dashboard.
#[derive(Parser, Debug)]
#[command(name = "olympus")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (default: ~/.olympus/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Network name or chain id; overrides the configured network
    #[arg(short, long)]
    network: Option<String>,

    /// JSON-RPC endpoint; overrides the network default
    #[arg(long, env = "OLYMPUS_RPC_URL")]
    rpc_url: Option<String>,

    /// Stored wallet (id or name) to sign with
    #[arg(short, long, conflicts_with = "address")]
    wallet: Option<String>,

    /// Watch an address without signing
    #[arg(long)]
    address: Option<String>,

    /// Password for the stored wallet
    #[arg(long, env = "OLYMPUS_WALLET_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log filter, e.g. "info" or "info,olympus_chain=trace"
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Log in and print the dashboard state as JSON
    Status,
    /// Print USD exchange rates
    Rates,
    /// aOHM received for an amount of DAI
    Quote { dai: String },
    /// aOHM each whitelisted buyer may purchase
    Allotment,
    /// DAI needed to buy the full allotment
    MaxPurchase,
    /// aOHM available for migration
    MaxSwap,
    /// Approve the presale to spend DAI
    ApprovePresale { dai: String },
    /// Buy aOHM with DAI
    Purchase { dai: String },
    /// Approve the staking contract to spend OHM
    ApproveStake {
        #[arg(default_value = "1")]
        amount: String,
    },
    /// Approve the staking contract to spend sOHM
    ApproveUnstake {
        #[arg(default_value = "1")]
        amount: String,
    },
    /// Approve the LP staking contract to spend LP tokens
    ApproveLp {
        #[arg(default_value = "1")]
        amount: String,
    },
    /// Stake OHM for sOHM
    Stake { amount: String },
    /// Unstake sOHM for OHM
    Unstake { amount: String },
    /// Stake OHM-DAI LP tokens
    StakeLp { amount: String },
    /// Withdraw all staked LP tokens
    UnstakeLp,
    /// Claim LP staking rewards
    Claim,
    /// Migrate aOHM to OHM
    Migrate { amount: String },
    /// Stay logged in and follow wallet and network changes
    Watch,
    /// Manage stored signing keys
    #[command(subcommand)]
    Wallet(WalletCommand),
}

#[derive(Subcommand, Debug, PartialEq)]
enum WalletCommand {
    /// Encrypt and store a private key
    Add {
        name: String,
        #[arg(long, env = "OLYMPUS_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },
    /// List stored wallets
    List,
    /// Remove a stored wallet by id or name
    Remove { wallet: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => DashboardConfig::load_from_path(path)?,
        None => DashboardConfig::load()?,
    };
    let level = args.log_level.as_deref().unwrap_or(config.log_level.as_str());
    let _log_guard = logging::init_logging(level)?;
    info!(version = env!("CARGO_PKG_VERSION"), "olympus starting");

    if let Command::Wallet(command) = &args.command {
        let path = DashboardConfig::wallets_path()?;
        return run_wallet_command(command, &path, args.password.as_deref());
    }

    let network = resolve_network(args.network.as_deref(), config.network)?;
    let rpc_url = resolve_rpc_url(args.rpc_url.as_deref(), &config, network)?;
    let account = resolve_account(&args)?;
    info!(network = network.label(), rpc_url = %rpc_url, account = ?account.address(), "session configured");

    let wallet = Arc::new(RpcWallet::new(rpc_url, account));
    let provider: Arc<dyn WalletProvider> = wallet.clone();
    let market = MarketClient::new(
        config.market_api_url.clone(),
        Duration::from_secs(config.http_timeout_secs),
    )?;
    let settings = DashboardSettings {
        confirmations: config.confirmations,
        exchange_rate_ids: config.exchange_rate_ids.clone(),
        ..DashboardSettings::default()
    }
    .with_whitelist(config.whitelist.iter().map(String::as_str));
    let dashboard = Arc::new(Dashboard::new(Some(provider), market, settings));

    if args.command == Command::Watch {
        let poll = Duration::from_secs(config.network_poll_secs.max(1));
        return watch(dashboard, wallet, poll, tokio::signal::ctrl_c()).await;
    }
    if args.command == Command::Rates {
        dashboard.refresh_exchange_rates().await;
        return print_json(&dashboard.state().exchange_rates);
    }

    dashboard.init().await?;
    if !dashboard.is_logged_in().await {
        bail!("no account selected; pass --wallet or --address");
    }
    run_command(&dashboard, args.command).await
}

async fn run_command(dashboard: &Dashboard, command: Command) -> Result<()> {
    match command {
        Command::Status => {
            dashboard.refresh_exchange_rates().await;
            dashboard.refresh_max_swap().await?;
            print_json(&dashboard.state())
        }
        Command::Quote { dai } => print_json(&dashboard.calculate_sale_quote(&dai).await?),
        Command::Allotment => print_json(&dashboard.refresh_allotment_per_buyer().await?),
        Command::MaxPurchase => print_json(&dashboard.refresh_max_purchase().await?),
        Command::MaxSwap => print_json(&dashboard.refresh_max_swap().await?),
        Command::ApprovePresale { dai } => print_approval(dashboard.approve_presale(&dai).await?),
        Command::Purchase { dai } => print_json(&dashboard.purchase_aohm(&dai).await?),
        Command::ApproveStake { amount } => print_approval(dashboard.approve_staking(&amount).await?),
        Command::ApproveUnstake { amount } => {
            print_approval(dashboard.approve_unstaking(&amount).await?)
        }
        Command::ApproveLp { amount } => print_approval(dashboard.approve_lp_staking(&amount).await?),
        Command::Stake { amount } => print_json(&dashboard.stake_ohm(&amount).await?),
        Command::Unstake { amount } => print_json(&dashboard.unstake_ohm(&amount).await?),
        Command::StakeLp { amount } => print_json(&dashboard.stake_lp(&amount).await?),
        Command::UnstakeLp => print_json(&dashboard.unstake_lp().await?),
        Command::Claim => print_json(&dashboard.claim_rewards().await?),
        Command::Migrate { amount } => print_json(&dashboard.migrate_to_ohm(&amount).await?),
        Command::Rates | Command::Watch | Command::Wallet(_) => {
            bail!("command does not run against a session")
        }
    }
}

/// Keep the dashboard live until `shutdown` resolves. A failed first login
/// is logged and left to the wallet listener to retry.
async fn watch<F: Future>(
    dashboard: Arc<Dashboard>,
    wallet: Arc<RpcWallet>,
    poll: Duration,
    shutdown: F,
) -> Result<()> {
    let watcher = wallet.spawn_network_watcher(poll);
    let listener = dashboard.spawn_wallet_listener();
    dashboard.dispatch(Action::Init).await;

    tokio::pin!(shutdown);
    let mut ticker = tokio::time::interval(poll);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received");
                break;
            }
            _ = ticker.tick() => {
                let state = dashboard.state();
                info!(
                    address = ?state.address,
                    chain_id = ?state.network.map(|n| n.chain_id),
                    ohm = state.balances.ohm,
                    sohm = state.balances.sohm,
                    apy = state.staking.apy,
                    next_epoch_in = ?state.epoch.map(|e| e.blocks_away),
                    "dashboard"
                );
            }
        }
    }

    watcher.abort();
    if let Some(listener) = listener {
        listener.abort();
    }
    Ok(())
}

fn resolve_network(flag: Option<&str>, configured: u64) -> Result<Network> {
    match flag {
        Some(value) => Network::parse(value).with_context(|| format!("unknown network {value:?}")),
        None => Network::from_chain_id(configured)
            .with_context(|| format!("configured chain id {configured} is not supported")),
    }
}

fn resolve_rpc_url(flag: Option<&str>, config: &DashboardConfig, network: Network) -> Result<String> {
    if let Some(url) = flag {
        return Ok(url.to_string());
    }
    if config.rpc_override(network.chain_id()).is_some() {
        debug!(chain_id = network.chain_id(), "using configured RPC override");
    }
    let store = RpcConfigStore::with_overrides(
        config
            .rpc_overrides
            .iter()
            .map(|(chain_id, url)| (*chain_id, url.as_str())),
    );
    store
        .get_rpc(network)
        .map(|rpc| rpc.url.clone())
        .with_context(|| format!("no RPC endpoint for {}", network.label()))
}

fn resolve_account(args: &Args) -> Result<WalletAccount> {
    if let Some(wallet) = &args.wallet {
        let password = args
            .password
            .as_deref()
            .context("set OLYMPUS_WALLET_PASSWORD or pass --password to unlock the wallet")?;
        let store = WalletStore::load_from_file(&DashboardConfig::wallets_path()?)?;
        return Ok(WalletAccount::Signer(store.unlock(wallet, password)?));
    }
    if let Some(address) = &args.address {
        let address: Address = address
            .parse()
            .with_context(|| format!("invalid address {address:?}"))?;
        return Ok(WalletAccount::Watch(address));
    }
    Ok(WalletAccount::None)
}

fn run_wallet_command(command: &WalletCommand, path: &Path, password: Option<&str>) -> Result<()> {
    let mut store = WalletStore::load_from_file(path)?;
    match command {
        WalletCommand::Add { name, private_key } => {
            let password = password.context("set OLYMPUS_WALLET_PASSWORD to encrypt the key")?;
            if store.find(name).is_some() {
                bail!("a wallet named {name:?} already exists");
            }
            let id = store.import_key(name.clone(), private_key, password)?;
            store.save_to_file(path)?;
            if let Some(entry) = store.get_wallet(&id) {
                println!("{}  {}  {}", entry.id, entry.name, entry.address);
            }
        }
        WalletCommand::List => {
            for entry in store.list_wallets() {
                println!(
                    "{}  {}  {}  {}",
                    entry.id,
                    entry.name,
                    entry.address,
                    entry.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        WalletCommand::Remove { wallet } => {
            let id = store
                .find(wallet)
                .map(|entry| entry.id.clone())
                .with_context(|| format!("no wallet {wallet:?}"))?;
            store.remove_wallet(&id);
            store.save_to_file(path)?;
            println!("removed {id}");
        }
    }
    Ok(())
}

fn print_approval(receipt: Option<olympus_chain::TxReceipt>) -> Result<()> {
    match receipt {
        Some(receipt) => print_json(&receipt),
        None => {
            println!("nothing to approve");
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
