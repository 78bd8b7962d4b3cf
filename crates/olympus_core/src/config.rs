use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default CoinGecko API root used for market data and exchange rates.
pub const DEFAULT_MARKET_API_URL: &str = "https://api.coingecko.com/api/v3";

// ---------------------------------------------------------------------------
// DashboardConfig
// ---------------------------------------------------------------------------

/// Dashboard configuration stored at `~/.olympus/config.json`.
///
/// Signing keys are **never** written here. They live in the encrypted key
/// store (`~/.olympus/wallets.json`) managed by `olympus_chain`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DashboardConfig {
    // Chain
    pub network: u64,
    pub rpc_overrides: BTreeMap<u64, String>,
    pub confirmations: u64,
    pub network_poll_secs: u64,

    // Market data
    pub market_api_url: String,
    pub exchange_rate_ids: Vec<String>,
    pub http_timeout_secs: u64,

    // Presale
    pub whitelist: Vec<String>,

    // General
    pub log_level: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            network: 1,
            rpc_overrides: BTreeMap::new(),
            confirmations: 1,
            network_poll_secs: 15,
            market_api_url: DEFAULT_MARKET_API_URL.into(),
            exchange_rate_ids: vec!["dai".into(), "ethereum".into(), "olympus".into()],
            http_timeout_secs: 30,
            whitelist: Vec::new(),
            log_level: "info".into(),
        }
    }
}

impl DashboardConfig {
    /// Returns the base config directory: `~/.olympus/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".olympus"))
    }

    /// Returns the config file path: `~/.olympus/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.olympus/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Returns the encrypted key store path: `~/.olympus/wallets.json`
    pub fn wallets_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("wallets.json"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from disk, or creates default if missing.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Saves config to `~/.olympus/config.json`.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to_path(&path)
    }

    /// Save config to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// RPC URL override for a chain id, if one is configured.
    pub fn rpc_override(&self, chain_id: u64) -> Option<&str> {
        self.rpc_overrides.get(&chain_id).map(String::as_str)
    }
}
