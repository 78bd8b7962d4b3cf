use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::addresses::get_chain_configs;
use crate::network::Network;

/// Configuration for a single RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub network: Network,
    pub url: String,
    pub is_custom: bool,
}

/// Manages per-network RPC endpoint configuration with custom override support.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfigStore {
    configs: HashMap<Network, RpcConfig>,
}

impl RpcConfigStore {
    /// Create a store populated with default RPC URLs from [`get_chain_configs`].
    pub fn with_defaults() -> Self {
        let configs = get_chain_configs()
            .iter()
            .map(|(network, cc)| {
                let rpc = RpcConfig {
                    network: *network,
                    url: cc.rpc_url.clone(),
                    is_custom: false,
                };
                (*network, rpc)
            })
            .collect();

        Self { configs }
    }

    /// Defaults plus the `chain id → URL` overrides from the dashboard
    /// config. Overrides for unknown chains or with invalid URLs are skipped.
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (u64, &'a str)>) -> Self {
        let mut store = Self::with_defaults();
        for (chain_id, url) in overrides {
            let Some(network) = Network::from_chain_id(chain_id) else {
                tracing::warn!(chain_id, "ignoring RPC override for unsupported chain");
                continue;
            };
            if let Err(e) = store.set_custom_rpc(network, url.to_string()) {
                tracing::warn!(chain_id, error = %e, "ignoring RPC override");
            }
        }
        store
    }

    /// Get the RPC configuration for a network. Returns `None` if the network
    /// has no configuration (should not happen after [`with_defaults`]).
    ///
    /// [`with_defaults`]: Self::with_defaults
    pub fn get_rpc(&self, network: Network) -> Option<&RpcConfig> {
        self.configs.get(&network)
    }

    /// Override the RPC URL for a network with a custom endpoint.
    ///
    /// Returns `Err` if the URL fails validation.
    pub fn set_custom_rpc(&mut self, network: Network, url: String) -> anyhow::Result<()> {
        if !validate_url(&url) {
            anyhow::bail!("invalid RPC URL: {url}");
        }

        let entry = self.configs.entry(network).or_insert_with(|| RpcConfig {
            network,
            url: String::new(),
            is_custom: false,
        });
        entry.url = url;
        entry.is_custom = true;
        Ok(())
    }

    /// Reset a network's RPC URL back to the built-in default.
    pub fn reset_to_default(&mut self, network: Network) {
        if let Some(default_config) = get_chain_configs().get(&network) {
            let entry = self.configs.entry(network).or_insert_with(|| RpcConfig {
                network,
                url: String::new(),
                is_custom: false,
                });
            entry.url = default_config.rpc_url.clone();
            entry.is_custom = false;
        }
    }
}

impl Default for RpcConfigStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_all_networks() {
        let store = RpcConfigStore::with_defaults();
        for network in Network::ALL {
            let rpc = store.get_rpc(network).unwrap();
            assert!(!rpc.is_custom);
        }
    }

    #[test]
    fn set_custom_rpc_marks_as_custom() {
        let mut store = RpcConfigStore::with_defaults();
        store
            .set_custom_rpc(Network::Mainnet, "https://my-node.example.com".into())
            .unwrap();

        let rpc = store.get_rpc(Network::Mainnet).unwrap();
        assert!(rpc.is_custom);
        assert_eq!(rpc.url, "https://my-node.example.com");
    }

    #[test]
    fn set_custom_rpc_rejects_invalid_urls() {
        let mut store = RpcConfigStore::with_defaults();
        assert!(store.set_custom_rpc(Network::Rinkeby, "not-a-url".into()).is_err());
        assert!(
            store
                .set_custom_rpc(Network::Rinkeby, "ftp://files.example.com".into())
                .is_err()
        );
        assert!(!store.get_rpc(Network::Rinkeby).unwrap().is_custom);
    }

    #[test]
    fn reset_to_default_restores_original_url() {
        let mut store = RpcConfigStore::with_defaults();
        let original = store.get_rpc(Network::Mainnet).unwrap().url.clone();

        store
            .set_custom_rpc(Network::Mainnet, "https://custom.example.com".into())
            .unwrap();
        assert_ne!(store.get_rpc(Network::Mainnet).unwrap().url, original);

        store.reset_to_default(Network::Mainnet);
        let after_reset = store.get_rpc(Network::Mainnet).unwrap();
        assert_eq!(after_reset.url, original);
        assert!(!after_reset.is_custom);
    }

    #[test]
    fn overrides_apply_to_known_chains_only() {
        let store = RpcConfigStore::with_overrides([
            (4, "http://localhost:8545"),
            (56, "https://bsc.example.com"),
            (1, "garbage"),
        ]);
        let rinkeby = store.get_rpc(Network::Rinkeby).unwrap();
        assert!(rinkeby.is_custom);
        assert_eq!(rinkeby.url, "http://localhost:8545");
        assert!(!store.get_rpc(Network::Mainnet).unwrap().is_custom);
    }

    #[test]
    fn validate_url_cases() {
        assert!(validate_url("https://rpc.example.com"));
        assert!(validate_url("http://localhost:8545"));
        assert!(!validate_url(""));
        assert!(!validate_url("not a url"));
        assert!(!validate_url("ftp://server.com"));
        assert!(!validate_url("file:///etc/passwd"));
    }
}
