use std::fmt;

use serde::{Deserialize, Serialize};

/// Networks the dashboard has a contract deployment on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Rinkeby,
}

impl Network {
    pub const ALL: [Network; 2] = [Network::Mainnet, Network::Rinkeby];

    /// Human-readable label for the network.
    pub fn label(&self) -> &'static str {
        match self {
            Network::Mainnet => "Ethereum Mainnet",
            Network::Rinkeby => "Rinkeby Testnet",
        }
    }

    /// EIP-155 chain id.
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Rinkeby => 4,
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|n| n.chain_id() == chain_id)
    }

    /// Parse a CLI-style network name (`mainnet`, `rinkeby`) or a numeric chain id.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "ethereum" => Some(Network::Mainnet),
            "rinkeby" => Some(Network::Rinkeby),
            other => other.parse().ok().and_then(Self::from_chain_id),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Network as reported by the connected provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub network: Option<Network>,
}

impl NetworkInfo {
    pub fn from_chain_id(chain_id: u64) -> Self {
        Self {
            chain_id,
            network: Network::from_chain_id(chain_id),
        }
    }
}
