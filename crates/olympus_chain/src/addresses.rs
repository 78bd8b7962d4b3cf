use std::collections::HashMap;
use std::fmt;

use alloy::primitives::{Address, address};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::ChainError;
use crate::network::Network;

/// sOHM holder whose balance tracks the staking index.
pub const INDEX_REFERENCE_HOLDER: Address = address!("0xA62Bee23497C920B94305FF68FA7b1Cd1e9FAdb2");

/// Every contract the dashboard talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Contract {
    Dai,
    Ohm,
    Staking,
    SOhm,
    Presale,
    AOhm,
    Migrate,
    LpStaking,
    Lp,
    Distributor,
}

impl Contract {
    pub fn name(&self) -> &'static str {
        match self {
            Contract::Dai => "DAI",
            Contract::Ohm => "OHM",
            Contract::Staking => "STAKING",
            Contract::SOhm => "SOHM",
            Contract::Presale => "PRESALE",
            Contract::AOhm => "AOHM",
            Contract::Migrate => "MIGRATE",
            Contract::LpStaking => "LPSTAKING",
            Contract::Lp => "LP",
            Contract::Distributor => "DISTRIBUTOR",
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deployed contract addresses for one network. `None` means the feature
/// backed by that contract is unavailable there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub dai: Option<Address>,
    pub ohm: Option<Address>,
    pub staking: Option<Address>,
    pub sohm: Option<Address>,
    pub presale: Option<Address>,
    pub aohm: Option<Address>,
    pub migrate: Option<Address>,
    pub lp_staking: Option<Address>,
    pub lp: Option<Address>,
    pub distributor: Option<Address>,
}

impl ContractAddresses {
    pub fn get(&self, contract: Contract) -> Option<Address> {
        match contract {
            Contract::Dai => self.dai,
            Contract::Ohm => self.ohm,
            Contract::Staking => self.staking,
            Contract::SOhm => self.sohm,
            Contract::Presale => self.presale,
            Contract::AOhm => self.aohm,
            Contract::Migrate => self.migrate,
            Contract::LpStaking => self.lp_staking,
            Contract::Lp => self.lp,
            Contract::Distributor => self.distributor,
        }
    }

    /// Address of `contract`, or [`ChainError::MissingContract`] when the
    /// network has no deployment of it.
    pub fn require(&self, contract: Contract, chain_id: u64) -> Result<Address, ChainError> {
        self.get(contract)
            .ok_or(ChainError::MissingContract { contract, chain_id })
    }
}

/// Network-specific configuration: endpoints plus the contract table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub contracts: ContractAddresses,
}

static CHAIN_CONFIGS: Lazy<HashMap<Network, ChainConfig>> = Lazy::new(|| {
    let mut configs = HashMap::new();

    configs.insert(
        Network::Rinkeby,
        ChainConfig {
            name: Network::Rinkeby.label().to_string(),
            chain_id: 4,
            rpc_url: "https://rpc.ankr.com/eth_rinkeby".to_string(),
            contracts: ContractAddresses {
                dai: Some(address!("0xFd08f094B0eFe901aD95B650A382fc6468b374de")),
                ohm: Some(address!("0xfc1ba9d9568a65ecab3a466959aae06ebcf05704")),
                staking: Some(address!("0xA33a1015847569221f7613E89BB463AE6d628799")),
                sohm: Some(address!("0x83b334767f0C60C01938e695288ada176Ae03C6B")),
                presale: Some(address!("0x90d1dd1fa2fddd5076850f342f31717a0556fdf7")),
                aohm: Some(address!("0x410D96DF0F9e778d0E3a7B93547e40f06e823618")),
                migrate: Some(address!("0x3BA7C6346b93DA485e97ba55aec28E8eDd3e33E2")),
                lp_staking: Some(address!("0x797C6E26D099b971cc95138D55729a58B34c5e6B")),
                lp: Some(address!("0xc6d0e140a030e4efe2fb561160a9d0e9e349ca67")),
                distributor: None,
            },
        },
    );

    configs.insert(
        Network::Mainnet,
        ChainConfig {
            name: Network::Mainnet.label().to_string(),
            chain_id: 1,
            rpc_url: "https://eth.llamarpc.com".to_string(),
            contracts: ContractAddresses {
                dai: Some(address!("0x6b175474e89094c44da98b954eedeac495271d0f")),
                ohm: Some(address!("0x383518188c0c6d7730d91b2c03a03c837814a899")),
                staking: Some(address!("0x0822F3C03dcc24d200AFF33493Dc08d0e1f274A2")),
                sohm: Some(address!("0x31932E6e45012476ba3A3A4953cbA62AeE77Fbbe")),
                presale: Some(address!("0xcBb60264fe0AC96B0EFa0145A9709A825afa17D8")),
                aohm: Some(address!("0x24ecfd535675f36ba1ab9c5d39b50dc097b0792e")),
                migrate: Some(address!("0xC7f56EC779cB9e60afA116d73F3708761197dB3d")),
                lp_staking: Some(address!("0xF11f0F078BfaF05a28Eac345Bb84fcb2a3722223")),
                lp: Some(address!("0x34d7d7Aaf50AD4944B70B320aCB24C95fa2def7c")),
                distributor: Some(address!("0x2ce62B196EA521C88D6CF884283cb0372f4a6cd1")),
            },
        },
    );

    configs
});

/// Returns default chain configurations for all supported networks.
pub fn get_chain_configs() -> &'static HashMap<Network, ChainConfig> {
    &CHAIN_CONFIGS
}

/// Contract table for a chain id, if the dashboard is deployed there.
pub fn contracts_for(chain_id: u64) -> Option<&'static ContractAddresses> {
    let network = Network::from_chain_id(chain_id)?;
    CHAIN_CONFIGS.get(&network).map(|c| &c.contracts)
}
