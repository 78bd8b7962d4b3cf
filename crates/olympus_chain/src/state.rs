use std::collections::BTreeMap;

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::epoch::NextEpoch;
use crate::market::MarketData;
use crate::network::NetworkInfo;

/// Token balances of the session account, scaled to whole tokens.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Balances {
    pub dai: f64,
    pub aohm: f64,
    pub ohm: f64,
    pub sohm: f64,
    pub lp: f64,
    pub lp_staked: f64,
    pub pending_rewards: f64,
}

/// Raw allowances granted by the session account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Allowances {
    /// DAI → presale.
    pub presale: U256,
    /// OHM → staking.
    pub stake: U256,
    /// sOHM → staking.
    pub unstake: U256,
    /// LP → LP staking.
    pub lp_stake: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StakingStats {
    pub reward: f64,
    pub apy: f64,
    pub rebase: f64,
    pub current_index: f64,
    pub lp_apy: f64,
    pub total_lp_staked: f64,
    pub next_epoch_distribution: f64,
}

/// Session holdings as a percentage of circulating supply.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SupplyShare {
    pub ohm_percent: f64,
    pub sohm_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PresaleState {
    /// aOHM each buyer may purchase.
    pub allotment: f64,
    /// aOHM received for the last quoted DAI amount.
    pub quote: f64,
    /// DAI needed to buy the full allotment.
    pub max_purchase: f64,
}

/// Everything a dashboard view renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    pub loading: bool,
    pub address: Option<Address>,
    pub network: Option<NetworkInfo>,
    pub whitelisted: bool,
    pub balances: Balances,
    pub allowances: Allowances,
    pub staking: StakingStats,
    pub epoch: Option<NextEpoch>,
    pub supply_share: SupplyShare,
    pub presale: PresaleState,
    /// aOHM that can be migrated.
    pub max_swap: f64,
    pub market: MarketData,
    pub exchange_rates: BTreeMap<String, f64>,
    /// An approval transaction has been sent and is awaiting confirmation.
    pub approval_pending: bool,
    pub confirmations: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            loading: false,
            address: None,
            network: None,
            whitelisted: false,
            balances: Balances::default(),
            allowances: Allowances::default(),
            staking: StakingStats::default(),
            epoch: None,
            supply_share: SupplyShare::default(),
            presale: PresaleState::default(),
            max_swap: 0.0,
            market: MarketData::default(),
            exchange_rates: BTreeMap::new(),
            approval_pending: false,
            confirmations: 1,
        }
    }
}

/// Result of a full login read.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSnapshot {
    pub address: Address,
    pub network: NetworkInfo,
    pub whitelisted: bool,
    pub balances: Balances,
    pub allowances: Allowances,
    pub staking: StakingStats,
    pub epoch: NextEpoch,
    pub supply_share: SupplyShare,
    pub market: MarketData,
}

impl DashboardState {
    /// Fresh state for a new session. Exchange rates and the confirmation
    /// setting are not tied to an account and carry over.
    pub fn reset_for_new_session(&mut self) {
        let exchange_rates = std::mem::take(&mut self.exchange_rates);
        let confirmations = self.confirmations;
        *self = Self {
            exchange_rates,
            confirmations,
            ..Self::default()
        };
    }

    pub fn apply_login(&mut self, snapshot: &LoginSnapshot) {
        self.address = Some(snapshot.address);
        self.network = Some(snapshot.network);
        self.whitelisted = snapshot.whitelisted;
        self.balances = snapshot.balances;
        self.allowances = snapshot.allowances;
        self.staking = snapshot.staking;
        self.epoch = Some(snapshot.epoch);
        self.supply_share = snapshot.supply_share;
        self.market = snapshot.market;
        self.loading = false;
    }
}
