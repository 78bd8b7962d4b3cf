//! Presentation values derived from raw contract reads.

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};

use crate::units::{OHM_DECIMALS, scale, to_display};

/// Rebases per year (three per day).
pub const REBASES_PER_YEAR: i32 = 1095;

/// Blocks per day assumed by the LP reward emission schedule.
pub const LP_BLOCKS_PER_DAY: f64 = 6650.0;

/// Days per year assumed by the LP reward emission schedule.
pub const LP_DAYS_PER_YEAR: f64 = 366.0;

/// Staking reward for the next epoch relative to circulating sOHM.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rebase {
    /// Per-epoch rebase, in percent.
    pub rebase: f64,
    /// `(1 + rebase)^1095`, in percent.
    pub apy: f64,
}

fn as_f64(value: U256) -> f64 {
    to_display(value, 0)
}

/// Share of `supply` held as `balance`, in percent. Both operands must share
/// the same decimals. An empty balance or an empty supply reports zero.
pub fn percent_of_supply(balance: U256, supply: U256) -> f64 {
    if balance.is_zero() || supply.is_zero() {
        return 0.0;
    }
    as_f64(balance) / as_f64(supply) * 100.0
}

pub fn staking_rebase(reward: U256, circulating: U256) -> Rebase {
    if circulating.is_zero() {
        return Rebase::default();
    }
    let ratio = as_f64(reward) / as_f64(circulating);
    Rebase {
        rebase: ratio * 100.0,
        apy: (1.0 + ratio).powi(REBASES_PER_YEAR) * 100.0,
    }
}

/// Annualized LP staking reward in percent: yearly OHM emission over the OHM
/// value backing the staked LP (counted twice for the DAI side).
pub fn lp_staking_apy(
    reward_per_block: U256,
    total_lp_staked: U256,
    ohm_in_lp: U256,
    total_lp: U256,
) -> f64 {
    if total_lp.is_zero() {
        return 0.0;
    }
    let staked_ohm_value = as_f64(total_lp_staked) * as_f64(ohm_in_lp) / as_f64(total_lp);
    let denominator = staked_ohm_value * 2.0;
    if denominator == 0.0 {
        return 0.0;
    }
    as_f64(reward_per_block) * LP_BLOCKS_PER_DAY * LP_DAYS_PER_YEAR * 100.0 / denominator
}

/// Largest presale purchase in DAI wei: the per-buyer allotment (9 decimals)
/// times the sale price (wei per whole token).
pub fn max_purchase(allotment: U256, sale_price: U256) -> U256 {
    allotment.saturating_mul(sale_price) / scale(OHM_DECIMALS)
}
