//! Conversions between decimal strings and on-chain integer amounts.
//!
//! OHM, sOHM and aOHM use 9 decimals ("gwei" units); DAI and the OHM-DAI
//! LP token use 18 ("ether" units).

use alloy::primitives::U256;
use alloy::primitives::utils::{ParseUnits, format_units, parse_units};

use crate::error::ChainError;

pub const OHM_DECIMALS: u8 = 9;
pub const ETHER_DECIMALS: u8 = 18;

/// Decimal string to smallest-unit integer.
pub fn parse_amount(value: &str, decimals: u8) -> Result<U256, ChainError> {
    let trimmed = value.trim();
    if let Some((_, fraction)) = trimmed.split_once('.') {
        if fraction.trim_end_matches('0').len() > usize::from(decimals) {
            return Err(invalid(value, format!("more than {decimals} decimal places")));
        }
    }
    match parse_units(trimmed, decimals) {
        Ok(ParseUnits::U256(amount)) => Ok(amount),
        Ok(ParseUnits::I256(_)) => Err(invalid(value, "amount must not be negative")),
        Err(e) => Err(invalid(value, e)),
    }
}

/// Smallest-unit integer to a decimal string with trailing zeros trimmed
/// (always keeps one fractional digit, e.g. `"12.0"`).
pub fn format_amount(value: U256, decimals: u8) -> String {
    let formatted = format_units(value, decimals).unwrap_or_else(|_| value.to_string());
    trim_fraction(&formatted)
}

/// Smallest-unit integer scaled to a float for display and ratio math.
pub fn to_display(value: U256, decimals: u8) -> f64 {
    format_amount(value, decimals).parse().unwrap_or(0.0)
}

/// `10^decimals` as a `U256`.
pub fn scale(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Whether a user-entered amount is strictly positive. Non-numeric input is
/// treated as not positive.
pub fn is_positive(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok_and(|v| v > 0.0)
}

fn trim_fraction(formatted: &str) -> String {
    match formatted.split_once('.') {
        Some((whole, fraction)) => {
            let fraction = fraction.trim_end_matches('0');
            if fraction.is_empty() {
                format!("{whole}.0")
            } else {
                format!("{whole}.{fraction}")
            }
        }
        None => format!("{formatted}.0"),
    }
}

fn invalid(value: &str, reason: impl ToString) -> ChainError {
    ChainError::InvalidAmount {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
