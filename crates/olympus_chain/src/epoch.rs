use serde::{Deserialize, Serialize};

/// Blocks between two rebases.
pub const EPOCH_INTERVAL: u64 = 2200;

/// Average block time in seconds.
// Drifts over time; a node-reported average would be more accurate.
pub const BLOCK_RATE_SECONDS: f64 = 13.14;

/// Countdown to the next rebase block.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NextEpoch {
    pub block: u64,
    pub blocks_away: u64,
    pub seconds_away: f64,
}

/// Next epoch boundary for the given block height. A height that sits exactly
/// on a boundary reports all zeros.
pub fn next_epoch(height: u64) -> NextEpoch {
    let offset = height % EPOCH_INTERVAL;
    if offset == 0 {
        return NextEpoch::default();
    }

    let block = height + EPOCH_INTERVAL - offset;
    let blocks_away = block - height;
    NextEpoch {
        block,
        blocks_away,
        seconds_away: blocks_away as f64 * BLOCK_RATE_SECONDS,
    }
}
