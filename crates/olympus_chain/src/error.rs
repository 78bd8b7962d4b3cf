use alloy::primitives::TxHash;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::addresses::Contract;

/// Errors surfaced by the chain client and the dashboard actions.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("no wallet provider available; this dashboard requires a wallet")]
    NoProvider,

    #[error("wallet has no connected account")]
    NoAccount,

    #[error("wallet is read-only and cannot sign transactions")]
    ReadOnly,

    #[error("no active wallet session; log in first")]
    NoSession,

    #[error("unsupported network: chain id {0}")]
    UnsupportedNetwork(u64),

    #[error("{contract} is not deployed on chain {chain_id}")]
    MissingContract { contract: Contract, chain_id: u64 },

    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: String },

    #[error("transaction rejected by user: {0}")]
    UserRejected(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("contract call failed: {0}")]
    Contract(String),

    #[error("transaction {0} reverted")]
    Reverted(TxHash),

    #[error("key store error: {0}")]
    KeyStore(String),
}

/// Broad error classification for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Caused by user action or input (rejection, bad amount, no wallet).
    User,
    /// Transport or node failure.
    Network,
    /// The contract refused the call or the transaction reverted.
    Contract,
    /// Missing deployment, unsupported chain, or key store trouble.
    Config,
}

impl ChainError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoProvider
            | Self::NoAccount
            | Self::ReadOnly
            | Self::NoSession
            | Self::InvalidAmount { .. }
            | Self::UserRejected(_) => ErrorCategory::User,
            Self::Rpc(_) => ErrorCategory::Network,
            Self::Contract(_) | Self::Reverted(_) => ErrorCategory::Contract,
            Self::UnsupportedNetwork(_) | Self::MissingContract { .. } | Self::KeyStore(_) => {
                ErrorCategory::Config
            }
        }
    }

    /// Wrap a transport-level failure.
    pub fn rpc(err: impl std::fmt::Display) -> Self {
        Self::classify(err.to_string(), Self::Rpc)
    }

    /// Wrap a failure from a contract call or transaction submission.
    pub fn contract(err: impl std::fmt::Display) -> Self {
        Self::classify(err.to_string(), Self::Contract)
    }

    fn classify(msg: String, fallback: fn(String) -> Self) -> Self {
        if is_user_rejection(&msg) {
            Self::UserRejected(msg)
        } else {
            fallback(msg)
        }
    }
}

/// Signers report rejections as provider errors with code 4001 or a
/// "user rejected"/"user denied" message.
fn is_user_rejection(msg: &str) -> bool {
    let lower = msg.to_ascii_lowercase();
    lower.contains("user rejected") || lower.contains("user denied") || lower.contains("code 4001")
}
