// Olympus dashboard: contract registry, chain access and the action layer.

pub mod addresses;
pub mod client;
pub mod contracts;
pub mod epoch;
pub mod error;
pub mod market;
pub mod network;
pub mod rpc_config;
pub mod state;
pub mod store;
pub mod units;
pub mod wallet;
pub mod wallet_store;
pub mod yields;

#[cfg(test)]
mod testing;

// Re-export primary types for convenient access.
pub use addresses::{ChainConfig, Contract, ContractAddresses, contracts_for, get_chain_configs};
pub use client::{ChainClient, RpcChainClient, TxReceipt};
pub use error::{ChainError, ErrorCategory};
pub use market::{MarketClient, MarketData};
pub use network::{Network, NetworkInfo};
pub use rpc_config::{RpcConfig, RpcConfigStore, validate_url};
pub use state::DashboardState;
pub use store::{Action, Dashboard, DashboardSettings, Migration};
pub use wallet::{RpcWallet, WalletAccount, WalletEvent, WalletProvider};
pub use wallet_store::{WalletEntry, WalletStore, decrypt_key, encrypt_key};
