//! Wallet provider: hands out session-bound chain clients and announces
//! account and network changes.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::{ChainClient, RpcChainClient};
use crate::error::ChainError;

const EVENT_CAPACITY: usize = 16;

/// Notification that the current session is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Option<Address>),
    NetworkChanged(u64),
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Request account access and return a client acting for the selected
    /// account. The client's `account()` is `None` when the wallet exposes
    /// no account.
    async fn connect(&self) -> Result<Arc<dyn ChainClient>, ChainError>;

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

/// Which account an [`RpcWallet`] acts for.
#[derive(Clone)]
pub enum WalletAccount {
    Signer(PrivateKeySigner),
    Watch(Address),
    None,
}

impl WalletAccount {
    pub fn address(&self) -> Option<Address> {
        match self {
            WalletAccount::Signer(signer) => Some(signer.address()),
            WalletAccount::Watch(address) => Some(*address),
            WalletAccount::None => None,
        }
    }
}

/// Wallet backed by a JSON-RPC endpoint and an optional local signer.
pub struct RpcWallet {
    rpc_url: String,
    account: RwLock<WalletAccount>,
    events: broadcast::Sender<WalletEvent>,
}

impl RpcWallet {
    pub fn new(rpc_url: impl Into<String>, account: WalletAccount) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            rpc_url: rpc_url.into(),
            account: RwLock::new(account),
            events,
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn address(&self) -> Option<Address> {
        self.account.read().address()
    }

    /// Replace the active account and notify subscribers.
    pub fn switch_account(&self, account: WalletAccount) {
        let address = account.address();
        *self.account.write() = account;
        info!(address = ?address, "wallet account changed");
        let _ = self.events.send(WalletEvent::AccountsChanged(address));
    }

    fn poll_client(&self) -> Result<RpcChainClient, ChainError> {
        RpcChainClient::read_only(&self.rpc_url, None)
    }

    /// Poll `eth_chainId` every `interval` and emit
    /// [`WalletEvent::NetworkChanged`] when it moves.
    pub fn spawn_network_watcher(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut last_chain_id = None;
            loop {
                ticker.tick().await;
                let chain_id = match self.poll_client() {
                    Ok(client) => client.chain_id().await,
                    Err(e) => Err(e),
                };
                match chain_id {
                    Ok(chain_id) => {
                        if let Some(event) = detect_network_change(&mut last_chain_id, chain_id) {
                            info!(chain_id, "network changed");
                            let _ = self.events.send(event);
                        }
                    }
                    Err(e) => warn!(error = %e, "network poll failed"),
                }
            }
        })
    }
}

#[async_trait]
impl WalletProvider for RpcWallet {
    async fn connect(&self) -> Result<Arc<dyn ChainClient>, ChainError> {
        let rpc_url = self.rpc_url.as_str();
        let account = self.account.read().clone();
        let client = match account {
            WalletAccount::Signer(signer) => RpcChainClient::with_signer(rpc_url, signer)?,
            WalletAccount::Watch(address) => RpcChainClient::read_only(rpc_url, Some(address))?,
            WalletAccount::None => RpcChainClient::read_only(rpc_url, None)?,
        };
        debug!(rpc_url = %rpc_url, account = ?client.account(), "wallet connected");
        Ok(Arc::new(client))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

/// The first observation only sets the baseline; later differences produce
/// an event.
pub fn detect_network_change(last: &mut Option<u64>, current: u64) -> Option<WalletEvent> {
    let previous = last.replace(current);
    match previous {
        Some(previous) if previous != current => Some(WalletEvent::NetworkChanged(current)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn first_poll_sets_baseline() {
        let mut last = None;
        assert_eq!(detect_network_change(&mut last, 1), None);
        assert_eq!(last, Some(1));
    }

    #[test]
    fn change_is_reported_once() {
        let mut last = Some(1);
        assert_eq!(
            detect_network_change(&mut last, 4),
            Some(WalletEvent::NetworkChanged(4))
        );
        assert_eq!(detect_network_change(&mut last, 4), None);
    }

    #[test]
    fn switch_account_notifies_subscribers() {
        let wallet = RpcWallet::new("http://127.0.0.1:8545", WalletAccount::None);
        let mut events = wallet.subscribe();
        assert_eq!(wallet.address(), None);

        let watch = address!("0x742d35Cc6634C0532925a3b844Bc9e7595f2bD18");
        wallet.switch_account(WalletAccount::Watch(watch));

        assert_eq!(wallet.address(), Some(watch));
        assert_eq!(events.try_recv().unwrap(), WalletEvent::AccountsChanged(Some(watch)));
    }

    #[tokio::test]
    async fn connect_binds_the_current_account() {
        let signer = PrivateKeySigner::random();
        let expected = signer.address();
        let wallet = RpcWallet::new("http://127.0.0.1:8545", WalletAccount::Signer(signer));

        let client = wallet.connect().await.unwrap();
        assert_eq!(client.account(), Some(expected));
        assert!(client.can_sign());

        wallet.switch_account(WalletAccount::None);
        let client = wallet.connect().await.unwrap();
        assert_eq!(client.account(), None);
        assert!(!client.can_sign());
    }
}
