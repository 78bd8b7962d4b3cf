//! In-memory chain and wallet for exercising the action layer.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use alloy::primitives::{Address, B256, U256, address};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::addresses::{ContractAddresses, contracts_for};
use crate::client::{ChainClient, TxReceipt};
use crate::contracts::{ContractRead, ContractWrite};
use crate::error::ChainError;
use crate::wallet::{WalletEvent, WalletProvider};

pub const USER: Address = address!("0x742d35Cc6634C0532925a3b844Bc9e7595f2bD18");

/// Chain double: reads come from a value table (missing entries read as
/// zero) and writes apply the token movements the real contracts would.
pub struct MockChain {
    account: Option<Address>,
    can_sign: bool,
    chain_id: u64,
    contracts: ContractAddresses,
    block: AtomicU64,
    values: Mutex<HashMap<ContractRead, U256>>,
    writes: Mutex<Vec<ContractWrite>>,
    submit_delay: Mutex<Option<Duration>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    nonce: AtomicU64,
}

impl MockChain {
    pub fn new(chain_id: u64, account: Option<Address>) -> Self {
        Self {
            account,
            can_sign: true,
            chain_id,
            contracts: contracts_for(chain_id).cloned().unwrap_or_default(),
            block: AtomicU64::new(1),
            values: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            submit_delay: Mutex::new(None),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            nonce: AtomicU64::new(0),
        }
    }

    pub fn mainnet() -> Self {
        Self::new(1, Some(USER))
    }

    pub fn read_only(mut self) -> Self {
        self.can_sign = false;
        self
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    pub fn set_block(&self, height: u64) {
        self.block.store(height, Ordering::SeqCst);
    }

    pub fn set(&self, read: ContractRead, value: U256) {
        self.values.lock().insert(read, value);
    }

    pub fn get(&self, read: ContractRead) -> U256 {
        self.values.lock().get(&read).copied().unwrap_or_default()
    }

    /// Balance of the session account for `token`.
    pub fn balance(&self, token: Address) -> U256 {
        self.get(self.balance_key(token))
    }

    pub fn set_balance(&self, token: Address, value: U256) {
        self.set(self.balance_key(token), value);
    }

    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.lock() = Some(delay);
    }

    pub fn writes(&self) -> Vec<ContractWrite> {
        self.writes.lock().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn owner(&self) -> Address {
        self.account.unwrap_or_default()
    }

    fn balance_key(&self, token: Address) -> ContractRead {
        ContractRead::BalanceOf {
            token,
            owner: self.owner(),
        }
    }

    fn adjust(&self, read: ContractRead, add: U256, sub: U256) {
        let mut values = self.values.lock();
        let entry = values.entry(read).or_default();
        *entry = entry.saturating_add(add).saturating_sub(sub);
    }

    fn apply(&self, write: ContractWrite) {
        let c = &self.contracts;
        let owner = self.owner();
        match write {
            ContractWrite::Approve {
                token,
                spender,
                amount,
            } => self.set(
                ContractRead::Allowance {
                    token,
                    owner,
                    spender,
                },
                amount,
            ),
            ContractWrite::PurchaseAohm { amount, .. } => {
                if let Some(dai) = c.dai {
                    self.adjust(self.balance_key(dai), U256::ZERO, amount);
                }
            }
            ContractWrite::StakeOhm { amount, .. } => {
                if let (Some(ohm), Some(sohm)) = (c.ohm, c.sohm) {
                    self.adjust(self.balance_key(ohm), U256::ZERO, amount);
                    self.adjust(self.balance_key(sohm), amount, U256::ZERO);
                }
            }
            ContractWrite::UnstakeOhm { amount, .. } => {
                if let (Some(ohm), Some(sohm)) = (c.ohm, c.sohm) {
                    self.adjust(self.balance_key(sohm), U256::ZERO, amount);
                    self.adjust(self.balance_key(ohm), amount, U256::ZERO);
                }
            }
            ContractWrite::StakeLp { lp_staking, amount } => {
                if let Some(lp) = c.lp {
                    self.adjust(self.balance_key(lp), U256::ZERO, amount);
                    let staked = ContractRead::LpUserBalance {
                        lp_staking,
                        staker: owner,
                    };
                    self.adjust(staked, amount, U256::ZERO);
                }
            }
            ContractWrite::UnstakeLp { lp_staking } => {
                if let Some(lp) = c.lp {
                    let staked_key = ContractRead::LpUserBalance {
                        lp_staking,
                        staker: owner,
                    };
                    let staked = self.get(staked_key);
                    self.set(staked_key, U256::ZERO);
                    self.adjust(self.balance_key(lp), staked, U256::ZERO);
                }
            }
            ContractWrite::ClaimRewards { lp_staking } => {
                let pending_key = ContractRead::LpPendingRewards {
                    lp_staking,
                    staker: owner,
                };
                let pending = self.get(pending_key);
                self.set(pending_key, U256::ZERO);
                if let Some(ohm) = c.ohm {
                    self.adjust(self.balance_key(ohm), pending, U256::ZERO);
                }
            }
            ContractWrite::Migrate { amount, .. } => {
                if let (Some(aohm), Some(ohm)) = (c.aohm, c.ohm) {
                    self.adjust(self.balance_key(aohm), U256::ZERO, amount);
                    self.adjust(self.balance_key(ohm), amount, U256::ZERO);
                }
            }
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn account(&self) -> Option<Address> {
        self.account
    }

    fn can_sign(&self) -> bool {
        self.can_sign
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.block.load(Ordering::SeqCst))
    }

    async fn read(&self, call: ContractRead) -> Result<U256, ChainError> {
        Ok(self.get(call))
    }

    async fn submit(&self, call: ContractWrite, _confirmations: u64) -> Result<TxReceipt, ChainError> {
        if !self.can_sign {
            return Err(ChainError::ReadOnly);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = *self.submit_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.writes.lock().push(call);
        self.apply(call);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        Ok(TxReceipt {
            hash: B256::left_padding_from(&nonce.to_be_bytes()),
            block_number: Some(self.block.load(Ordering::SeqCst)),
            success: true,
        })
    }
}

/// Wallet double that always connects to the same [`MockChain`].
pub struct MockWallet {
    chain: Mutex<Arc<MockChain>>,
    events: broadcast::Sender<WalletEvent>,
    connects: AtomicUsize,
}

impl MockWallet {
    pub fn new(chain: Arc<MockChain>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            chain: Mutex::new(chain),
            events,
            connects: AtomicUsize::new(0),
        }
    }

    /// Point future connections at another chain, as when the user picks a
    /// different account in their wallet.
    pub fn switch(&self, chain: Arc<MockChain>) {
        *self.chain.lock() = chain;
    }

    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn connect(&self) -> Result<Arc<dyn ChainClient>, ChainError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.chain.lock().clone() as Arc<dyn ChainClient>)
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
