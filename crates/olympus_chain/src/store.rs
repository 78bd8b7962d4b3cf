//! Dashboard action layer.
//!
//! [`Dashboard`] owns the session (the connected chain client and the
//! contract table of its network) and the [`DashboardState`] views render.
//! Every action reads through the session client and commits a typed result.
//! Transaction-submitting actions hold the transaction lock from submission
//! until the affected values have been refetched, so two writes never
//! interleave on one dashboard.

use std::collections::HashSet;
use std::sync::Arc;

use alloy::primitives::{Address, U256};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::addresses::{Contract, ContractAddresses, INDEX_REFERENCE_HOLDER, contracts_for};
use crate::client::{ChainClient, TxReceipt};
use crate::contracts::{ContractRead, ContractWrite};
use crate::epoch::next_epoch;
use crate::error::ChainError;
use crate::market::{MarketClient, MarketData};
use crate::network::NetworkInfo;
use crate::state::{Allowances, Balances, DashboardState, LoginSnapshot, StakingStats, SupplyShare};
use crate::units::{ETHER_DECIMALS, OHM_DECIMALS, is_positive, parse_amount, to_display};
use crate::wallet::WalletProvider;
use crate::yields::{lp_staking_apy, max_purchase, percent_of_supply, staking_rebase};

/// Token amount granted by the blanket staking, LP staking and migration
/// approvals.
const BLANKET_APPROVAL: &str = "1000000000";

/// Settings the dashboard takes from configuration.
#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub confirmations: u64,
    pub whitelist: HashSet<Address>,
    pub exchange_rate_ids: Vec<String>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            confirmations: 1,
            whitelist: HashSet::new(),
            exchange_rate_ids: vec!["dai".into(), "ethereum".into(), "olympus".into()],
        }
    }
}

impl DashboardSettings {
    /// Parse whitelist entries, skipping the ones that are not addresses.
    pub fn with_whitelist<'a>(mut self, entries: impl IntoIterator<Item = &'a str>) -> Self {
        for entry in entries {
            match entry.trim().parse::<Address>() {
                Ok(address) => {
                    self.whitelist.insert(address);
                }
                Err(e) => warn!(entry, error = %e, "ignoring invalid whitelist entry"),
            }
        }
        self
    }
}

/// Actions that can be run through [`Dashboard::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum Action {
    Init,
    Login,
    SetLoading(bool),
    RefreshExchangeRates,
    PurchaseAohm(String),
    ApprovePresale(String),
    RefreshPresaleAllowance,
    ApproveStaking(String),
    ApproveLpStaking(String),
    RefreshStakeAllowance,
    RefreshLpStakeAllowance,
    ApproveUnstaking(String),
    RefreshUnstakeAllowance,
    CalculateSaleQuote(String),
    RefreshAllotmentPerBuyer,
    RefreshMaxPurchase,
    StakeOhm(String),
    UnstakeOhm(String),
    StakeLp(String),
    UnstakeLp,
    ClaimRewards,
    RefreshMaxSwap,
    MigrateToOhm(String),
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Init => "init",
            Action::Login => "login",
            Action::SetLoading(_) => "set_loading",
            Action::RefreshExchangeRates => "refresh_exchange_rates",
            Action::PurchaseAohm(_) => "purchase_aohm",
            Action::ApprovePresale(_) => "approve_presale",
            Action::RefreshPresaleAllowance => "refresh_presale_allowance",
            Action::ApproveStaking(_) => "approve_staking",
            Action::ApproveLpStaking(_) => "approve_lp_staking",
            Action::RefreshStakeAllowance => "refresh_stake_allowance",
            Action::RefreshLpStakeAllowance => "refresh_lp_stake_allowance",
            Action::ApproveUnstaking(_) => "approve_unstaking",
            Action::RefreshUnstakeAllowance => "refresh_unstake_allowance",
            Action::CalculateSaleQuote(_) => "calculate_sale_quote",
            Action::RefreshAllotmentPerBuyer => "refresh_allotment_per_buyer",
            Action::RefreshMaxPurchase => "refresh_max_purchase",
            Action::StakeOhm(_) => "stake_ohm",
            Action::UnstakeOhm(_) => "unstake_ohm",
            Action::StakeLp(_) => "stake_lp",
            Action::UnstakeLp => "unstake_lp",
            Action::ClaimRewards => "claim_rewards",
            Action::RefreshMaxSwap => "refresh_max_swap",
            Action::MigrateToOhm(_) => "migrate_to_ohm",
        }
    }
}

/// Transactions sent by [`Dashboard::migrate_to_ohm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// Present when the migrator allowance had to be raised first.
    pub approval: Option<TxReceipt>,
    pub migration: TxReceipt,
}

/// A logged-in wallet on a supported network.
#[derive(Clone)]
struct Session {
    client: Arc<dyn ChainClient>,
    address: Address,
    chain_id: u64,
    contracts: ContractAddresses,
}

impl Session {
    fn require(&self, contract: Contract) -> Result<Address, ChainError> {
        self.contracts.require(contract, self.chain_id)
    }

    async fn read(&self, call: ContractRead) -> Result<U256, ChainError> {
        self.client.read(call).await
    }

    async fn balance_of(&self, token: Address) -> Result<U256, ChainError> {
        self.read(ContractRead::BalanceOf {
            token,
            owner: self.address,
        })
        .await
    }

    async fn allowance(&self, token: Address, spender: Address) -> Result<U256, ChainError> {
        self.read(ContractRead::Allowance {
            token,
            owner: self.address,
            spender,
        })
        .await
    }
}

pub struct Dashboard {
    wallet: Option<Arc<dyn WalletProvider>>,
    market: MarketClient,
    settings: DashboardSettings,
    state: RwLock<DashboardState>,
    session: tokio::sync::RwLock<Option<Session>>,
    tx_lock: Mutex<()>,
}

impl Dashboard {
    /// `wallet` is `None` when no wallet provider is available; every
    /// chain action then fails with [`ChainError::NoProvider`].
    pub fn new(
        wallet: Option<Arc<dyn WalletProvider>>,
        market: MarketClient,
        settings: DashboardSettings,
    ) -> Self {
        let state = DashboardState {
            confirmations: settings.confirmations,
            ..DashboardState::default()
        };
        Self {
            wallet,
            market,
            settings,
            state: RwLock::new(state),
            session: tokio::sync::RwLock::new(None),
            tx_lock: Mutex::new(()),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DashboardState {
        self.state.read().clone()
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.read().await.is_some()
    }

    fn wallet(&self) -> Result<&Arc<dyn WalletProvider>, ChainError> {
        self.wallet.as_ref().ok_or(ChainError::NoProvider)
    }

    async fn session(&self) -> Result<Session, ChainError> {
        self.session.read().await.clone().ok_or(ChainError::NoSession)
    }

    async fn send(&self, session: &Session, write: ContractWrite) -> Result<TxReceipt, ChainError> {
        let confirmations = self.state.read().confirmations;
        session.client.submit(write, confirmations).await
    }

    /// Drop the session and every account-bound value. Waits for any
    /// in-flight write so its refresh lands before the state is cleared.
    pub async fn reset_session(&self) {
        let _tx = self.tx_lock.lock().await;
        *self.session.write().await = None;
        self.state.write().reset_for_new_session();
    }

    // ---- session ----------------------------------------------------------

    /// Connect the wallet and log in when it exposes an account.
    pub async fn init(&self) -> Result<(), ChainError> {
        self.set_loading(true);
        let result = self.connect_and_login().await;
        self.set_loading(false);
        result
    }

    async fn connect_and_login(&self) -> Result<(), ChainError> {
        let client = self.wallet()?.connect().await?;
        if client.account().is_some() {
            self.login().await?;
        } else {
            debug!("wallet exposes no account, waiting for login");
        }
        Ok(())
    }

    /// Read everything the dashboard shows for the wallet's account and
    /// commit it in one step.
    pub async fn login(&self) -> Result<LoginSnapshot, ChainError> {
        let client = self.wallet()?.connect().await?;
        let address = client.account().ok_or(ChainError::NoAccount)?;
        let chain_id = client.chain_id().await?;
        let network = NetworkInfo::from_chain_id(chain_id);
        self.state.write().network = Some(network);

        let contracts = contracts_for(chain_id)
            .cloned()
            .ok_or(ChainError::UnsupportedNetwork(chain_id))?;
        let session = Session {
            client,
            address,
            chain_id,
            contracts,
        };

        let snapshot = self.read_snapshot(&session, network).await?;
        *self.session.write().await = Some(session);
        self.state.write().apply_login(&snapshot);
        info!(
            %address,
            chain_id,
            whitelisted = snapshot.whitelisted,
            "logged in"
        );

        if let Err(e) = self.refresh_allotment_per_buyer().await {
            warn!(error = %e, "failed to read presale allotment");
        }
        Ok(snapshot)
    }

    async fn read_snapshot(
        &self,
        session: &Session,
        network: NetworkInfo,
    ) -> Result<LoginSnapshot, ChainError> {
        let contracts = &session.contracts;
        let owner = session.address;
        let whitelisted = self.settings.whitelist.contains(&owner);

        let dai = session.require(Contract::Dai)?;
        let presale = session.require(Contract::Presale)?;
        let aohm = session.require(Contract::AOhm)?;

        let mut balances = Balances {
            dai: to_display(session.balance_of(dai).await?, ETHER_DECIMALS),
            aohm: to_display(session.balance_of(aohm).await?, OHM_DECIMALS),
            ..Balances::default()
        };
        let mut allowances = Allowances {
            presale: session.allowance(dai, presale).await?,
            ..Allowances::default()
        };
        let mut staking = StakingStats::default();

        if let Some(lp) = contracts.lp {
            balances.lp = to_display(session.balance_of(lp).await?, ETHER_DECIMALS);
        }

        if let Some(lp_staking) = contracts.lp_staking {
            let lp = session.require(Contract::Lp)?;
            let ohm = session.require(Contract::Ohm)?;
            let total_staked = session.read(ContractRead::LpTotalStaked { lp_staking }).await?;
            let user_staked = session
                .read(ContractRead::LpUserBalance {
                    lp_staking,
                    staker: owner,
                })
                .await?;
            let pending = session
                .read(ContractRead::LpPendingRewards {
                    lp_staking,
                    staker: owner,
                })
                .await?;
            let reward_per_block = session.read(ContractRead::LpRewardPerBlock { lp_staking }).await?;
            let total_lp = session.read(ContractRead::TotalSupply { token: lp }).await?;
            let ohm_in_lp = session
                .read(ContractRead::BalanceOf {
                    token: ohm,
                    owner: lp,
                })
                .await?;

            allowances.lp_stake = session.allowance(lp, lp_staking).await?;
            balances.lp_staked = to_display(user_staked, ETHER_DECIMALS);
            balances.pending_rewards = to_display(pending, OHM_DECIMALS);
            staking.total_lp_staked = to_display(total_staked, ETHER_DECIMALS);
            staking.lp_apy = lp_staking_apy(reward_per_block, total_staked, ohm_in_lp, total_lp);
        }

        let mut ohm_raw = U256::ZERO;
        if let Some(ohm) = contracts.ohm {
            let staking_contract = session.require(Contract::Staking)?;
            ohm_raw = session.balance_of(ohm).await?;
            balances.ohm = to_display(ohm_raw, OHM_DECIMALS);
            allowances.stake = session.allowance(ohm, staking_contract).await?;
        }

        let mut sohm_raw = U256::ZERO;
        if let Some(sohm) = contracts.sohm {
            let staking_contract = session.require(Contract::Staking)?;
            sohm_raw = session.balance_of(sohm).await?;
            balances.sohm = to_display(sohm_raw, OHM_DECIMALS);
            allowances.unstake = session.allowance(sohm, staking_contract).await?;
        }

        if let Some(staking_contract) = contracts.staking {
            let distribution = session
                .read(ContractRead::OhmToDistributeNextEpoch {
                    staking: staking_contract,
                })
                .await?;
            staking.next_epoch_distribution = to_display(distribution, OHM_DECIMALS);
        }

        if let Some(distributor) = contracts.distributor {
            let sohm = session.require(Contract::SOhm)?;
            let circulating = session.read(ContractRead::CirculatingSupply { sohm }).await?;
            let reward = session
                .read(ContractRead::CurrentRewardForNextEpoch { distributor })
                .await?;
            let index = session
                .read(ContractRead::BalanceOf {
                    token: sohm,
                    owner: INDEX_REFERENCE_HOLDER,
                })
                .await?;
            let rebase = staking_rebase(reward, circulating);
            staking.reward = to_display(reward, OHM_DECIMALS);
            staking.rebase = rebase.rebase;
            staking.apy = rebase.apy;
            staking.current_index = to_display(index, OHM_DECIMALS);
        }

        let epoch = next_epoch(session.client.block_number().await?);
        let market = self.market.supply_and_market_cap().await;
        let supply_share = supply_share(ohm_raw, sohm_raw, &market);

        Ok(LoginSnapshot {
            address: owner,
            network,
            whitelisted,
            balances,
            allowances,
            staking,
            epoch,
            supply_share,
            market,
        })
    }

    pub fn set_loading(&self, loading: bool) {
        self.state.write().loading = loading;
    }

    pub async fn refresh_exchange_rates(&self) {
        let rates = self.market.exchange_rates(&self.settings.exchange_rate_ids).await;
        debug!(count = rates.len(), "exchange rates refreshed");
        self.state.write().exchange_rates = rates;
    }

    // ---- presale ----------------------------------------------------------

    /// Buy aOHM for `value` DAI.
    pub async fn purchase_aohm(&self, value: &str) -> Result<TxReceipt, ChainError> {
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let presale = session.require(Contract::Presale)?;
        let dai = session.require(Contract::Dai)?;
        let amount = parse_amount(value, ETHER_DECIMALS)?;

        let receipt = self
            .send(&session, ContractWrite::PurchaseAohm { presale, amount })
            .await?;

        let balance = session.balance_of(dai).await?;
        self.state.write().balances.dai = to_display(balance, ETHER_DECIMALS);
        Ok(receipt)
    }

    /// Approve the presale to spend `value` DAI. Non-positive values are a
    /// no-op.
    pub async fn approve_presale(&self, value: &str) -> Result<Option<TxReceipt>, ChainError> {
        if !is_positive(value) {
            debug!(value, "skipping presale approval");
            return Ok(None);
        }
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let dai = session.require(Contract::Dai)?;
        let presale = session.require(Contract::Presale)?;
        let amount = parse_amount(value, ETHER_DECIMALS)?;

        let write = ContractWrite::Approve {
            token: dai,
            spender: presale,
            amount,
        };
        let receipt = self.send_approval(&session, write).await?;

        let allowance = session.allowance(dai, presale).await?;
        self.state.write().allowances.presale = allowance;
        Ok(Some(receipt))
    }

    /// Submit an approval with the pending flag raised until it settles.
    async fn send_approval(
        &self,
        session: &Session,
        write: ContractWrite,
    ) -> Result<TxReceipt, ChainError> {
        self.state.write().approval_pending = true;
        let result = self.send(session, write).await;
        self.state.write().approval_pending = false;
        result
    }

    pub async fn refresh_presale_allowance(&self) -> Result<U256, ChainError> {
        let session = self.session().await?;
        let dai = session.require(Contract::Dai)?;
        let presale = session.require(Contract::Presale)?;
        let allowance = session.allowance(dai, presale).await?;
        self.state.write().allowances.presale = allowance;
        Ok(allowance)
    }

    /// aOHM received for `value` DAI.
    pub async fn calculate_sale_quote(&self, value: &str) -> Result<f64, ChainError> {
        let session = self.session().await?;
        let presale = session.require(Contract::Presale)?;
        let payment = parse_amount(value, ETHER_DECIMALS)?;
        let quote = session.read(ContractRead::SaleQuote { presale, payment }).await?;
        let quote = to_display(quote, OHM_DECIMALS);
        self.state.write().presale.quote = quote;
        Ok(quote)
    }

    pub async fn refresh_allotment_per_buyer(&self) -> Result<f64, ChainError> {
        let session = self.session().await?;
        let presale = session.require(Contract::Presale)?;
        let allotment = session.read(ContractRead::AllotmentPerBuyer { presale }).await?;
        let allotment = to_display(allotment, OHM_DECIMALS);
        self.state.write().presale.allotment = allotment;
        Ok(allotment)
    }

    /// DAI needed to buy the whole per-buyer allotment.
    pub async fn refresh_max_purchase(&self) -> Result<f64, ChainError> {
        let session = self.session().await?;
        let presale = session.require(Contract::Presale)?;
        let allotment = session.read(ContractRead::AllotmentPerBuyer { presale }).await?;
        let price = session.read(ContractRead::SalePrice { presale }).await?;
        let cost = to_display(max_purchase(allotment, price), ETHER_DECIMALS);

        let mut state = self.state.write();
        state.presale.allotment = to_display(allotment, OHM_DECIMALS);
        state.presale.max_purchase = cost;
        Ok(cost)
    }

    // ---- staking ----------------------------------------------------------

    pub async fn approve_staking(&self, value: &str) -> Result<Option<TxReceipt>, ChainError> {
        self.approve_blanket(value, Contract::Ohm, Contract::Staking, OHM_DECIMALS)
            .await
    }

    pub async fn approve_unstaking(&self, value: &str) -> Result<Option<TxReceipt>, ChainError> {
        self.approve_blanket(value, Contract::SOhm, Contract::Staking, OHM_DECIMALS)
            .await
    }

    pub async fn approve_lp_staking(&self, value: &str) -> Result<Option<TxReceipt>, ChainError> {
        self.approve_blanket(value, Contract::Lp, Contract::LpStaking, ETHER_DECIMALS)
            .await
    }

    /// Grant `spender` a blanket allowance of `token` and refresh the
    /// matching allowance. `value` only gates the call.
    async fn approve_blanket(
        &self,
        value: &str,
        token: Contract,
        spender: Contract,
        decimals: u8,
    ) -> Result<Option<TxReceipt>, ChainError> {
        if !is_positive(value) {
            debug!(value, %token, "skipping approval");
            return Ok(None);
        }
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let token_address = session.require(token)?;
        let spender_address = session.require(spender)?;
        let amount = parse_amount(BLANKET_APPROVAL, decimals)?;

        let write = ContractWrite::Approve {
            token: token_address,
            spender: spender_address,
            amount,
        };
        let receipt = self.send_approval(&session, write).await?;

        let allowance = session.allowance(token_address, spender_address).await?;
        let mut state = self.state.write();
        match token {
            Contract::Ohm => state.allowances.stake = allowance,
            Contract::SOhm => state.allowances.unstake = allowance,
            _ => state.allowances.lp_stake = allowance,
        }
        Ok(Some(receipt))
    }

    pub async fn refresh_stake_allowance(&self) -> Result<U256, ChainError> {
        let session = self.session().await?;
        let ohm = session.require(Contract::Ohm)?;
        let staking = session.require(Contract::Staking)?;
        let allowance = session.allowance(ohm, staking).await?;
        self.state.write().allowances.stake = allowance;
        Ok(allowance)
    }

    pub async fn refresh_unstake_allowance(&self) -> Result<U256, ChainError> {
        let session = self.session().await?;
        let sohm = session.require(Contract::SOhm)?;
        let staking = session.require(Contract::Staking)?;
        let allowance = session.allowance(sohm, staking).await?;
        self.state.write().allowances.unstake = allowance;
        Ok(allowance)
    }

    pub async fn refresh_lp_stake_allowance(&self) -> Result<U256, ChainError> {
        let session = self.session().await?;
        let lp = session.require(Contract::Lp)?;
        let lp_staking = session.require(Contract::LpStaking)?;
        let allowance = session.allowance(lp, lp_staking).await?;
        self.state.write().allowances.lp_stake = allowance;
        Ok(allowance)
    }

    pub async fn stake_ohm(&self, value: &str) -> Result<TxReceipt, ChainError> {
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let staking = session.require(Contract::Staking)?;
        let amount = parse_amount(value, OHM_DECIMALS)?;
        let receipt = self
            .send(&session, ContractWrite::StakeOhm { staking, amount })
            .await?;
        self.refresh_ohm_and_sohm(&session).await?;
        Ok(receipt)
    }

    pub async fn unstake_ohm(&self, value: &str) -> Result<TxReceipt, ChainError> {
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let staking = session.require(Contract::Staking)?;
        let amount = parse_amount(value, OHM_DECIMALS)?;
        let receipt = self
            .send(&session, ContractWrite::UnstakeOhm { staking, amount })
            .await?;
        self.refresh_ohm_and_sohm(&session).await?;
        Ok(receipt)
    }

    async fn refresh_ohm_and_sohm(&self, session: &Session) -> Result<(), ChainError> {
        let ohm = session.balance_of(session.require(Contract::Ohm)?).await?;
        let sohm = session.balance_of(session.require(Contract::SOhm)?).await?;
        let mut state = self.state.write();
        state.balances.ohm = to_display(ohm, OHM_DECIMALS);
        state.balances.sohm = to_display(sohm, OHM_DECIMALS);
        Ok(())
    }

    // ---- LP staking -------------------------------------------------------

    pub async fn stake_lp(&self, value: &str) -> Result<TxReceipt, ChainError> {
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let lp_staking = session.require(Contract::LpStaking)?;
        let amount = parse_amount(value, ETHER_DECIMALS)?;
        let receipt = self
            .send(&session, ContractWrite::StakeLp { lp_staking, amount })
            .await?;
        self.refresh_lp_positions(&session, lp_staking).await?;
        Ok(receipt)
    }

    /// Withdraw the whole LP stake.
    pub async fn unstake_lp(&self) -> Result<TxReceipt, ChainError> {
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let lp_staking = session.require(Contract::LpStaking)?;
        let receipt = self
            .send(&session, ContractWrite::UnstakeLp { lp_staking })
            .await?;
        self.refresh_lp_positions(&session, lp_staking).await?;
        Ok(receipt)
    }

    async fn refresh_lp_positions(
        &self,
        session: &Session,
        lp_staking: Address,
    ) -> Result<(), ChainError> {
        let lp = session.balance_of(session.require(Contract::Lp)?).await?;
        let staked = session
            .read(ContractRead::LpUserBalance {
                lp_staking,
                staker: session.address,
            })
            .await?;
        let mut state = self.state.write();
        state.balances.lp = to_display(lp, ETHER_DECIMALS);
        state.balances.lp_staked = to_display(staked, ETHER_DECIMALS);
        Ok(())
    }

    /// Claim pending LP staking rewards.
    pub async fn claim_rewards(&self) -> Result<TxReceipt, ChainError> {
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let lp_staking = session.require(Contract::LpStaking)?;
        let receipt = self
            .send(&session, ContractWrite::ClaimRewards { lp_staking })
            .await?;

        let pending = session
            .read(ContractRead::LpPendingRewards {
                lp_staking,
                staker: session.address,
            })
            .await?;
        let ohm = session.balance_of(session.require(Contract::Ohm)?).await?;
        let mut state = self.state.write();
        state.balances.pending_rewards = to_display(pending, OHM_DECIMALS);
        state.balances.ohm = to_display(ohm, OHM_DECIMALS);
        Ok(receipt)
    }

    // ---- migration --------------------------------------------------------

    /// aOHM balance available for migration.
    pub async fn refresh_max_swap(&self) -> Result<f64, ChainError> {
        let session = self.session().await?;
        let aohm = session.balance_of(session.require(Contract::AOhm)?).await?;
        let max_swap = to_display(aohm, OHM_DECIMALS);
        let mut state = self.state.write();
        state.max_swap = max_swap;
        state.balances.aohm = max_swap;
        Ok(max_swap)
    }

    /// Swap `value` aOHM for OHM, approving the migrator first when its
    /// allowance does not cover the amount.
    pub async fn migrate_to_ohm(&self, value: &str) -> Result<Migration, ChainError> {
        let _tx = self.tx_lock.lock().await;
        let session = self.session().await?;
        let migrator = session.require(Contract::Migrate)?;
        let aohm = session.require(Contract::AOhm)?;
        let ohm = session.require(Contract::Ohm)?;
        let amount = parse_amount(value, OHM_DECIMALS)?;

        let allowance = session.allowance(aohm, migrator).await?;
        let approval = if allowance < amount {
            debug!(%allowance, %amount, "raising migrator allowance");
            let write = ContractWrite::Approve {
                token: aohm,
                spender: migrator,
                amount: parse_amount(BLANKET_APPROVAL, ETHER_DECIMALS)?,
            };
            Some(self.send_approval(&session, write).await?)
        } else {
            None
        };

        let migration = self
            .send(&session, ContractWrite::Migrate { migrator, amount })
            .await?;

        let aohm_balance = session.balance_of(aohm).await?;
        let ohm_balance = session.balance_of(ohm).await?;
        let mut state = self.state.write();
        state.balances.aohm = to_display(aohm_balance, OHM_DECIMALS);
        state.balances.ohm = to_display(ohm_balance, OHM_DECIMALS);
        state.max_swap = state.balances.aohm;
        Ok(Migration {
            approval,
            migration,
        })
    }

    // ---- dispatch ---------------------------------------------------------

    /// Run `action`, logging any failure instead of returning it. Returns
    /// whether the action succeeded.
    pub async fn dispatch(&self, action: Action) -> bool {
        let name = action.name();
        let result = match action {
            Action::Init => self.init().await,
            Action::Login => self.login().await.map(drop),
            Action::SetLoading(loading) => {
                self.set_loading(loading);
                Ok(())
            }
            Action::RefreshExchangeRates => {
                self.refresh_exchange_rates().await;
                Ok(())
            }
            Action::PurchaseAohm(value) => self.purchase_aohm(&value).await.map(drop),
            Action::ApprovePresale(value) => self.approve_presale(&value).await.map(drop),
            Action::RefreshPresaleAllowance => self.refresh_presale_allowance().await.map(drop),
            Action::ApproveStaking(value) => self.approve_staking(&value).await.map(drop),
            Action::ApproveLpStaking(value) => self.approve_lp_staking(&value).await.map(drop),
            Action::RefreshStakeAllowance => self.refresh_stake_allowance().await.map(drop),
            Action::RefreshLpStakeAllowance => self.refresh_lp_stake_allowance().await.map(drop),
            Action::ApproveUnstaking(value) => self.approve_unstaking(&value).await.map(drop),
            Action::RefreshUnstakeAllowance => self.refresh_unstake_allowance().await.map(drop),
            Action::CalculateSaleQuote(value) => self.calculate_sale_quote(&value).await.map(drop),
            Action::RefreshAllotmentPerBuyer => self.refresh_allotment_per_buyer().await.map(drop),
            Action::RefreshMaxPurchase => self.refresh_max_purchase().await.map(drop),
            Action::StakeOhm(value) => self.stake_ohm(&value).await.map(drop),
            Action::UnstakeOhm(value) => self.unstake_ohm(&value).await.map(drop),
            Action::StakeLp(value) => self.stake_lp(&value).await.map(drop),
            Action::UnstakeLp => self.unstake_lp().await.map(drop),
            Action::ClaimRewards => self.claim_rewards().await.map(drop),
            Action::RefreshMaxSwap => self.refresh_max_swap().await.map(drop),
            Action::MigrateToOhm(value) => self.migrate_to_ohm(&value).await.map(drop),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                error!(action = name, category = ?e.category(), error = %e, "action failed");
                false
            }
        }
    }

    /// Re-initialize on every wallet account or network change. Returns
    /// `None` when there is no wallet provider to listen to.
    pub fn spawn_wallet_listener(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let wallet = self.wallet.clone()?;
        let mut events = wallet.subscribe();
        let dashboard = Arc::clone(self);
        Some(tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => info!(?event, "wallet changed, reinitializing"),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "missed wallet events, reinitializing")
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                dashboard.reset_session().await;
                dashboard.dispatch(Action::Init).await;
            }
            debug!("wallet event stream closed");
        }))
    }
}

/// Share of the circulating supply held as OHM and sOHM. The market feed
/// reports supply in whole tokens; balances are raw 9-decimal units.
pub(crate) fn supply_share(ohm_raw: U256, sohm_raw: U256, market: &MarketData) -> SupplyShare {
    let supply = parse_amount(&format!("{:.5}", market.circulating_supply), OHM_DECIMALS)
        .unwrap_or_default();
    SupplyShare {
        ohm_percent: percent_of_supply(ohm_raw, supply),
        sohm_percent: percent_of_supply(sohm_raw, supply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::testing::{MockChain, MockWallet, USER};
    use crate::wallet::WalletEvent;

    const GWEI: u64 = 1_000_000_000;

    fn ohm(amount: u64) -> U256 {
        U256::from(amount) * U256::from(GWEI)
    }

    fn ether(amount: u64) -> U256 {
        U256::from(amount) * U256::from(10u64).pow(U256::from(18))
    }

    fn unreachable_market() -> MarketClient {
        MarketClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap()
    }

    fn dashboard_with(chain: Arc<MockChain>, settings: DashboardSettings) -> (Dashboard, Arc<MockWallet>) {
        let wallet = Arc::new(MockWallet::new(chain));
        let provider: Arc<dyn WalletProvider> = wallet.clone();
        (Dashboard::new(Some(provider), unreachable_market(), settings), wallet)
    }

    fn dashboard(chain: Arc<MockChain>) -> (Dashboard, Arc<MockWallet>) {
        dashboard_with(chain, DashboardSettings::default())
    }

    /// Mainnet chain populated with a plausible account.
    fn funded_mainnet() -> Arc<MockChain> {
        let chain = Arc::new(MockChain::mainnet());
        let c = chain.contracts().clone();
        let staking = c.staking.unwrap();
        let lp = c.lp.unwrap();
        let lp_staking = c.lp_staking.unwrap();
        let sohm = c.sohm.unwrap();

        chain.set_block(12_000_100);
        chain.set_balance(c.dai.unwrap(), ether(1_000));
        chain.set_balance(c.aohm.unwrap(), ohm(40));
        chain.set_balance(c.ohm.unwrap(), ohm(10));
        chain.set_balance(sohm, ohm(20));
        chain.set_balance(lp, ether(3));
        chain.set(
            ContractRead::LpUserBalance {
                lp_staking,
                staker: USER,
            },
            ether(2),
        );
        chain.set(
            ContractRead::LpPendingRewards {
                lp_staking,
                staker: USER,
            },
            ohm(5),
        );
        chain.set(ContractRead::LpTotalStaked { lp_staking }, ether(100));
        chain.set(ContractRead::LpRewardPerBlock { lp_staking }, ohm(1));
        chain.set(ContractRead::TotalSupply { token: lp }, ether(200));
        chain.set(
            ContractRead::BalanceOf {
                token: c.ohm.unwrap(),
                owner: lp,
            },
            ohm(50_000),
        );
        chain.set(ContractRead::CirculatingSupply { sohm }, ohm(100_000));
        chain.set(
            ContractRead::CurrentRewardForNextEpoch {
                distributor: c.distributor.unwrap(),
            },
            ohm(300),
        );
        chain.set(
            ContractRead::BalanceOf {
                token: sohm,
                owner: INDEX_REFERENCE_HOLDER,
            },
            ohm(7),
        );
        chain.set(ContractRead::OhmToDistributeNextEpoch { staking }, ohm(250));
        chain.set(
            ContractRead::AllotmentPerBuyer {
                presale: c.presale.unwrap(),
            },
            ohm(1_500),
        );
        chain
    }

    #[tokio::test]
    async fn login_commits_full_snapshot() {
        let chain = funded_mainnet();
        let settings = DashboardSettings::default().with_whitelist([USER.to_string().as_str()]);
        let (dashboard, _) = dashboard_with(chain, settings);

        let snapshot = dashboard.login().await.unwrap();
        assert_eq!(snapshot.address, USER);
        assert!(snapshot.whitelisted);

        let state = dashboard.state();
        assert_eq!(state.address, Some(USER));
        assert_eq!(state.network, Some(NetworkInfo::from_chain_id(1)));
        assert_eq!(state.balances.dai, 1_000.0);
        assert_eq!(state.balances.aohm, 40.0);
        assert_eq!(state.balances.ohm, 10.0);
        assert_eq!(state.balances.sohm, 20.0);
        assert_eq!(state.balances.lp, 3.0);
        assert_eq!(state.balances.lp_staked, 2.0);
        assert_eq!(state.balances.pending_rewards, 5.0);
        assert_eq!(state.staking.total_lp_staked, 100.0);
        assert_eq!(state.staking.next_epoch_distribution, 250.0);
        assert_eq!(state.staking.reward, 300.0);
        assert_eq!(state.staking.current_index, 7.0);
        assert!((state.staking.rebase - 0.3).abs() < 1e-9);
        assert!(state.staking.apy > 100.0);
        assert!(state.staking.lp_apy > 0.0);

        let epoch = state.epoch.unwrap();
        assert_eq!(epoch.block, 12_001_000);
        assert_eq!(epoch.blocks_away, 900);

        // Market data is unreachable, so supply is zero and so are shares.
        assert_eq!(state.supply_share, SupplyShare::default());
        assert_eq!(state.presale.allotment, 1_500.0);
        assert!(dashboard.is_logged_in().await);
    }

    #[tokio::test]
    async fn login_without_whitelist_entry() {
        let (dashboard, _) = dashboard(funded_mainnet());
        let snapshot = dashboard.login().await.unwrap();
        assert!(!snapshot.whitelisted);
        assert!(!dashboard.state().whitelisted);
    }

    #[tokio::test]
    async fn login_skips_distributor_where_absent() {
        let chain = Arc::new(MockChain::new(4, Some(USER)));
        assert!(chain.contracts().distributor.is_none());
        let (dashboard, _) = dashboard(chain);

        dashboard.login().await.unwrap();
        let state = dashboard.state();
        assert_eq!(state.staking.apy, 0.0);
        assert_eq!(state.staking.current_index, 0.0);
        assert_eq!(state.network.unwrap().chain_id, 4);
    }

    #[tokio::test]
    async fn unsupported_network_records_network_only() {
        let (dashboard, _) = dashboard(Arc::new(MockChain::new(56, Some(USER))));

        let err = dashboard.login().await.unwrap_err();
        assert!(matches!(err, ChainError::UnsupportedNetwork(56)));

        let state = dashboard.state();
        assert_eq!(state.network.unwrap().chain_id, 56);
        assert!(state.network.unwrap().network.is_none());
        assert_eq!(state.address, None);
        assert!(!dashboard.is_logged_in().await);
    }

    #[tokio::test]
    async fn init_without_provider_fails_and_clears_loading() {
        let dashboard = Dashboard::new(None, unreachable_market(), DashboardSettings::default());
        assert!(matches!(dashboard.init().await, Err(ChainError::NoProvider)));
        assert!(!dashboard.state().loading);
        assert!(!dashboard.dispatch(Action::Init).await);
    }

    #[tokio::test]
    async fn init_without_account_waits_for_login() {
        let (dashboard, wallet) = dashboard(Arc::new(MockChain::new(1, None)));
        dashboard.init().await.unwrap();
        assert_eq!(wallet.connects(), 1);
        assert!(!dashboard.is_logged_in().await);
        assert!(!dashboard.state().loading);
    }

    #[tokio::test]
    async fn init_with_account_logs_in() {
        let (dashboard, wallet) = dashboard(funded_mainnet());
        dashboard.init().await.unwrap();
        assert_eq!(wallet.connects(), 2);
        assert!(dashboard.is_logged_in().await);
        assert_eq!(dashboard.state().address, Some(USER));
    }

    #[tokio::test]
    async fn actions_require_a_session() {
        let (dashboard, _) = dashboard(funded_mainnet());
        assert!(matches!(dashboard.stake_ohm("1").await, Err(ChainError::NoSession)));
        assert!(matches!(
            dashboard.refresh_presale_allowance().await,
            Err(ChainError::NoSession)
        ));
        assert!(!dashboard.dispatch(Action::ClaimRewards).await);
    }

    #[tokio::test]
    async fn non_positive_approval_is_a_no_op() {
        let chain = funded_mainnet();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();

        for value in ["0", "-5", "", "abc"] {
            assert_eq!(dashboard.approve_presale(value).await.unwrap(), None);
            assert_eq!(dashboard.approve_staking(value).await.unwrap(), None);
            assert_eq!(dashboard.approve_unstaking(value).await.unwrap(), None);
            assert_eq!(dashboard.approve_lp_staking(value).await.unwrap(), None);
        }
        assert!(chain.writes().is_empty());
    }

    #[tokio::test]
    async fn presale_approval_refreshes_allowance() {
        let chain = funded_mainnet();
        let c = chain.contracts().clone();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();
        assert_eq!(dashboard.state().allowances.presale, U256::ZERO);

        let receipt = dashboard.approve_presale("250.5").await.unwrap();
        assert!(receipt.is_some());

        let expected = parse_amount("250.5", ETHER_DECIMALS).unwrap();
        assert_eq!(
            chain.writes(),
            vec![ContractWrite::Approve {
                token: c.dai.unwrap(),
                spender: c.presale.unwrap(),
                amount: expected,
            }]
        );
        let state = dashboard.state();
        assert_eq!(state.allowances.presale, expected);
        assert!(!state.approval_pending);
        assert_eq!(dashboard.refresh_presale_allowance().await.unwrap(), expected);
    }

    #[tokio::test]
    async fn blanket_approvals_use_token_decimals() {
        let chain = funded_mainnet();
        let c = chain.contracts().clone();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();

        dashboard.approve_staking("1").await.unwrap();
        dashboard.approve_unstaking("1").await.unwrap();
        dashboard.approve_lp_staking("1").await.unwrap();

        let state = dashboard.state();
        assert_eq!(state.allowances.stake, ohm(1_000_000_000));
        assert_eq!(state.allowances.unstake, ohm(1_000_000_000));
        assert_eq!(state.allowances.lp_stake, ether(1_000_000_000));

        let writes = chain.writes();
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0].target(), c.ohm.unwrap());
        assert_eq!(writes[1].target(), c.sohm.unwrap());
        assert_eq!(writes[2].target(), c.lp.unwrap());

        assert_eq!(dashboard.refresh_stake_allowance().await.unwrap(), ohm(1_000_000_000));
        assert_eq!(dashboard.refresh_unstake_allowance().await.unwrap(), ohm(1_000_000_000));
        assert_eq!(
            dashboard.refresh_lp_stake_allowance().await.unwrap(),
            ether(1_000_000_000)
        );
    }

    #[tokio::test]
    async fn stake_and_unstake_refresh_balances() {
        let chain = funded_mainnet();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();

        dashboard.stake_ohm("4").await.unwrap();
        let state = dashboard.state();
        assert_eq!(state.balances.ohm, 6.0);
        assert_eq!(state.balances.sohm, 24.0);

        dashboard.unstake_ohm("0.5").await.unwrap();
        let state = dashboard.state();
        assert_eq!(state.balances.ohm, 6.5);
        assert_eq!(state.balances.sohm, 23.5);
    }

    #[tokio::test]
    async fn lp_stake_cycle() {
        let chain = funded_mainnet();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();

        dashboard.stake_lp("1").await.unwrap();
        let state = dashboard.state();
        assert_eq!(state.balances.lp, 2.0);
        assert_eq!(state.balances.lp_staked, 3.0);

        dashboard.unstake_lp().await.unwrap();
        let state = dashboard.state();
        assert_eq!(state.balances.lp, 5.0);
        assert_eq!(state.balances.lp_staked, 0.0);
    }

    #[tokio::test]
    async fn claim_rewards_clears_pending() {
        let chain = funded_mainnet();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();
        assert_eq!(dashboard.state().balances.pending_rewards, 5.0);

        dashboard.claim_rewards().await.unwrap();
        let state = dashboard.state();
        assert_eq!(state.balances.pending_rewards, 0.0);
        assert_eq!(state.balances.ohm, 15.0);
    }

    #[tokio::test]
    async fn purchase_spends_dai() {
        let chain = funded_mainnet();
        let c = chain.contracts().clone();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();

        dashboard.purchase_aohm("100").await.unwrap();
        assert_eq!(dashboard.state().balances.dai, 900.0);
        assert_eq!(
            chain.writes(),
            vec![ContractWrite::PurchaseAohm {
                presale: c.presale.unwrap(),
                amount: ether(100),
            }]
        );
    }

    #[tokio::test]
    async fn invalid_amount_sends_nothing() {
        let chain = funded_mainnet();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();

        let err = dashboard.stake_ohm("lots").await.unwrap_err();
        assert!(matches!(err, ChainError::InvalidAmount { .. }));
        let err = dashboard.stake_ohm("0.0000000001").await.unwrap_err();
        assert!(matches!(err, ChainError::InvalidAmount { .. }));
        assert!(chain.writes().is_empty());
        assert_eq!(dashboard.state().balances.ohm, 10.0);
    }

    #[tokio::test]
    async fn presale_reads() {
        let chain = funded_mainnet();
        let presale = chain.contracts().presale.unwrap();
        chain.set(
            ContractRead::SaleQuote {
                presale,
                payment: ether(200),
            },
            ohm(8),
        );
        // 25 DAI per aOHM.
        chain.set(ContractRead::SalePrice { presale }, ether(25));
        let (dashboard, _) = dashboard(chain);
        dashboard.login().await.unwrap();

        assert_eq!(dashboard.calculate_sale_quote("200").await.unwrap(), 8.0);
        assert_eq!(dashboard.refresh_allotment_per_buyer().await.unwrap(), 1_500.0);
        assert_eq!(dashboard.refresh_max_purchase().await.unwrap(), 37_500.0);

        let state = dashboard.state();
        assert_eq!(state.presale.quote, 8.0);
        assert_eq!(state.presale.max_purchase, 37_500.0);
    }

    #[tokio::test]
    async fn migration_approves_only_when_needed() {
        let chain = funded_mainnet();
        let c = chain.contracts().clone();
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();
        assert_eq!(dashboard.refresh_max_swap().await.unwrap(), 40.0);

        let first = dashboard.migrate_to_ohm("15").await.unwrap();
        assert!(first.approval.is_some());
        let writes = chain.writes();
        assert_eq!(
            writes[0],
            ContractWrite::Approve {
                token: c.aohm.unwrap(),
                spender: c.migrate.unwrap(),
                amount: ether(1_000_000_000),
            }
        );
        assert_eq!(
            writes[1],
            ContractWrite::Migrate {
                migrator: c.migrate.unwrap(),
                amount: ohm(15),
            }
        );

        let second = dashboard.migrate_to_ohm("5").await.unwrap();
        assert!(second.approval.is_none());
        assert_eq!(chain.writes().len(), 3);

        let state = dashboard.state();
        assert_eq!(state.balances.aohm, 20.0);
        assert_eq!(state.balances.ohm, 30.0);
        assert_eq!(state.max_swap, 20.0);
    }

    #[tokio::test]
    async fn missing_contract_short_circuits() {
        let chain = funded_mainnet();
        let (dashboard, _) = dashboard(chain.clone());
        let mut contracts = chain.contracts().clone();
        contracts.lp_staking = None;
        *dashboard.session.write().await = Some(Session {
            client: chain.clone(),
            address: USER,
            chain_id: 1,
            contracts,
        });

        let err = dashboard.stake_lp("1").await.unwrap_err();
        assert!(matches!(
            err,
            ChainError::MissingContract {
                contract: Contract::LpStaking,
                chain_id: 1
            }
        ));
        assert!(matches!(
            dashboard.refresh_lp_stake_allowance().await,
            Err(ChainError::MissingContract { .. })
        ));
        assert!(chain.writes().is_empty());
    }

    #[tokio::test]
    async fn read_only_wallet_cannot_write() {
        let chain = Arc::new(MockChain::mainnet().read_only());
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();

        let err = dashboard.stake_ohm("1").await.unwrap_err();
        assert!(matches!(err, ChainError::ReadOnly));
        assert!(!dashboard.state().approval_pending);
        assert!(matches!(
            dashboard.approve_presale("1").await,
            Err(ChainError::ReadOnly)
        ));
        assert!(!dashboard.state().approval_pending);
    }

    #[tokio::test]
    async fn concurrent_writes_are_serialized() {
        let chain = funded_mainnet();
        chain.set_submit_delay(Duration::from_millis(20));
        let (dashboard, _) = dashboard(chain.clone());
        dashboard.login().await.unwrap();

        let (a, b, c) = tokio::join!(
            dashboard.stake_ohm("1"),
            dashboard.approve_staking("1"),
            dashboard.stake_lp("1"),
        );
        a.unwrap();
        b.unwrap();
        c.unwrap();

        assert_eq!(chain.writes().len(), 3);
        assert_eq!(chain.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn wallet_event_tears_down_and_reinitializes() {
        let chain = funded_mainnet();
        let (dashboard, wallet) = dashboard(chain);
        let dashboard = Arc::new(dashboard);
        dashboard.init().await.unwrap();
        let connects = wallet.connects();

        let listener = dashboard.spawn_wallet_listener().unwrap();
        wallet.emit(WalletEvent::NetworkChanged(1));

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while wallet.connects() < connects + 2 || !dashboard.is_logged_in().await {
            assert!(tokio::time::Instant::now() < deadline, "listener never reinitialized");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(dashboard.state().address, Some(USER));
        listener.abort();
    }

    #[tokio::test]
    async fn account_switch_waits_for_in_flight_write() {
        let other = alloy::primitives::address!("0x00000000000000000000000000000000000000b0");
        let chain_a = funded_mainnet();
        chain_a.set_submit_delay(Duration::from_millis(200));
        let chain_b = Arc::new(MockChain::new(1, Some(other)));
        chain_b.set_balance(chain_b.contracts().ohm.unwrap(), ohm(99));

        let (dashboard, wallet) = dashboard(chain_a.clone());
        let dashboard = Arc::new(dashboard);
        dashboard.login().await.unwrap();

        let staking = {
            let dashboard = dashboard.clone();
            tokio::spawn(async move { dashboard.stake_ohm("4").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        wallet.switch(chain_b);
        dashboard.reset_session().await;
        dashboard.init().await.unwrap();
        staking.await.unwrap().unwrap();

        let state = dashboard.state();
        assert_eq!(state.address, Some(other));
        assert_eq!(state.balances.ohm, 99.0);
        assert_eq!(state.balances.sohm, 0.0);
        assert_eq!(chain_a.balance(chain_a.contracts().ohm.unwrap()), ohm(6));
    }

    #[test]
    fn supply_share_against_market_supply() {
        let market = MarketData {
            circulating_supply: 1_000_000.0,
            ..MarketData::default()
        };
        let share = supply_share(ohm(10_000), ohm(50_000), &market);
        assert!((share.ohm_percent - 1.0).abs() < 1e-9);
        assert!((share.sohm_percent - 5.0).abs() < 1e-9);

        let market = MarketData {
            circulating_supply: 2_500.5,
            ..MarketData::default()
        };
        let share = supply_share(ohm(25), U256::ZERO, &market);
        assert!((share.ohm_percent - 25.0 / 2_500.5 * 100.0).abs() < 1e-9);
        assert_eq!(share.sohm_percent, 0.0);

        assert_eq!(supply_share(ohm(25), ohm(25), &MarketData::default()), SupplyShare::default());
    }

    #[tokio::test]
    async fn exchange_rates_fall_back_to_empty() {
        let (dashboard, _) = dashboard(funded_mainnet());
        dashboard.state.write().exchange_rates.insert("dai".into(), 1.0);
        assert!(dashboard.dispatch(Action::RefreshExchangeRates).await);
        assert!(dashboard.state().exchange_rates.is_empty());
    }

    #[tokio::test]
    async fn dispatch_runs_actions() {
        let chain = funded_mainnet();
        let (dashboard, _) = dashboard(chain.clone());
        assert!(dashboard.dispatch(Action::Login).await);
        assert!(dashboard.dispatch(Action::SetLoading(true)).await);
        assert!(dashboard.state().loading);
        assert!(dashboard.dispatch(Action::StakeOhm("2".into())).await);
        assert_eq!(dashboard.state().balances.ohm, 8.0);
        assert!(!dashboard.dispatch(Action::StakeOhm("-2".into())).await);
    }

    #[test]
    fn whitelist_skips_invalid_entries() {
        let settings = DashboardSettings::default()
            .with_whitelist(["0x742d35Cc6634C0532925a3b844Bc9e7595f2bD18", "nope"]);
        assert_eq!(settings.whitelist.len(), 1);
        assert!(settings.whitelist.contains(&USER));
    }

    #[test]
    fn action_serializes_with_tag() {
        let json = serde_json::to_value(Action::StakeOhm("1.5".into())).unwrap();
        assert_eq!(json["action"], "stake_ohm");
        assert_eq!(json["value"], "1.5");
        assert_eq!(Action::UnstakeLp.name(), "unstake_lp");
    }
}
