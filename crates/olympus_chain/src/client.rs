use alloy::network::{EthereumWallet, ReceiptResponse};
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::contracts::{
    ContractRead, ContractWrite, IDistributor, IERC20, ILPStaking, IMigrateToOhm, IOhmPresale,
    IOlympusStaking, ISOhm,
};
use crate::error::ChainError;

/// Outcome of a confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
}

impl TxReceipt {
    /// Reverted receipts become [`ChainError::Reverted`].
    pub fn into_result(self) -> Result<Self, ChainError> {
        if self.success {
            Ok(self)
        } else {
            Err(ChainError::Reverted(self.hash))
        }
    }
}

/// Read/write access to the chain on behalf of one account.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Account the session acts for, if the wallet exposed one.
    fn account(&self) -> Option<Address>;

    /// Whether [`submit`](Self::submit) can sign.
    fn can_sign(&self) -> bool;

    async fn chain_id(&self) -> Result<u64, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn read(&self, call: ContractRead) -> Result<U256, ChainError>;

    /// Sign, send and wait for `confirmations` blocks. A reverted
    /// transaction is an error.
    async fn submit(&self, call: ContractWrite, confirmations: u64) -> Result<TxReceipt, ChainError>;
}

/// [`ChainClient`] over an HTTP JSON-RPC endpoint.
///
/// With a signer the provider carries an [`EthereumWallet`] and fills nonce,
/// gas and chain id automatically. Without one the client is read-only and
/// bound to a watch address.
#[derive(Clone)]
pub struct RpcChainClient {
    provider: DynProvider,
    account: Option<Address>,
    can_sign: bool,
}

impl RpcChainClient {
    pub fn with_signer(rpc_url: &str, signer: PrivateKeySigner) -> Result<Self, ChainError> {
        let url = parse_rpc_url(rpc_url)?;
        let account = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url);
        info!(%account, rpc_url, "connected signing client");
        Ok(Self {
            provider: DynProvider::new(provider),
            account: Some(account),
            can_sign: true,
        })
    }

    pub fn read_only(rpc_url: &str, account: Option<Address>) -> Result<Self, ChainError> {
        let url = parse_rpc_url(rpc_url)?;
        let provider = ProviderBuilder::new().connect_http(url);
        debug!(account = ?account, rpc_url, "connected read-only client");
        Ok(Self {
            provider: DynProvider::new(provider),
            account,
            can_sign: false,
        })
    }
}

fn parse_rpc_url(rpc_url: &str) -> Result<url::Url, ChainError> {
    rpc_url
        .parse()
        .map_err(|e| ChainError::Rpc(format!("invalid RPC URL {rpc_url:?}: {e}")))
}

/// Send a prepared call builder and wait for its receipt.
macro_rules! send_and_confirm {
    ($builder:expr, $confirmations:expr) => {{
        let pending = $builder.send().await.map_err(ChainError::contract)?;
        debug!(tx_hash = %pending.tx_hash(), "transaction submitted");
        pending
            .with_required_confirmations($confirmations)
            .get_receipt()
            .await
            .map_err(ChainError::rpc)?
    }};
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn account(&self) -> Option<Address> {
        self.account
    }

    fn can_sign(&self) -> bool {
        self.can_sign
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider.get_chain_id().await.map_err(ChainError::rpc)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider.get_block_number().await.map_err(ChainError::rpc)
    }

    async fn read(&self, call: ContractRead) -> Result<U256, ChainError> {
        let p = self.provider.clone();
        let result = match call {
            ContractRead::BalanceOf { token, owner } => {
                IERC20::new(token, p).balanceOf(owner).call().await
            }
            ContractRead::Allowance {
                token,
                owner,
                spender,
            } => IERC20::new(token, p).allowance(owner, spender).call().await,
            ContractRead::TotalSupply { token } => IERC20::new(token, p).totalSupply().call().await,
            ContractRead::CirculatingSupply { sohm } => {
                ISOhm::new(sohm, p).circulatingSupply().call().await
            }
            ContractRead::OhmToDistributeNextEpoch { staking } => {
                IOlympusStaking::new(staking, p)
                    .ohmToDistributeNextEpoch()
                    .call()
                    .await
            }
            ContractRead::LpTotalStaked { lp_staking } => {
                ILPStaking::new(lp_staking, p).totalStaked().call().await
            }
            ContractRead::LpUserBalance { lp_staking, staker } => {
                ILPStaking::new(lp_staking, p).getUserBalance(staker).call().await
            }
            ContractRead::LpPendingRewards { lp_staking, staker } => {
                ILPStaking::new(lp_staking, p).pendingRewards(staker).call().await
            }
            ContractRead::LpRewardPerBlock { lp_staking } => {
                ILPStaking::new(lp_staking, p).rewardPerBlock().call().await
            }
            ContractRead::CurrentRewardForNextEpoch { distributor } => {
                IDistributor::new(distributor, p)
                    .getCurrentRewardForNextEpoch()
                    .call()
                    .await
            }
            ContractRead::SaleQuote { presale, payment } => {
                IOhmPresale::new(presale, p)
                    .calculateSaleQuote(payment)
                    .call()
                    .await
            }
            ContractRead::AllotmentPerBuyer { presale } => {
                IOhmPresale::new(presale, p).getAllotmentPerBuyer().call().await
            }
            ContractRead::SalePrice { presale } => {
                IOhmPresale::new(presale, p).salePrice().call().await
            }
        };
        result.map_err(|e| {
            debug!(method = call.method(), error = %e, "contract read failed");
            ChainError::contract(e)
        })
    }

    async fn submit(&self, call: ContractWrite, confirmations: u64) -> Result<TxReceipt, ChainError> {
        if !self.can_sign {
            return Err(ChainError::ReadOnly);
        }
        debug!(method = call.method(), target = %call.target(), "sending transaction");

        let p = self.provider.clone();
        let receipt = match call {
            ContractWrite::Approve {
                token,
                spender,
                amount,
            } => send_and_confirm!(IERC20::new(token, p).approve(spender, amount), confirmations),
            ContractWrite::PurchaseAohm { presale, amount } => {
                send_and_confirm!(IOhmPresale::new(presale, p).purchaseaOHM(amount), confirmations)
            }
            ContractWrite::StakeOhm { staking, amount } => {
                send_and_confirm!(IOlympusStaking::new(staking, p).stakeOHM(amount), confirmations)
            }
            ContractWrite::UnstakeOhm { staking, amount } => send_and_confirm!(
                IOlympusStaking::new(staking, p).unstakeOHM(amount),
                confirmations
            ),
            ContractWrite::StakeLp { lp_staking, amount } => {
                send_and_confirm!(ILPStaking::new(lp_staking, p).stakeLP(amount), confirmations)
            }
            ContractWrite::UnstakeLp { lp_staking } => {
                send_and_confirm!(ILPStaking::new(lp_staking, p).unstakeLP(), confirmations)
            }
            ContractWrite::ClaimRewards { lp_staking } => {
                send_and_confirm!(ILPStaking::new(lp_staking, p).claimRewards(), confirmations)
            }
            ContractWrite::Migrate { migrator, amount } => {
                send_and_confirm!(IMigrateToOhm::new(migrator, p).migrate(amount), confirmations)
            }
        };

        info!(
            method = call.method(),
            tx_hash = %receipt.transaction_hash,
            block = ?receipt.block_number,
            success = receipt.status(),
            "transaction confirmed"
        );
        TxReceipt {
            hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
        }
        .into_result()
    }
}
