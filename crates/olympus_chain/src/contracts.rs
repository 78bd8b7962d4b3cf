//! Typed bindings for the protocol contracts and the calls the dashboard
//! issues against them.

use alloy::primitives::{Address, U256};
use alloy::sol;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function totalSupply() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface ISOhm {
        function circulatingSupply() external view returns (uint256);
    }

    #[sol(rpc)]
    interface IOlympusStaking {
        function ohmToDistributeNextEpoch() external view returns (uint256);
        function stakeOHM(uint256 amountToStake) external returns (bool);
        function unstakeOHM(uint256 amountToWithdraw) external returns (bool);
    }

    #[sol(rpc)]
    interface ILPStaking {
        function totalStaked() external view returns (uint256);
        function getUserBalance(address staker) external view returns (uint256);
        function pendingRewards(address staker) external view returns (uint256);
        function rewardPerBlock() external view returns (uint256);
        function stakeLP(uint256 amount) external;
        function unstakeLP() external;
        function claimRewards() external;
    }

    #[sol(rpc)]
    interface IOhmPresale {
        function calculateSaleQuote(uint256 paymentAmount) external view returns (uint256);
        function getAllotmentPerBuyer() external view returns (uint256);
        function salePrice() external view returns (uint256);
        function purchaseaOHM(uint256 amount) external returns (bool);
    }

    #[sol(rpc)]
    interface IDistributor {
        function getCurrentRewardForNextEpoch() external view returns (uint256);
    }

    #[sol(rpc)]
    interface IMigrateToOhm {
        function migrate(uint256 amount) external;
    }
}

/// A view call. Every read the dashboard makes returns a single `uint256`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractRead {
    BalanceOf { token: Address, owner: Address },
    Allowance { token: Address, owner: Address, spender: Address },
    TotalSupply { token: Address },
    CirculatingSupply { sohm: Address },
    OhmToDistributeNextEpoch { staking: Address },
    LpTotalStaked { lp_staking: Address },
    LpUserBalance { lp_staking: Address, staker: Address },
    LpPendingRewards { lp_staking: Address, staker: Address },
    LpRewardPerBlock { lp_staking: Address },
    CurrentRewardForNextEpoch { distributor: Address },
    SaleQuote { presale: Address, payment: U256 },
    AllotmentPerBuyer { presale: Address },
    SalePrice { presale: Address },
}

impl ContractRead {
    /// Solidity method name, for logs.
    pub fn method(&self) -> &'static str {
        match self {
            Self::BalanceOf { .. } => "balanceOf",
            Self::Allowance { .. } => "allowance",
            Self::TotalSupply { .. } => "totalSupply",
            Self::CirculatingSupply { .. } => "circulatingSupply",
            Self::OhmToDistributeNextEpoch { .. } => "ohmToDistributeNextEpoch",
            Self::LpTotalStaked { .. } => "totalStaked",
            Self::LpUserBalance { .. } => "getUserBalance",
            Self::LpPendingRewards { .. } => "pendingRewards",
            Self::LpRewardPerBlock { .. } => "rewardPerBlock",
            Self::CurrentRewardForNextEpoch { .. } => "getCurrentRewardForNextEpoch",
            Self::SaleQuote { .. } => "calculateSaleQuote",
            Self::AllotmentPerBuyer { .. } => "getAllotmentPerBuyer",
            Self::SalePrice { .. } => "salePrice",
        }
    }
}

/// A state-changing call, sent from the session account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractWrite {
    Approve { token: Address, spender: Address, amount: U256 },
    PurchaseAohm { presale: Address, amount: U256 },
    StakeOhm { staking: Address, amount: U256 },
    UnstakeOhm { staking: Address, amount: U256 },
    StakeLp { lp_staking: Address, amount: U256 },
    UnstakeLp { lp_staking: Address },
    ClaimRewards { lp_staking: Address },
    Migrate { migrator: Address, amount: U256 },
}

impl ContractWrite {
    pub fn method(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::PurchaseAohm { .. } => "purchaseaOHM",
            Self::StakeOhm { .. } => "stakeOHM",
            Self::UnstakeOhm { .. } => "unstakeOHM",
            Self::StakeLp { .. } => "stakeLP",
            Self::UnstakeLp { .. } => "unstakeLP",
            Self::ClaimRewards { .. } => "claimRewards",
            Self::Migrate { .. } => "migrate",
        }
    }

    /// Contract the transaction is sent to.
    pub fn target(&self) -> Address {
        match *self {
            Self::Approve { token, .. } => token,
            Self::PurchaseAohm { presale, .. } => presale,
            Self::StakeOhm { staking, .. } | Self::UnstakeOhm { staking, .. } => staking,
            Self::StakeLp { lp_staking, .. }
            | Self::UnstakeLp { lp_staking }
            | Self::ClaimRewards { lp_staking } => lp_staking,
            Self::Migrate { migrator, .. } => migrator,
        }
    }
}
