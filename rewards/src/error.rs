//! Rewards engine error types

use thiserror::Error;

use cadence_core::CoreError;
use stake::StakeError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RewardsError {
    #[error("the first quarter has no prior quarter to settle")]
    FirstQuarter,

    #[error("a global accrual pass is already in progress for this quarter")]
    AlreadyInProgress,

    #[error("rewards for quarter {quarter} have not been finalized")]
    RewardsNotReady { quarter: u64 },

    #[error("no claimable reward balance")]
    NothingToClaim,

    #[error("badge already redeemed")]
    BadgeAlreadyRedeemed,

    #[error(transparent)]
    Stake(#[from] StakeError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, RewardsError>;
