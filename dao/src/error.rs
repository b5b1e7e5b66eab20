//! Facade error type
//!
//! Wraps the component errors so callers see one taxonomy.

use thiserror::Error;

use cadence_core::CoreError;
use governance::VoteError;
use rewards::RewardsError;
use stake::StakeError;
use treasury::TreasuryError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DaoError {
    #[error("start of the first quarter is already set")]
    AlreadyStarted,

    #[error("treasury has migrated to a successor")]
    Migrated,

    #[error("caller is not a registered participant")]
    NotParticipant,

    #[error("caller has not cleared the KYC check")]
    KycRequired,

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Stake(#[from] StakeError),

    #[error(transparent)]
    Vote(#[from] VoteError),

    #[error(transparent)]
    Rewards(#[from] RewardsError),

    #[error(transparent)]
    Treasury(#[from] TreasuryError),
}

pub type Result<T> = std::result::Result<T, DaoError>;
