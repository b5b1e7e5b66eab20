//! Stake ledger error types

use thiserror::Error;

use cadence_core::CoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StakeError {
    #[error("amount must be greater than zero")]
    ZeroAmount,

    #[error("insufficient stake: requested {requested}, locked {locked}")]
    InsufficientStake { requested: u64, locked: u64 },

    #[error("unknown participant {0}")]
    UnknownParticipant(String),

    #[error("stake below the participation minimum")]
    BelowParticipationMinimum,

    #[error("participation already confirmed for quarter {0}")]
    AlreadyConfirmed(u64),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, StakeError>;
