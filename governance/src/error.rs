//! Voting error types

use thiserror::Error;

use cadence_core::CoreError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VoteError {
    #[error("commit window is closed")]
    CommitClosed,

    #[error("reveal window is closed")]
    RevealClosed,

    #[error("reveal window has not ended")]
    RevealNotOver,

    #[error("voter already committed in this round")]
    DuplicateCommit,

    #[error("nonce {supplied} does not exceed last used nonce {last}")]
    NonceReused { supplied: u64, last: u64 },

    #[error("reveal does not match the stored commitment")]
    HashMismatch,

    #[error("voter already revealed in this round")]
    AlreadyRevealed,

    #[error("no commitment to reveal")]
    NothingCommitted,

    #[error("round already claimed")]
    AlreadyClaimed,

    #[error("round not claimed yet")]
    NotClaimed,

    #[error("voter is not eligible for this vote")]
    NotEligible,

    #[error("voting round not found")]
    RoundNotFound,

    #[error("voting round already exists")]
    RoundAlreadyExists,

    #[error("special proposal not found")]
    SpecialNotFound,

    #[error("special proposal did not pass")]
    NotPassed,

    #[error("special proposal already applied")]
    AlreadyApplied,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, VoteError>;
