//! Treasury error types

use thiserror::Error;

use cadence_core::CoreError;
use governance::VoteError;

use crate::proposal::ProposalState;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreasuryError {
    #[error("proposal not found")]
    ProposalNotFound,

    #[error("proposal already exists")]
    ProposalExists,

    #[error("caller is not the proposer")]
    NotProposer,

    #[error("proposal is already endorsed")]
    AlreadyEndorsed,

    #[error("operation not valid in state {state:?}")]
    WrongState { state: ProposalState },

    #[error("milestone durations and fundings must have equal, non-zero length")]
    MismatchedMilestones,

    #[error("requested funding {requested} exceeds treasury balance {available}")]
    ExceedsTreasury { requested: u64, available: u64 },

    #[error("unknown milestone index {0}")]
    UnknownMilestone(usize),

    #[error("milestone is not cleared for release")]
    ComplianceNotSet,

    #[error("funding already claimed for this milestone")]
    AlreadyClaimed,

    #[error("treasury has migrated to a successor")]
    Migrated,

    #[error(transparent)]
    Vote(#[from] VoteError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type Result<T> = std::result::Result<T, TreasuryError>;
