//! Cadence DAO Voting Protocol
//!
//! Implements the three voting surfaces of the DAO: plain draft votes by
//! moderators, two-phase commit-reveal votes on proposal milestones, and
//! commit-reveal special-proposal votes that rewrite governance parameters.
//! Quorum and quota decisions are pure functions over stake totals.

pub mod commit;
pub mod draft;
pub mod error;
pub mod quorum;
pub mod special;
pub mod voting;

pub use commit::{
    commitment, CommitEntry, CommitPayload, CommitRevealRound, RoundOutcome, RoundPhase, Salt, Tally,
};
pub use draft::DraftRound;
pub use error::{Result, VoteError};
pub use quorum::{min_quorum, quota_pass};
pub use special::SpecialProposal;
pub use voting::{RoundResult, VotingManager};
