//! Cadence DAO Treasury
//!
//! Owns the proposal funding lifecycle: endorsement, draft vetting,
//! per-milestone voting and fund release behind the PRL compliance gate,
//! and the one-time migration of the undistributed treasury to a
//! successor.

pub mod error;
pub mod funding;
pub mod proposal;

pub use error::{Result, TreasuryError};
pub use funding::FundingManager;
pub use proposal::{Proposal, ProposalState, ProposalVersion};
