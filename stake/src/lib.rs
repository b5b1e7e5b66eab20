//! Cadence DAO Stake Ledger
//!
//! Tracks each participant's locked and effective (time-prorated) stake,
//! moderator eligibility, and the per-quarter participation points that
//! feed the rewards engine. The ledger is the sole source of truth for
//! voting weight.

pub mod error;
pub mod ledger;
pub mod participant;
pub mod points;

pub use error::{Result, StakeError};
pub use ledger::{QuarterTotals, StakeLedger};
pub use participant::Participant;
pub use points::PointsBook;
