//! Cadence DAO Rewards Engine
//!
//! Runs the quarterly accrual: a resumable bounded-step pass over every
//! participant totals the effective stake of the quarter just ended, then
//! per-user settlement lazily converts those totals into reputation deltas
//! and claimable reward balances, with demurrage charged on late claims.

pub mod demurrage;
pub mod engine;
pub mod error;
pub mod formula;

pub use demurrage::demurrage_charge;
pub use engine::{AccrualCursor, AccrualEngine, BatchStatus, QuarterInfo};
pub use error::{Result, RewardsError};
pub use formula::{effective_balance, pool_share};
