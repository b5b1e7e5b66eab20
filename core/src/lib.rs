//! Cadence DAO Core
//!
//! Shared building blocks for the governance engine: the quarter/phase
//! calendar, the governance parameter registry, role-based capability
//! checks, the token bank boundary and content-addressed document hashes.

pub mod bank;
pub mod config;
pub mod docs;
pub mod epoch;
pub mod error;
pub mod roles;

pub use bank::{MemoryBank, TokenBank};
pub use config::{DaoConfig, ParamKey, ParamUpdate, VoteThresholds};
pub use docs::DocHash;
pub use epoch::{EpochClock, Phase, DAY};
pub use error::{CoreError, Result};
pub use roles::{require_role, Role, RoleRegistry, RoleTable};

/// Participant address. Hex-encoded account identifier issued by the host.
pub type Address = String;

/// Smallest unit of both the stake and reward tokens (9 decimal places).
pub const TOKEN_UNIT: u64 = 1_000_000_000;
