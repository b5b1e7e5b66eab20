//! Quarter and phase calendar
//!
//! Converts wall-clock time plus the configured durations into a quarter
//! number and a phase. All functions are pure; callers pass `now` as unix
//! seconds so the calendar stays deterministic and testable.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Seconds per day.
pub const DAY: u64 = 86_400;

/// Sub-period of a quarter.
///
/// Stake can be locked in either phase but withdrawn only while Locking;
/// proposals and votes belong to the Main phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Locking,
    Main,
}

/// The quarter/phase clock.
///
/// `start_of_first_quarter` is set once by a founder and immutable
/// thereafter; the durations come from the governance configuration and
/// change only through a passed special proposal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EpochClock {
    pub start_of_first_quarter: u64,
    pub locking_phase_duration: u64,
    pub quarter_duration: u64,
}

impl EpochClock {
    pub fn new(start_of_first_quarter: u64, locking_phase_duration: u64, quarter_duration: u64) -> Self {
        Self {
            start_of_first_quarter,
            locking_phase_duration,
            quarter_duration,
        }
    }

    /// Quarter number at `now`, starting from 1.
    pub fn current_quarter(&self, now: u64) -> Result<u64> {
        Ok(1 + self.elapsed(now)? / self.quarter_duration)
    }

    /// Phase at `now`.
    pub fn current_phase(&self, now: u64) -> Result<Phase> {
        if self.elapsed(now)? % self.quarter_duration < self.locking_phase_duration {
            Ok(Phase::Locking)
        } else {
            Ok(Phase::Main)
        }
    }

    /// Seconds already spent inside the current quarter.
    pub fn elapsed_in_quarter(&self, now: u64) -> Result<u64> {
        Ok(self.elapsed(now)? % self.quarter_duration)
    }

    /// Seconds until the next quarter (and with it the next Locking phase)
    /// begins. Drives the Main-phase proration of freshly locked stake.
    pub fn time_left_in_quarter(&self, now: u64) -> Result<u64> {
        Ok(self.quarter_duration - self.elapsed_in_quarter(now)?)
    }

    /// Unix timestamp at which quarter `q` begins.
    pub fn start_of_quarter(&self, quarter: u64) -> u64 {
        self.start_of_first_quarter + (quarter - 1) * self.quarter_duration
    }

    /// Fail with `WrongPhase` unless `now` falls in `required`.
    pub fn require_phase(&self, now: u64, required: Phase) -> Result<()> {
        if self.current_phase(now)? == required {
            Ok(())
        } else {
            Err(CoreError::WrongPhase { required })
        }
    }

    fn elapsed(&self, now: u64) -> Result<u64> {
        if now < self.start_of_first_quarter {
            return Err(CoreError::NotStarted);
        }
        Ok(now - self.start_of_first_quarter)
    }
}
