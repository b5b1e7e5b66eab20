//! Quarter participation points
//!
//! Voting activity earns quarter points; the rewards engine reads them when
//! it settles a quarter. Participant points (milestone and special-proposal
//! reveals) and moderator points (draft votes) are kept in separate books.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cadence_core::Address;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointsBook {
    participant: HashMap<Address, HashMap<u64, u64>>,
    moderator: HashMap<Address, HashMap<u64, u64>>,
}

impl PointsBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_quarter_points(&mut self, addr: &str, quarter: u64, points: u64) {
        *self
            .participant
            .entry(addr.to_string())
            .or_default()
            .entry(quarter)
            .or_default() += points;
    }

    pub fn add_moderator_points(&mut self, addr: &str, quarter: u64, points: u64) {
        *self
            .moderator
            .entry(addr.to_string())
            .or_default()
            .entry(quarter)
            .or_default() += points;
    }

    pub fn quarter_points(&self, addr: &str, quarter: u64) -> u64 {
        self.participant
            .get(addr)
            .and_then(|per_quarter| per_quarter.get(&quarter))
            .copied()
            .unwrap_or(0)
    }

    pub fn moderator_points(&self, addr: &str, quarter: u64) -> u64 {
        self.moderator
            .get(addr)
            .and_then(|per_quarter| per_quarter.get(&quarter))
            .copied()
            .unwrap_or(0)
    }
}
