//! Participant records

use serde::{Deserialize, Serialize};

use cadence_core::{Address, DaoConfig};

/// Address-keyed stake and accrual record.
///
/// Created on first lock, never deleted; a full withdrawal zeroes the stake
/// fields but the accrual markers survive so settlement stays consistent.
/// Invariant: `effective_stake <= locked_stake`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub address: Address,
    pub locked_stake: u64,
    /// Time-prorated stake counting for `stake_quarter`. Refreshed to the
    /// full locked amount at confirmation.
    pub effective_stake: u64,
    /// Quarter `effective_stake` currently describes.
    pub stake_quarter: u64,
    pub is_moderator: bool,
    pub reputation: u64,
    pub joined_quarter: u64,
    /// Last quarter this participant registered stake for (locked above the
    /// minimum or confirmed continued participation).
    pub last_participated_quarter: u64,
    pub last_quarter_rewards_updated: u64,
    pub last_quarter_reputation_updated: u64,
    /// Accrued, not yet claimed reward tokens.
    pub claimable_reward: u64,
    pub badge_redeemed: bool,
}

impl Participant {
    pub fn new(address: Address, quarter: u64) -> Self {
        Self {
            address,
            locked_stake: 0,
            effective_stake: 0,
            stake_quarter: quarter,
            is_moderator: false,
            reputation: 0,
            joined_quarter: quarter,
            last_participated_quarter: 0,
            // Settlement walks forward from these markers; a fresh record
            // owes nothing for quarters before it existed.
            last_quarter_rewards_updated: quarter.saturating_sub(1),
            last_quarter_reputation_updated: quarter.saturating_sub(1),
            claimable_reward: 0,
            badge_redeemed: false,
        }
    }

    /// Holds enough stake to count as a participant at all.
    pub fn meets_participation_minimum(&self, config: &DaoConfig) -> bool {
        self.locked_stake >= config.min_stake_to_participate
    }

    /// Meets the elevated stake and reputation bar for moderators.
    pub fn qualifies_as_moderator(&self, config: &DaoConfig) -> bool {
        self.locked_stake >= config.moderator_min_stake
            && self.reputation >= config.moderator_min_reputation
    }

    /// Registered (and still staked) for `quarter`.
    pub fn participates_in(&self, quarter: u64, config: &DaoConfig) -> bool {
        self.last_participated_quarter == quarter && self.meets_participation_minimum(config)
    }
}
