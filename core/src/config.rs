//! Governance parameter registry
//!
//! Every tunable constant of the engine lives in [`DaoConfig`]. The values
//! below are the genesis defaults; after launch they change only through a
//! passed special proposal, delivered as a vector of [`ParamUpdate`]s.

use serde::{Deserialize, Serialize};

use crate::epoch::DAY;
use crate::TOKEN_UNIT;

/// Quorum and quota constants for one voting surface.
///
/// `min_quorum` uses the fixed portion plus an ask-scaled portion; quota is
/// the winning-ratio bar. Draft, milestone and special voting each carry an
/// independent set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteThresholds {
    pub quorum_fixed_num: u64,
    pub quorum_fixed_den: u64,
    pub quorum_scale_num: u64,
    pub quorum_scale_den: u64,
    pub quota_num: u64,
    pub quota_den: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaoConfig {
    // Calendar
    pub quarter_duration: u64,
    pub locking_phase_duration: u64,

    // Voting windows
    pub draft_voting_duration: u64,
    pub voting_commit_duration: u64,
    pub voting_reveal_duration: u64,
    pub interim_commit_duration: u64,
    pub interim_reveal_duration: u64,
    pub special_commit_duration: u64,
    pub special_reveal_duration: u64,

    // Participation thresholds
    pub min_stake_to_participate: u64,
    pub moderator_min_stake: u64,
    pub moderator_min_reputation: u64,

    // Quarter points
    pub quarter_point_per_vote: u64,
    pub moderator_point_per_draft_vote: u64,
    pub minimal_participation_point: u64,

    // Effective-balance scaling
    pub quarter_point_scaling_factor: u64,
    pub reputation_point_scaling_factor: u64,

    // Reputation accrual
    pub reputation_per_extra_point_num: u64,
    pub reputation_per_extra_point_den: u64,
    pub max_reputation_deduction: u64,
    pub punishment_for_not_locking: u64,
    pub badge_reputation_bonus: u64,

    // Rewards split and demurrage
    pub moderator_rewards_num: u64,
    pub moderator_rewards_den: u64,
    pub demurrage_rate_num: u64,
    pub demurrage_rate_den: u64,

    // Per-surface quorum/quota
    pub draft: VoteThresholds,
    pub voting: VoteThresholds,
    pub special: VoteThresholds,
}

impl Default for DaoConfig {
    fn default() -> Self {
        Self {
            quarter_duration: 90 * DAY,
            locking_phase_duration: 10 * DAY,

            draft_voting_duration: 10 * DAY,
            voting_commit_duration: 10 * DAY,
            voting_reveal_duration: 7 * DAY,
            interim_commit_duration: 7 * DAY,
            interim_reveal_duration: 3 * DAY,
            special_commit_duration: 14 * DAY,
            special_reveal_duration: 7 * DAY,

            min_stake_to_participate: TOKEN_UNIT,
            moderator_min_stake: 500 * TOKEN_UNIT,
            moderator_min_reputation: 400,

            quarter_point_per_vote: 1,
            moderator_point_per_draft_vote: 1,
            minimal_participation_point: 2,

            quarter_point_scaling_factor: 400,
            reputation_point_scaling_factor: 2000,

            reputation_per_extra_point_num: 1,
            reputation_per_extra_point_den: 1,
            max_reputation_deduction: 20,
            punishment_for_not_locking: 5,
            badge_reputation_bonus: 1000,

            moderator_rewards_num: 5,
            moderator_rewards_den: 100,
            demurrage_rate_num: 13,
            demurrage_rate_den: 100_000,

            draft: VoteThresholds {
                quorum_fixed_num: 5,
                quorum_fixed_den: 100,
                quorum_scale_num: 35,
                quorum_scale_den: 100,
                quota_num: 1,
                quota_den: 2,
            },
            voting: VoteThresholds {
                quorum_fixed_num: 5,
                quorum_fixed_den: 100,
                quorum_scale_num: 25,
                quorum_scale_den: 100,
                quota_num: 1,
                quota_den: 2,
            },
            special: VoteThresholds {
                quorum_fixed_num: 40,
                quorum_fixed_den: 100,
                quorum_scale_num: 0,
                quorum_scale_den: 1,
                quota_num: 51,
                quota_den: 100,
            },
        }
    }
}

impl DaoConfig {
    /// Clock for this configuration, anchored at `start_of_first_quarter`.
    pub fn clock(&self, start_of_first_quarter: u64) -> crate::epoch::EpochClock {
        crate::epoch::EpochClock::new(
            start_of_first_quarter,
            self.locking_phase_duration,
            self.quarter_duration,
        )
    }

    /// Apply a batch of parameter updates, validating the result.
    pub fn apply_updates(&mut self, updates: &[ParamUpdate]) -> std::result::Result<(), String> {
        let mut next = self.clone();
        for update in updates {
            next.apply(update);
        }
        next.validate()?;
        *self = next;
        Ok(())
    }

    fn apply(&mut self, update: &ParamUpdate) {
        let v = update.value;
        match update.key {
            ParamKey::QuarterDuration => self.quarter_duration = v,
            ParamKey::LockingPhaseDuration => self.locking_phase_duration = v,
            ParamKey::DraftVotingDuration => self.draft_voting_duration = v,
            ParamKey::VotingCommitDuration => self.voting_commit_duration = v,
            ParamKey::VotingRevealDuration => self.voting_reveal_duration = v,
            ParamKey::InterimCommitDuration => self.interim_commit_duration = v,
            ParamKey::InterimRevealDuration => self.interim_reveal_duration = v,
            ParamKey::SpecialCommitDuration => self.special_commit_duration = v,
            ParamKey::SpecialRevealDuration => self.special_reveal_duration = v,
            ParamKey::MinStakeToParticipate => self.min_stake_to_participate = v,
            ParamKey::ModeratorMinStake => self.moderator_min_stake = v,
            ParamKey::ModeratorMinReputation => self.moderator_min_reputation = v,
            ParamKey::QuarterPointPerVote => self.quarter_point_per_vote = v,
            ParamKey::ModeratorPointPerDraftVote => self.moderator_point_per_draft_vote = v,
            ParamKey::MinimalParticipationPoint => self.minimal_participation_point = v,
            ParamKey::QuarterPointScalingFactor => self.quarter_point_scaling_factor = v,
            ParamKey::ReputationPointScalingFactor => self.reputation_point_scaling_factor = v,
            ParamKey::ReputationPerExtraPointNum => self.reputation_per_extra_point_num = v,
            ParamKey::ReputationPerExtraPointDen => self.reputation_per_extra_point_den = v,
            ParamKey::MaxReputationDeduction => self.max_reputation_deduction = v,
            ParamKey::PunishmentForNotLocking => self.punishment_for_not_locking = v,
            ParamKey::BadgeReputationBonus => self.badge_reputation_bonus = v,
            ParamKey::ModeratorRewardsNum => self.moderator_rewards_num = v,
            ParamKey::ModeratorRewardsDen => self.moderator_rewards_den = v,
            ParamKey::DemurrageRateNum => self.demurrage_rate_num = v,
            ParamKey::DemurrageRateDen => self.demurrage_rate_den = v,
            ParamKey::DraftQuorumFixedNum => self.draft.quorum_fixed_num = v,
            ParamKey::DraftQuorumScaleNum => self.draft.quorum_scale_num = v,
            ParamKey::DraftQuotaNum => self.draft.quota_num = v,
            ParamKey::DraftQuotaDen => self.draft.quota_den = v,
            ParamKey::VotingQuorumFixedNum => self.voting.quorum_fixed_num = v,
            ParamKey::VotingQuorumScaleNum => self.voting.quorum_scale_num = v,
            ParamKey::VotingQuotaNum => self.voting.quota_num = v,
            ParamKey::VotingQuotaDen => self.voting.quota_den = v,
            ParamKey::SpecialQuorumFixedNum => self.special.quorum_fixed_num = v,
            ParamKey::SpecialQuotaNum => self.special.quota_num = v,
            ParamKey::SpecialQuotaDen => self.special.quota_den = v,
        }
    }

    /// Reject configurations the engine cannot run on.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.quarter_duration == 0 {
            return Err("quarter duration must be non-zero".to_string());
        }
        if self.locking_phase_duration == 0 || self.locking_phase_duration >= self.quarter_duration {
            return Err("locking phase must be shorter than the quarter".to_string());
        }
        if self.minimal_participation_point == 0 {
            return Err("minimal participation point must be non-zero".to_string());
        }
        if self.quarter_point_scaling_factor < self.minimal_participation_point {
            return Err("quarter point scaling factor below participation floor".to_string());
        }
        for (name, den) in [
            ("reputation per extra point", self.reputation_per_extra_point_den),
            ("moderator rewards", self.moderator_rewards_den),
            ("demurrage rate", self.demurrage_rate_den),
        ] {
            if den == 0 {
                return Err(format!("{name} denominator must be non-zero"));
            }
        }
        for t in [&self.draft, &self.voting, &self.special] {
            if t.quorum_fixed_den == 0 || t.quorum_scale_den == 0 || t.quota_den == 0 {
                return Err("threshold denominators must be non-zero".to_string());
            }
        }
        if self.moderator_rewards_num > self.moderator_rewards_den {
            return Err("moderator rewards portion exceeds the whole pool".to_string());
        }
        Ok(())
    }
}

/// A governance parameter addressable by special proposals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKey {
    QuarterDuration,
    LockingPhaseDuration,
    DraftVotingDuration,
    VotingCommitDuration,
    VotingRevealDuration,
    InterimCommitDuration,
    InterimRevealDuration,
    SpecialCommitDuration,
    SpecialRevealDuration,
    MinStakeToParticipate,
    ModeratorMinStake,
    ModeratorMinReputation,
    QuarterPointPerVote,
    ModeratorPointPerDraftVote,
    MinimalParticipationPoint,
    QuarterPointScalingFactor,
    ReputationPointScalingFactor,
    ReputationPerExtraPointNum,
    ReputationPerExtraPointDen,
    MaxReputationDeduction,
    PunishmentForNotLocking,
    BadgeReputationBonus,
    ModeratorRewardsNum,
    ModeratorRewardsDen,
    DemurrageRateNum,
    DemurrageRateDen,
    DraftQuorumFixedNum,
    DraftQuorumScaleNum,
    DraftQuotaNum,
    DraftQuotaDen,
    VotingQuorumFixedNum,
    VotingQuorumScaleNum,
    VotingQuotaNum,
    VotingQuotaDen,
    SpecialQuorumFixedNum,
    SpecialQuotaNum,
    SpecialQuotaDen,
}

/// One parameter change proposed by a special proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamUpdate {
    pub key: ParamKey,
    pub value: u64,
}
