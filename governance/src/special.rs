//! Special (policy) proposals
//!
//! A founder proposes a vector of governance parameter changes; all
//! participants vote commit-reveal, weighted by locked stake at commit
//! time. A passed and claimed special proposal is applied to the live
//! configuration exactly once.

use serde::{Deserialize, Serialize};

use cadence_core::{Address, DaoConfig, DocHash, ParamUpdate};
use stake::{PointsBook, StakeLedger};

use crate::commit::{CommitHash, CommitRevealRound, RoundOutcome, Salt};
use crate::error::{Result, VoteError};
use crate::quorum::{min_quorum, quota_pass};
use crate::voting::{RoundResult, VotingManager};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecialProposal {
    pub id: DocHash,
    pub proposer: Address,
    pub updates: Vec<ParamUpdate>,
    pub created_at: u64,
    pub round: CommitRevealRound<bool>,
    pub applied: bool,
}

impl VotingManager {
    /// Register a special proposal; its voting round opens immediately.
    pub fn create_special(
        &mut self,
        id: DocHash,
        proposer: Address,
        updates: Vec<ParamUpdate>,
        now: u64,
        config: &DaoConfig,
    ) -> Result<()> {
        if self.specials.contains_key(&id) {
            return Err(VoteError::RoundAlreadyExists);
        }
        if updates.is_empty() {
            return Err(VoteError::InvalidConfig("no parameter updates".to_string()));
        }
        self.specials.insert(
            id,
            SpecialProposal {
                id,
                proposer,
                updates,
                created_at: now,
                round: CommitRevealRound::open(
                    now,
                    config.special_commit_duration,
                    config.special_reveal_duration,
                ),
                applied: false,
            },
        );
        Ok(())
    }

    /// Commit a special-proposal vote, weighted by locked (not effective)
    /// stake at commit time. Open to every participant.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_special(
        &mut self,
        ledger: &StakeLedger,
        config: &DaoConfig,
        id: DocHash,
        voter: &str,
        hash: CommitHash,
        nonce: u64,
        quarter: u64,
        now: u64,
    ) -> Result<()> {
        if !ledger.is_participant(voter, quarter, config) {
            return Err(VoteError::NotEligible);
        }
        let weight = ledger.participant(voter).map_err(|_| VoteError::NotEligible)?.locked_stake;
        self.check_nonce(voter, nonce)?;
        let special = self.specials.get_mut(&id).ok_or(VoteError::SpecialNotFound)?;
        special.round.commit(voter, hash, weight, now)?;
        self.consume_nonce(voter, nonce);
        Ok(())
    }

    /// Reveal a special-proposal vote and earn the vote's quarter point.
    #[allow(clippy::too_many_arguments)]
    pub fn reveal_special(
        &mut self,
        points: &mut PointsBook,
        config: &DaoConfig,
        id: DocHash,
        voter: &str,
        choice: bool,
        salt: &Salt,
        quarter: u64,
        now: u64,
    ) -> Result<()> {
        let special = self.specials.get_mut(&id).ok_or(VoteError::SpecialNotFound)?;
        special.round.reveal(voter, choice, salt, now)?;
        points.add_quarter_points(voter, quarter, config.quarter_point_per_vote);
        Ok(())
    }

    /// Decide a special proposal. Quorum is the fixed portion of all
    /// locked stake; policy votes carry no funding ask to scale by.
    pub fn claim_special(
        &mut self,
        id: DocHash,
        total_locked_stake: u64,
        config: &DaoConfig,
        now: u64,
    ) -> Result<RoundResult> {
        let t = &config.special;
        let quorum = min_quorum(
            total_locked_stake,
            t.quorum_fixed_num,
            t.quorum_fixed_den,
            t.quorum_scale_num,
            t.quorum_scale_den,
            0,
            0,
        );
        let special = self.specials.get_mut(&id).ok_or(VoteError::SpecialNotFound)?;
        let tally = special.round.tally();
        let passed = tally.total() >= quorum
            && quota_pass(tally.for_weight, tally.against_weight, t.quota_num, t.quota_den);
        let outcome = special.round.claim(passed, now)?;
        Ok(RoundResult { outcome, tally, quorum })
    }

    /// Apply a passed, claimed special proposal to the live configuration.
    /// One-shot; the update vector is validated as a whole before any field
    /// changes.
    pub fn apply_special(&mut self, config: &mut DaoConfig, id: DocHash) -> Result<()> {
        let special = self.specials.get_mut(&id).ok_or(VoteError::SpecialNotFound)?;
        match special.round.outcome() {
            None => return Err(VoteError::NotClaimed),
            Some(RoundOutcome::Failed) => return Err(VoteError::NotPassed),
            Some(RoundOutcome::Passed) => {}
        }
        if special.applied {
            return Err(VoteError::AlreadyApplied);
        }
        config
            .apply_updates(&special.updates)
            .map_err(VoteError::InvalidConfig)?;
        special.applied = true;
        Ok(())
    }

    pub fn special(&self, id: &DocHash) -> Option<&SpecialProposal> {
        self.specials.get(id)
    }
}
