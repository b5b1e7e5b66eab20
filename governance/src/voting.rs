//! The voting manager
//!
//! Owns every vote record: draft rounds, the per-proposal sequence of
//! milestone/interim commit-reveal rounds, special-proposal rounds, and the
//! per-voter nonce registry shared by all committed votes. Eligibility and
//! weight come from the stake ledger at the moment of the commit; reveals
//! award quarter points.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cadence_core::{Address, DaoConfig, DocHash};
use stake::{PointsBook, StakeLedger};

use crate::commit::{CommitHash, CommitRevealRound, RoundOutcome, Salt, Tally};
use crate::draft::DraftRound;
use crate::error::{Result, VoteError};
use crate::quorum::{min_quorum, quota_pass};
use crate::special::SpecialProposal;

/// Outcome of a claimed round together with the numbers behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundResult {
    pub outcome: RoundOutcome,
    pub tally: Tally,
    pub quorum: u64,
}

impl RoundResult {
    pub fn passed(&self) -> bool {
        self.outcome == RoundOutcome::Passed
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VotingManager {
    drafts: HashMap<DocHash, DraftRound>,
    /// Commit-reveal rounds per proposal, in round order: index 0 is the
    /// first milestone vote, later indexes the interim votes.
    rounds: HashMap<DocHash, Vec<CommitRevealRound<bool>>>,
    pub(crate) specials: HashMap<DocHash, SpecialProposal>,
    /// Last nonce each voter used across all committed votes.
    nonces: HashMap<Address, u64>,
}

impl VotingManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the draft round for a proposal. A proposal that failed its
    /// draft vote may be re-finalized, which replaces the claimed round.
    pub fn open_draft(&mut self, id: DocHash, now: u64, duration: u64) -> Result<()> {
        match self.drafts.get(&id) {
            Some(round) if round.outcome() != Some(RoundOutcome::Failed) => {
                Err(VoteError::RoundAlreadyExists)
            }
            _ => {
                self.drafts.insert(id, DraftRound::open(now, duration));
                Ok(())
            }
        }
    }

    /// Moderator draft vote, weighted by the moderator's effective stake.
    pub fn draft_vote(
        &mut self,
        ledger: &StakeLedger,
        points: &mut PointsBook,
        config: &DaoConfig,
        id: DocHash,
        voter: &str,
        choice: bool,
        quarter: u64,
        now: u64,
    ) -> Result<()> {
        if !ledger.is_moderator(voter, quarter, config) {
            return Err(VoteError::NotEligible);
        }
        let weight = ledger.participant(voter).map_err(|_| VoteError::NotEligible)?.effective_stake;
        let round = self.drafts.get_mut(&id).ok_or(VoteError::RoundNotFound)?;
        let first_vote = round.vote(voter, choice, weight, now)?;
        if first_vote {
            points.add_moderator_points(voter, quarter, config.moderator_point_per_draft_vote);
        }
        Ok(())
    }

    /// Decide the draft round against the draft quorum/quota set.
    pub fn claim_draft(
        &mut self,
        id: DocHash,
        total_moderator_stake: u64,
        amount_requested: u64,
        treasury_balance: u64,
        config: &DaoConfig,
        now: u64,
    ) -> Result<RoundResult> {
        let t = &config.draft;
        let quorum = min_quorum(
            total_moderator_stake,
            t.quorum_fixed_num,
            t.quorum_fixed_den,
            t.quorum_scale_num,
            t.quorum_scale_den,
            amount_requested,
            treasury_balance,
        );
        let round = self.drafts.get_mut(&id).ok_or(VoteError::RoundNotFound)?;
        let tally = round.tally();
        let passed = tally.total() >= quorum && quota_pass(tally.for_weight, tally.against_weight, t.quota_num, t.quota_den);
        let outcome = round.claim(passed, now)?;
        Ok(RoundResult { outcome, tally, quorum })
    }

    /// Open commit-reveal round `index` for a proposal. Rounds are opened
    /// strictly in order and never reopened.
    pub fn open_round(
        &mut self,
        id: DocHash,
        index: usize,
        now: u64,
        commit_duration: u64,
        reveal_duration: u64,
    ) -> Result<()> {
        let rounds = self.rounds.entry(id).or_default();
        if index != rounds.len() {
            return Err(VoteError::RoundAlreadyExists);
        }
        rounds.push(CommitRevealRound::open(now, commit_duration, reveal_duration));
        Ok(())
    }

    /// Commit a milestone/interim vote. Weight is the voter's effective
    /// stake right now; the snapshot is what the tally will use no matter
    /// how stake moves afterwards.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_vote(
        &mut self,
        ledger: &StakeLedger,
        config: &DaoConfig,
        id: DocHash,
        index: usize,
        voter: &str,
        hash: CommitHash,
        nonce: u64,
        quarter: u64,
        now: u64,
    ) -> Result<()> {
        if !ledger.is_participant(voter, quarter, config) {
            return Err(VoteError::NotEligible);
        }
        let weight = ledger.participant(voter).map_err(|_| VoteError::NotEligible)?.effective_stake;
        self.commit_with_weight(id, index, voter, hash, nonce, weight, now)
    }

    /// Reveal a milestone/interim vote and earn the vote's quarter point.
    #[allow(clippy::too_many_arguments)]
    pub fn reveal_vote(
        &mut self,
        points: &mut PointsBook,
        config: &DaoConfig,
        id: DocHash,
        index: usize,
        voter: &str,
        choice: bool,
        salt: &Salt,
        quarter: u64,
        now: u64,
    ) -> Result<()> {
        let round = self
            .rounds
            .get_mut(&id)
            .and_then(|rounds| rounds.get_mut(index))
            .ok_or(VoteError::RoundNotFound)?;
        round.reveal(voter, choice, salt, now)?;
        points.add_quarter_points(voter, quarter, config.quarter_point_per_vote);
        Ok(())
    }

    /// Decide round `index` against the milestone-voting quorum/quota set.
    #[allow(clippy::too_many_arguments)]
    pub fn claim_round(
        &mut self,
        id: DocHash,
        index: usize,
        total_participant_stake: u64,
        amount_requested: u64,
        treasury_balance: u64,
        config: &DaoConfig,
        now: u64,
    ) -> Result<RoundResult> {
        let t = &config.voting;
        let quorum = min_quorum(
            total_participant_stake,
            t.quorum_fixed_num,
            t.quorum_fixed_den,
            t.quorum_scale_num,
            t.quorum_scale_den,
            amount_requested,
            treasury_balance,
        );
        let round = self
            .rounds
            .get_mut(&id)
            .and_then(|rounds| rounds.get_mut(index))
            .ok_or(VoteError::RoundNotFound)?;
        let tally = round.tally();
        let passed = tally.total() >= quorum && quota_pass(tally.for_weight, tally.against_weight, t.quota_num, t.quota_den);
        let outcome = round.claim(passed, now)?;
        Ok(RoundResult { outcome, tally, quorum })
    }

    pub fn draft(&self, id: &DocHash) -> Option<&DraftRound> {
        self.drafts.get(id)
    }

    pub fn round(&self, id: &DocHash, index: usize) -> Option<&CommitRevealRound<bool>> {
        self.rounds.get(id).and_then(|rounds| rounds.get(index))
    }

    pub fn round_count(&self, id: &DocHash) -> usize {
        self.rounds.get(id).map(Vec::len).unwrap_or(0)
    }

    pub fn last_nonce(&self, voter: &str) -> u64 {
        self.nonces.get(voter).copied().unwrap_or(0)
    }

    /// Shared commit path: nonce check, then the round's own checks, and
    /// only then is the nonce consumed.
    pub(crate) fn commit_with_weight(
        &mut self,
        id: DocHash,
        index: usize,
        voter: &str,
        hash: CommitHash,
        nonce: u64,
        weight: u64,
        now: u64,
    ) -> Result<()> {
        self.check_nonce(voter, nonce)?;
        let round = self
            .rounds
            .get_mut(&id)
            .and_then(|rounds| rounds.get_mut(index))
            .ok_or(VoteError::RoundNotFound)?;
        round.commit(voter, hash, weight, now)?;
        self.nonces.insert(voter.to_string(), nonce);
        Ok(())
    }

    pub(crate) fn check_nonce(&self, voter: &str, nonce: u64) -> Result<()> {
        let last = self.last_nonce(voter);
        if nonce <= last {
            return Err(VoteError::NonceReused { supplied: nonce, last });
        }
        Ok(())
    }

    pub(crate) fn consume_nonce(&mut self, voter: &str, nonce: u64) {
        self.nonces.insert(voter.to_string(), nonce);
    }
}
