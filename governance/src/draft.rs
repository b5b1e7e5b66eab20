//! Draft voting
//!
//! Moderators screen a proposal with plain (uncommitted) boolean votes
//! during the draft window. A moderator may change their vote; the
//! aggregate counters are adjusted by the delta rather than recomputed.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cadence_core::Address;

use crate::commit::{RoundOutcome, Tally};
use crate::error::{Result, VoteError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DraftVote {
    pub choice: bool,
    pub weight: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRound {
    pub deadline: u64,
    votes: HashMap<Address, DraftVote>,
    tally: Tally,
    outcome: Option<RoundOutcome>,
}

impl DraftRound {
    pub fn open(now: u64, duration: u64) -> Self {
        Self {
            deadline: now + duration,
            votes: HashMap::new(),
            tally: Tally::default(),
            outcome: None,
        }
    }

    /// Cast or change a vote. Returns `true` on the voter's first vote in
    /// this round.
    pub fn vote(&mut self, voter: &str, choice: bool, weight: u64, now: u64) -> Result<bool> {
        if now >= self.deadline {
            return Err(VoteError::CommitClosed);
        }
        let previous = self.votes.insert(voter.to_string(), DraftVote { choice, weight });
        if let Some(old) = previous {
            match old.choice {
                true => self.tally.for_weight -= old.weight,
                false => self.tally.against_weight -= old.weight,
            }
        }
        match choice {
            true => self.tally.for_weight += weight,
            false => self.tally.against_weight += weight,
        }
        Ok(previous.is_none())
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn vote_of(&self, voter: &str) -> Option<&DraftVote> {
        self.votes.get(voter)
    }

    /// Record the outcome once the window has elapsed.
    pub fn claim(&mut self, passed: bool, now: u64) -> Result<RoundOutcome> {
        if now < self.deadline {
            return Err(VoteError::RevealNotOver);
        }
        if self.outcome.is_some() {
            return Err(VoteError::AlreadyClaimed);
        }
        let outcome = if passed {
            RoundOutcome::Passed
        } else {
            RoundOutcome::Failed
        };
        self.outcome = Some(outcome);
        Ok(outcome)
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        self.outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revote_adjusts_by_delta() {
        let mut round = DraftRound::open(1000, 100);
        round.vote("mod1", true, 50, 1001).unwrap();
        round.vote("mod2", false, 30, 1002).unwrap();
        assert_eq!(round.tally().for_weight, 50);
        assert_eq!(round.tally().against_weight, 30);

        // mod1 flips to against with a different weight.
        let first = round.vote("mod1", false, 45, 1003).unwrap();
        assert!(!first);
        assert_eq!(round.tally().for_weight, 0);
        assert_eq!(round.tally().against_weight, 75);
    }

    #[test]
    fn test_vote_after_deadline_rejected() {
        let mut round = DraftRound::open(1000, 100);
        assert_eq!(
            round.vote("mod1", true, 50, 1100),
            Err(VoteError::CommitClosed)
        );
    }

    #[test]
    fn test_claim_records_failure_permanently() {
        let mut round = DraftRound::open(1000, 100);
        round.vote("mod1", true, 10, 1001).unwrap();
        assert_eq!(round.claim(false, 1100), Ok(RoundOutcome::Failed));
        assert_eq!(round.claim(true, 1101), Err(VoteError::AlreadyClaimed));
    }
}
