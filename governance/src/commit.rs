//! Commit-reveal rounds
//!
//! One commitment scheme serves every committed vote surface: a voter
//! commits `sha256(voter || payload || salt)` during the commit window and
//! later reveals `(payload, salt)`. The round is generic over the committed
//! payload; eligibility and weighting live with the callers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use cadence_core::Address;

use crate::error::{Result, VoteError};

pub type Salt = [u8; 32];
pub type CommitHash = [u8; 32];

/// A value that can be committed to and later revealed.
pub trait CommitPayload {
    fn payload_bytes(&self) -> Vec<u8>;
}

/// Boolean vote choice: `true` is a vote in favor.
impl CommitPayload for bool {
    fn payload_bytes(&self) -> Vec<u8> {
        vec![u8::from(*self)]
    }
}

/// Commitment hash binding a voter to a payload and salt.
pub fn commitment<T: CommitPayload>(voter: &str, payload: &T, salt: &Salt) -> CommitHash {
    let mut hasher = Sha256::new();
    hasher.update(voter.as_bytes());
    hasher.update(payload.payload_bytes());
    hasher.update(salt);
    hasher.finalize().into()
}

/// Where a round stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Commit,
    Reveal,
    Closed,
}

/// Recorded result of a claimed round. A failed round is claimed too; no
/// round is ever re-run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Passed,
    Failed,
}

/// Per-voter record inside a round. The weight is snapshotted at commit
/// time so stake moved afterwards cannot influence the tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitEntry<T> {
    pub hash: CommitHash,
    pub weight: u64,
    pub revealed: Option<T>,
}

/// Weighted for/against totals over revealed votes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub for_weight: u64,
    pub against_weight: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.for_weight + self.against_weight
    }
}

/// A single commit-reveal voting round.
///
/// The round advances `Commit → Reveal → Claimed` with wall-clock
/// deadlines and never moves backwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRevealRound<T> {
    pub commit_deadline: u64,
    pub reveal_deadline: u64,
    entries: HashMap<Address, CommitEntry<T>>,
    outcome: Option<RoundOutcome>,
}

impl<T: CommitPayload + Clone> CommitRevealRound<T> {
    /// Open a round at `now`; the reveal window follows the commit window
    /// immediately.
    pub fn open(now: u64, commit_duration: u64, reveal_duration: u64) -> Self {
        Self {
            commit_deadline: now + commit_duration,
            reveal_deadline: now + commit_duration + reveal_duration,
            entries: HashMap::new(),
            outcome: None,
        }
    }

    pub fn phase(&self, now: u64) -> RoundPhase {
        if now < self.commit_deadline {
            RoundPhase::Commit
        } else if now < self.reveal_deadline {
            RoundPhase::Reveal
        } else {
            RoundPhase::Closed
        }
    }

    /// Store a commitment. Exactly one commit per voter per round.
    pub fn commit(&mut self, voter: &str, hash: CommitHash, weight: u64, now: u64) -> Result<()> {
        if self.phase(now) != RoundPhase::Commit {
            return Err(VoteError::CommitClosed);
        }
        if self.entries.contains_key(voter) {
            return Err(VoteError::DuplicateCommit);
        }
        self.entries.insert(
            voter.to_string(),
            CommitEntry {
                hash,
                weight,
                revealed: None,
            },
        );
        Ok(())
    }

    /// Reveal a committed payload. Accepted only if it reproduces the
    /// stored hash and the voter has not revealed before.
    pub fn reveal(&mut self, voter: &str, payload: T, salt: &Salt, now: u64) -> Result<u64> {
        if self.phase(now) != RoundPhase::Reveal {
            return Err(VoteError::RevealClosed);
        }
        let entry = self
            .entries
            .get_mut(voter)
            .ok_or(VoteError::NothingCommitted)?;
        if entry.revealed.is_some() {
            return Err(VoteError::AlreadyRevealed);
        }
        if commitment(voter, &payload, salt) != entry.hash {
            return Err(VoteError::HashMismatch);
        }
        entry.revealed = Some(payload);
        Ok(entry.weight)
    }

    /// Record the round's outcome after the reveal window. One-shot: a
    /// claimed round, passed or failed, stays claimed.
    pub fn claim(&mut self, passed: bool, now: u64) -> Result<RoundOutcome> {
        if now < self.reveal_deadline {
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

    pub fn commit_count(&self) -> usize {
        self.entries.len()
    }

    pub fn entry(&self, voter: &str) -> Option<&CommitEntry<T>> {
        self.entries.get(voter)
    }
}

impl CommitRevealRound<bool> {
    /// Weighted tally over revealed votes.
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for entry in self.entries.values() {
            match entry.revealed {
                Some(true) => tally.for_weight += entry.weight,
                Some(false) => tally.against_weight += entry.weight,
                None => {}
            }
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SALT: Salt = [7u8; 32];

    fn round() -> CommitRevealRound<bool> {
        CommitRevealRound::open(1000, 100, 50)
    }

    #[test]
    fn test_phases_advance_with_the_clock() {
        let r = round();
        assert_eq!(r.phase(1000), RoundPhase::Commit);
        assert_eq!(r.phase(1099), RoundPhase::Commit);
        assert_eq!(r.phase(1100), RoundPhase::Reveal);
        assert_eq!(r.phase(1149), RoundPhase::Reveal);
        assert_eq!(r.phase(1150), RoundPhase::Closed);
    }

    #[test]
    fn test_commit_then_matching_reveal() {
        let mut r = round();
        let hash = commitment("alice", &true, &SALT);
        r.commit("alice", hash, 40, 1010).unwrap();

        let weight = r.reveal("alice", true, &SALT, 1110).unwrap();
        assert_eq!(weight, 40);
        assert_eq!(r.tally().for_weight, 40);
    }

    #[test]
    fn test_mismatched_reveal_rejected() {
        let mut r = round();
        let hash = commitment("alice", &true, &SALT);
        r.commit("alice", hash, 40, 1010).unwrap();

        // Wrong choice.
        assert_eq!(r.reveal("alice", false, &SALT, 1110), Err(VoteError::HashMismatch));
        // Wrong salt.
        let other_salt = [8u8; 32];
        assert_eq!(r.reveal("alice", true, &other_salt, 1110), Err(VoteError::HashMismatch));
        // The failed attempts leave the commitment intact.
        assert_eq!(r.reveal("alice", true, &SALT, 1110), Ok(40));
    }

    #[test]
    fn test_duplicate_commit_rejected() {
        let mut r = round();
        let hash = commitment("alice", &true, &SALT);
        r.commit("alice", hash, 40, 1010).unwrap();
        assert_eq!(
            r.commit("alice", hash, 40, 1020),
            Err(VoteError::DuplicateCommit)
        );
    }

    #[test]
    fn test_windows_are_enforced() {
        let mut r = round();
        let hash = commitment("alice", &true, &SALT);
        // Committing during reveal fails.
        assert_eq!(r.commit("alice", hash, 40, 1100), Err(VoteError::CommitClosed));
        r.commit("alice", hash, 40, 1010).unwrap();
        // Revealing during commit fails.
        assert_eq!(r.reveal("alice", true, &SALT, 1050), Err(VoteError::RevealClosed));
        // Revealing after close fails.
        assert_eq!(r.reveal("alice", true, &SALT, 1150), Err(VoteError::RevealClosed));
    }

    #[test]
    fn test_double_reveal_rejected() {
        let mut r = round();
        let hash = commitment("alice", &false, &SALT);
        r.commit("alice", hash, 25, 1010).unwrap();
        r.reveal("alice", false, &SALT, 1110).unwrap();
        assert_eq!(
            r.reveal("alice", false, &SALT, 1111),
            Err(VoteError::AlreadyRevealed)
        );
    }

    #[test]
    fn test_claim_is_one_shot_and_waits_for_reveal_end() {
        let mut r = round();
        assert_eq!(r.claim(true, 1149), Err(VoteError::RevealNotOver));
        assert_eq!(r.claim(false, 1150), Ok(RoundOutcome::Failed));
        // A failed round stays claimed; it is never retried.
        assert_eq!(r.claim(true, 1151), Err(VoteError::AlreadyClaimed));
        assert_eq!(r.outcome(), Some(RoundOutcome::Failed));
    }
}
