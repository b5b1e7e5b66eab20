//! Funding proposals

use serde::{Deserialize, Serialize};

use cadence_core::{Address, DocHash};

use crate::error::{Result, TreasuryError};

/// Lifecycle of a funding proposal.
///
/// `Vetted` means the draft vote passed; from there each milestone runs
/// `Voting → Funded` until the final interim vote completes the proposal,
/// or a failed vote abandons the remaining milestones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    Preproposal,
    Endorsed,
    /// Draft round open; drops back to `Endorsed` if the draft vote fails.
    DraftVoting,
    Vetted,
    Voting,
    Funded,
    Failed,
    Completed,
    /// Terminal compliance stop by the PRL.
    Stopped,
    /// Left behind by a treasury migration.
    MigratedAway,
}

/// One submitted revision of a proposal's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVersion {
    pub doc: DocHash,
    pub milestone_durations: Vec<u64>,
    pub milestone_fundings: Vec<u64>,
    pub final_reward: u64,
    pub submitted_at: u64,
}

impl ProposalVersion {
    pub fn new(
        doc: DocHash,
        milestone_durations: Vec<u64>,
        milestone_fundings: Vec<u64>,
        final_reward: u64,
        submitted_at: u64,
    ) -> Result<Self> {
        if milestone_durations.is_empty() || milestone_durations.len() != milestone_fundings.len() {
            return Err(TreasuryError::MismatchedMilestones);
        }
        Ok(Self {
            doc,
            milestone_durations,
            milestone_fundings,
            final_reward,
            submitted_at,
        })
    }

    pub fn milestone_count(&self) -> usize {
        self.milestone_fundings.len()
    }

    /// Milestone fundings plus the final reward.
    pub fn total_ask(&self) -> u64 {
        self.milestone_fundings.iter().sum::<u64>() + self.final_reward
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Document hash of the first version.
    pub id: DocHash,
    pub proposer: Address,
    pub endorser: Option<Address>,
    pub state: ProposalState,
    pub versions: Vec<ProposalVersion>,
    pub current_milestone: usize,
    /// PRL release flag per milestone.
    pub compliance: Vec<bool>,
    /// Whether each milestone's funds have been claimed.
    pub claimed: Vec<bool>,
    pub final_reward_claimed: bool,
    pub created_at: u64,
}

impl Proposal {
    pub fn new(proposer: Address, version: ProposalVersion, now: u64) -> Self {
        let milestones = version.milestone_count();
        Self {
            id: version.doc,
            proposer,
            endorser: None,
            state: ProposalState::Preproposal,
            versions: vec![version],
            current_milestone: 0,
            compliance: vec![false; milestones],
            claimed: vec![false; milestones],
            final_reward_claimed: false,
            created_at: now,
        }
    }

    /// The revision currently in force.
    pub fn latest_version(&self) -> &ProposalVersion {
        &self.versions[self.versions.len() - 1]
    }

    /// Replace the plan with a new revision; the compliance and claim
    /// tracking resize with the milestone count.
    pub fn add_version(&mut self, version: ProposalVersion) {
        let milestones = version.milestone_count();
        self.versions.push(version);
        self.compliance = vec![false; milestones];
        self.claimed = vec![false; milestones];
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            ProposalState::Failed
                | ProposalState::Completed
                | ProposalState::Stopped
                | ProposalState::MigratedAway
        )
    }

    pub fn require_state(&self, expected: ProposalState) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(TreasuryError::WrongState { state: self.state })
        }
    }

    pub fn require_proposer(&self, caller: &str) -> Result<()> {
        if self.proposer == caller {
            Ok(())
        } else {
            Err(TreasuryError::NotProposer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn version(doc: &[u8]) -> ProposalVersion {
        ProposalVersion::new(DocHash::digest(doc), vec![100, 200], vec![10, 20], 5, 1_000).unwrap()
    }

    #[test]
    fn test_version_validation() {
        let doc = DocHash::digest(b"v");
        assert_eq!(
            ProposalVersion::new(doc, vec![], vec![], 5, 0),
            Err(TreasuryError::MismatchedMilestones)
        );
        assert_eq!(
            ProposalVersion::new(doc, vec![100], vec![10, 20], 5, 0),
            Err(TreasuryError::MismatchedMilestones)
        );
    }

    #[test]
    fn test_total_ask() {
        assert_eq!(version(b"v").total_ask(), 35);
    }

    #[test]
    fn test_add_version_resets_tracking() {
        let mut p = Proposal::new("alice".to_string(), version(b"v1"), 1_000);
        p.compliance[0] = true;
        let v2 = ProposalVersion::new(DocHash::digest(b"v2"), vec![100], vec![40], 5, 2_000).unwrap();
        p.add_version(v2);

        assert_eq!(p.versions.len(), 2);
        assert_eq!(p.latest_version().milestone_count(), 1);
        assert_eq!(p.compliance, vec![false]);
        // The id stays pinned to the first version's document.
        assert_eq!(p.id, DocHash::digest(b"v1"));
    }
}
