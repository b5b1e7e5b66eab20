//! The funding manager
//!
//! Drives proposals through endorsement, draft vetting and per-milestone
//! voting, releases funds behind the PRL compliance gate, and performs the
//! one-time migration to a successor DAO. Role and phase preconditions are
//! enforced by the composition layer; this manager owns the state machine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use cadence_core::{Address, DaoConfig, DocHash, TokenBank};
use governance::{RoundResult, VotingManager};

use crate::error::{Result, TreasuryError};
use crate::proposal::{Proposal, ProposalState, ProposalVersion};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingManager {
    /// Bank account the treasury is held under.
    treasury_account: Address,
    proposals: HashMap<DocHash, Proposal>,
    /// Proposal ids in creation order.
    order: Vec<DocHash>,
    migrated_to: Option<Address>,
}

impl FundingManager {
    pub fn new(treasury_account: Address) -> Self {
        Self {
            treasury_account,
            proposals: HashMap::new(),
            order: Vec::new(),
            migrated_to: None,
        }
    }

    /// Register a preproposal. The first version's document hash is the
    /// proposal id; the full ask must fit the treasury at submission time.
    #[allow(clippy::too_many_arguments)]
    pub fn create_proposal(
        &mut self,
        bank: &dyn TokenBank,
        doc: DocHash,
        proposer: &str,
        milestone_durations: Vec<u64>,
        milestone_fundings: Vec<u64>,
        final_reward: u64,
        now: u64,
    ) -> Result<()> {
        self.ensure_not_migrated()?;
        if self.proposals.contains_key(&doc) {
            return Err(TreasuryError::ProposalExists);
        }
        let version =
            ProposalVersion::new(doc, milestone_durations, milestone_fundings, final_reward, now)?;
        self.check_against_treasury(bank, version.total_ask())?;
        self.proposals
            .insert(doc, Proposal::new(proposer.to_string(), version, now));
        self.order.push(doc);
        Ok(())
    }

    /// Submit a revised plan. Allowed until draft voting opens (and again
    /// after a failed draft vote drops the proposal back to `Endorsed`).
    #[allow(clippy::too_many_arguments)]
    pub fn modify_proposal(
        &mut self,
        bank: &dyn TokenBank,
        id: DocHash,
        caller: &str,
        doc: DocHash,
        milestone_durations: Vec<u64>,
        milestone_fundings: Vec<u64>,
        final_reward: u64,
        now: u64,
    ) -> Result<()> {
        self.ensure_not_migrated()?;
        let version =
            ProposalVersion::new(doc, milestone_durations, milestone_fundings, final_reward, now)?;
        self.check_against_treasury(bank, version.total_ask())?;
        let proposal = self.proposal_mut(&id)?;
        proposal.require_proposer(caller)?;
        if !matches!(
            proposal.state,
            ProposalState::Preproposal | ProposalState::Endorsed
        ) {
            return Err(TreasuryError::WrongState {
                state: proposal.state,
            });
        }
        proposal.add_version(version);
        Ok(())
    }

    /// Moderator endorsement, once per proposal.
    pub fn endorse(&mut self, id: DocHash, endorser: &str) -> Result<()> {
        self.ensure_not_migrated()?;
        let proposal = self.proposal_mut(&id)?;
        if proposal.state != ProposalState::Preproposal {
            return Err(TreasuryError::AlreadyEndorsed);
        }
        proposal.endorser = Some(endorser.to_string());
        proposal.state = ProposalState::Endorsed;
        Ok(())
    }

    /// Open draft voting on the latest version.
    pub fn finalize(
        &mut self,
        votes: &mut VotingManager,
        id: DocHash,
        caller: &str,
        config: &DaoConfig,
        now: u64,
    ) -> Result<()> {
        self.ensure_not_migrated()?;
        let proposal = self.proposal_mut(&id)?;
        proposal.require_proposer(caller)?;
        proposal.require_state(ProposalState::Endorsed)?;
        votes.open_draft(id, now, config.draft_voting_duration)?;
        proposal.state = ProposalState::DraftVoting;
        Ok(())
    }

    /// Decide the draft vote. Passing vets the proposal and opens the
    /// first milestone's commit round; failing returns it to `Endorsed`
    /// for the proposer to modify and re-finalize.
    #[allow(clippy::too_many_arguments)]
    pub fn claim_draft_result(
        &mut self,
        votes: &mut VotingManager,
        bank: &dyn TokenBank,
        id: DocHash,
        caller: &str,
        total_moderator_stake: u64,
        config: &DaoConfig,
        now: u64,
    ) -> Result<RoundResult> {
        self.ensure_not_migrated()?;
        let treasury_balance = bank.balance_of(&self.treasury_account);
        let proposal = self.proposal_mut(&id)?;
        proposal.require_proposer(caller)?;
        proposal.require_state(ProposalState::DraftVoting)?;
        let amount = proposal.latest_version().total_ask();
        let result = votes.claim_draft(id, total_moderator_stake, amount, treasury_balance, config, now)?;
        if result.passed() {
            proposal.state = ProposalState::Vetted;
            votes.open_round(
                id,
                0,
                now,
                config.voting_commit_duration,
                config.voting_reveal_duration,
            )?;
        } else {
            proposal.state = ProposalState::Endorsed;
        }
        Ok(result)
    }

    /// Decide the open milestone or interim round. A pass makes the
    /// milestone's funds releasable (or completes the proposal after the
    /// final round); a fail abandons the remaining milestones.
    #[allow(clippy::too_many_arguments)]
    pub fn claim_voting_result(
        &mut self,
        votes: &mut VotingManager,
        bank: &dyn TokenBank,
        id: DocHash,
        caller: &str,
        total_participant_stake: u64,
        config: &DaoConfig,
        now: u64,
    ) -> Result<RoundResult> {
        self.ensure_not_migrated()?;
        let treasury_balance = bank.balance_of(&self.treasury_account);
        let proposal = self.proposal_mut(&id)?;
        proposal.require_proposer(caller)?;
        if !matches!(proposal.state, ProposalState::Vetted | ProposalState::Voting) {
            return Err(TreasuryError::WrongState {
                state: proposal.state,
            });
        }
        let round = match votes.round_count(&id) {
            0 => return Err(governance::VoteError::RoundNotFound.into()),
            n => n - 1,
        };
        let milestones = proposal.latest_version().milestone_count();
        let amount = if round < milestones {
            proposal.latest_version().milestone_fundings[round]
        } else {
            proposal.latest_version().final_reward
        };
        let result = votes.claim_round(id, round, total_participant_stake, amount, treasury_balance, config, now)?;
        if result.passed() {
            if round < milestones {
                proposal.current_milestone = round;
                proposal.state = ProposalState::Funded;
                log::info!("proposal {id}: milestone {round} funding of {amount} released");
            } else {
                proposal.state = ProposalState::Completed;
                log::info!("proposal {id}: completed, final reward {amount} releasable");
            }
        } else {
            proposal.state = ProposalState::Failed;
            log::info!("proposal {id}: round {round} failed, remaining milestones abandoned");
        }
        Ok(result)
    }

    /// Proposer attests the current milestone is done, opening the next
    /// interim round (the final one after the last milestone).
    pub fn finish_milestone(
        &mut self,
        votes: &mut VotingManager,
        id: DocHash,
        caller: &str,
        config: &DaoConfig,
        now: u64,
    ) -> Result<()> {
        self.ensure_not_migrated()?;
        let proposal = self.proposal_mut(&id)?;
        proposal.require_proposer(caller)?;
        proposal.require_state(ProposalState::Funded)?;
        votes.open_round(
            id,
            proposal.current_milestone + 1,
            now,
            config.interim_commit_duration,
            config.interim_reveal_duration,
        )?;
        proposal.state = ProposalState::Voting;
        Ok(())
    }

    /// PRL compliance flag for one milestone.
    pub fn set_compliance(&mut self, id: DocHash, milestone: usize, cleared: bool) -> Result<()> {
        let proposal = self.proposal_mut(&id)?;
        let slot = proposal
            .compliance
            .get_mut(milestone)
            .ok_or(TreasuryError::UnknownMilestone(milestone))?;
        *slot = cleared;
        Ok(())
    }

    /// Terminal PRL stop.
    pub fn prl_stop(&mut self, id: DocHash) -> Result<()> {
        let proposal = self.proposal_mut(&id)?;
        if proposal.is_terminal() {
            return Err(TreasuryError::WrongState {
                state: proposal.state,
            });
        }
        proposal.state = ProposalState::Stopped;
        log::warn!("proposal {id}: stopped by the PRL");
        Ok(())
    }

    /// Release the earliest voted-through, PRL-cleared, unclaimed
    /// milestone, or the final reward once completed. Each claim is
    /// capped at its own milestone amount no matter what else is pending.
    pub fn claim_funding(
        &mut self,
        bank: &mut dyn TokenBank,
        id: DocHash,
        caller: &str,
    ) -> Result<u64> {
        self.ensure_not_migrated()?;
        let treasury_account = self.treasury_account.clone();
        let proposal = self
            .proposals
            .get_mut(&id)
            .ok_or(TreasuryError::ProposalNotFound)?;
        proposal.require_proposer(caller)?;
        if !matches!(proposal.state, ProposalState::Funded | ProposalState::Completed) {
            return Err(TreasuryError::WrongState {
                state: proposal.state,
            });
        }
        let claimable_through = if proposal.state == ProposalState::Completed {
            proposal.latest_version().milestone_count()
        } else {
            proposal.current_milestone + 1
        };
        for milestone in 0..claimable_through {
            if proposal.claimed[milestone] {
                continue;
            }
            if !proposal.compliance[milestone] {
                return Err(TreasuryError::ComplianceNotSet);
            }
            let amount = proposal.latest_version().milestone_fundings[milestone];
            bank.transfer(&treasury_account, caller, amount)?;
            proposal.claimed[milestone] = true;
            return Ok(amount);
        }
        if proposal.state == ProposalState::Completed && !proposal.final_reward_claimed {
            let amount = proposal.latest_version().final_reward;
            bank.transfer(&treasury_account, caller, amount)?;
            proposal.final_reward_claimed = true;
            return Ok(amount);
        }
        Err(TreasuryError::AlreadyClaimed)
    }

    /// One-time, irreversible transfer of the undistributed treasury to a
    /// successor. Open proposals are left behind and every later claim
    /// fails with `Migrated`.
    pub fn migrate_to_new_dao(&mut self, bank: &mut dyn TokenBank, successor: &str) -> Result<u64> {
        self.ensure_not_migrated()?;
        let balance = bank.balance_of(&self.treasury_account);
        bank.transfer(&self.treasury_account, successor, balance)?;
        for proposal in self.proposals.values_mut() {
            if !proposal.is_terminal() {
                proposal.state = ProposalState::MigratedAway;
            }
        }
        self.migrated_to = Some(successor.to_string());
        log::warn!("treasury migrated: {balance} transferred to {successor}");
        Ok(balance)
    }

    pub fn proposal(&self, id: &DocHash) -> Result<&Proposal> {
        self.proposals.get(id).ok_or(TreasuryError::ProposalNotFound)
    }

    /// Proposal ids in creation order.
    pub fn proposal_ids(&self) -> &[DocHash] {
        &self.order
    }

    pub fn treasury_balance(&self, bank: &dyn TokenBank) -> u64 {
        bank.balance_of(&self.treasury_account)
    }

    pub fn migrated_to(&self) -> Option<&str> {
        self.migrated_to.as_deref()
    }

    fn proposal_mut(&mut self, id: &DocHash) -> Result<&mut Proposal> {
        self.proposals.get_mut(id).ok_or(TreasuryError::ProposalNotFound)
    }

    fn ensure_not_migrated(&self) -> Result<()> {
        if self.migrated_to.is_some() {
            return Err(TreasuryError::Migrated);
        }
        Ok(())
    }

    fn check_against_treasury(&self, bank: &dyn TokenBank, requested: u64) -> Result<()> {
        let available = bank.balance_of(&self.treasury_account);
        if requested > available {
            return Err(TreasuryError::ExceedsTreasury { requested, available });
        }
        Ok(())
    }
}
