//! Cadence DAO
//!
//! The composition root. `Dao` owns the clock anchor, configuration, role
//! registry, token banks and the four managers, and funnels every
//! state-mutating operation through one capability check plus the phase and
//! rewards-readiness gates. Hosts with external asset custody can use the
//! component crates directly; this facade is the single-process wiring.

pub mod error;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use cadence_core::{
    require_role, CoreError, DaoConfig, DocHash, EpochClock, MemoryBank, ParamUpdate, Phase, Role,
    RoleTable,
};
use governance::{RoundResult, Salt, VotingManager};
use rewards::{AccrualEngine, BatchStatus, QuarterInfo};
use stake::{Participant, PointsBook, QuarterTotals, StakeLedger};
use treasury::{FundingManager, Proposal};

pub use error::{DaoError, Result};

/// Bank account locked stake is held under.
pub const STAKE_VAULT: &str = "dao:stake-vault";
/// Bank account the reward pool is held under.
pub const REWARD_VAULT: &str = "dao:reward-vault";
/// Bank account the treasury is held under.
pub const TREASURY: &str = "dao:treasury";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dao {
    config: DaoConfig,
    start_of_first_quarter: Option<u64>,
    roles: RoleTable,
    /// Stake-token custody.
    stake_bank: MemoryBank,
    /// Reward-token custody; the treasury account lives here too.
    reward_bank: MemoryBank,
    ledger: StakeLedger,
    points: PointsBook,
    votes: VotingManager,
    engine: AccrualEngine,
    funding: FundingManager,
    /// Addresses cleared by a KYC admin to receive funding.
    kyc_approved: HashSet<String>,
}

impl Dao {
    pub fn new(roles: RoleTable) -> Self {
        Self {
            config: DaoConfig::default(),
            start_of_first_quarter: None,
            roles,
            stake_bank: MemoryBank::new(),
            reward_bank: MemoryBank::new(),
            ledger: StakeLedger::new(STAKE_VAULT.to_string()),
            points: PointsBook::new(),
            votes: VotingManager::new(),
            engine: AccrualEngine::new(REWARD_VAULT.to_string()),
            funding: FundingManager::new(TREASURY.to_string()),
            kyc_approved: HashSet::new(),
        }
    }

    // ---- configuration -------------------------------------------------

    /// Anchor the calendar. Founder-only, set once, immutable thereafter.
    pub fn set_start_of_first_quarter(&mut self, caller: &str, start: u64) -> Result<()> {
        require_role(&self.roles, caller, Role::Founder)?;
        if self.start_of_first_quarter.is_some() {
            return Err(DaoError::AlreadyStarted);
        }
        self.start_of_first_quarter = Some(start);
        Ok(())
    }

    pub fn clock(&self) -> Result<EpochClock> {
        let start = self.start_of_first_quarter.ok_or(CoreError::NotStarted)?;
        Ok(self.config.clock(start))
    }

    pub fn current_quarter(&self, now: u64) -> Result<u64> {
        Ok(self.clock()?.current_quarter(now)?)
    }

    pub fn current_phase(&self, now: u64) -> Result<Phase> {
        Ok(self.clock()?.current_phase(now)?)
    }

    // ---- stake ---------------------------------------------------------

    /// Lock previously approved stake. Settles any pending quarters first
    /// so the accrual never sees a stake mutation it has not accounted.
    pub fn lock_stake(&mut self, caller: &str, amount: u64, now: u64) -> Result<()> {
        let clock = self.clock()?;
        let quarter = clock.current_quarter(now)?;
        self.settle_if_known(caller, quarter)?;
        self.engine.ensure_ready(quarter)?;
        self.ledger
            .lock_stake(&mut self.stake_bank, caller, amount, &clock, &self.config, now)?;
        Ok(())
    }

    /// Withdraw stake during the Locking phase.
    pub fn withdraw_stake(&mut self, caller: &str, amount: u64, now: u64) -> Result<()> {
        let clock = self.clock()?;
        let quarter = clock.current_quarter(now)?;
        self.settle_if_known(caller, quarter)?;
        self.engine.ensure_ready(quarter)?;
        self.ledger
            .withdraw_stake(&mut self.stake_bank, caller, amount, &clock, &self.config, now)?;
        Ok(())
    }

    /// Re-register for the current quarter, settling missed quarters first.
    pub fn confirm_participation(&mut self, caller: &str, now: u64) -> Result<()> {
        let clock = self.clock()?;
        self.engine.confirm_continued_participation(
            &mut self.ledger,
            &self.points,
            &self.config,
            &clock,
            caller,
            now,
        )?;
        Ok(())
    }

    // ---- rewards -------------------------------------------------------

    /// One bounded-step invocation of the quarterly global accrual.
    pub fn process_quarter_transition(
        &mut self,
        caller: &str,
        now: u64,
        chunk_size: usize,
    ) -> Result<BatchStatus> {
        require_role(&self.roles, caller, Role::Founder)?;
        let clock = self.clock()?;
        Ok(self.engine.process_quarter_transition(
            &self.ledger,
            &self.points,
            &self.config,
            &clock,
            now,
            chunk_size,
        )?)
    }

    /// Feed approved reward tokens into the next quarter's pool.
    pub fn deposit_rewards(&mut self, caller: &str, amount: u64) -> Result<()> {
        self.engine
            .deposit_rewards(&mut self.reward_bank, caller, amount)?;
        Ok(())
    }

    /// Claim accrued rewards net of demurrage.
    pub fn claim_rewards(&mut self, caller: &str, now: u64) -> Result<u64> {
        self.ensure_not_migrated()?;
        let quarter = self.current_quarter(now)?;
        Ok(self.engine.claim_rewards(
            &mut self.ledger,
            &self.points,
            &mut self.reward_bank,
            &self.config,
            caller,
            quarter,
            now,
        )?)
    }

    /// Redeem a founding badge for its one-time reputation grant.
    pub fn redeem_badge(&mut self, caller: &str, now: u64) -> Result<()> {
        let clock = self.clock()?;
        self.engine.redeem_badge(
            &mut self.ledger,
            &self.points,
            &self.config,
            &clock,
            caller,
            now,
        )?;
        Ok(())
    }

    // ---- proposals -----------------------------------------------------

    /// Submit a preproposal. Main phase, participants only.
    #[allow(clippy::too_many_arguments)]
    pub fn create_proposal(
        &mut self,
        caller: &str,
        doc: DocHash,
        milestone_durations: Vec<u64>,
        milestone_fundings: Vec<u64>,
        final_reward: u64,
        now: u64,
    ) -> Result<()> {
        self.require_main_phase_participant(caller, now)?;
        self.funding.create_proposal(
            &self.reward_bank,
            doc,
            caller,
            milestone_durations,
            milestone_fundings,
            final_reward,
            now,
        )?;
        Ok(())
    }

    /// Revise a preproposal or an endorsed proposal whose draft vote has
    /// not opened (or failed).
    #[allow(clippy::too_many_arguments)]
    pub fn modify_proposal(
        &mut self,
        caller: &str,
        id: DocHash,
        doc: DocHash,
        milestone_durations: Vec<u64>,
        milestone_fundings: Vec<u64>,
        final_reward: u64,
        now: u64,
    ) -> Result<()> {
        self.require_main_phase_participant(caller, now)?;
        self.funding.modify_proposal(
            &self.reward_bank,
            id,
            caller,
            doc,
            milestone_durations,
            milestone_fundings,
            final_reward,
            now,
        )?;
        Ok(())
    }

    /// Moderator endorsement.
    pub fn endorse_proposal(&mut self, caller: &str, id: DocHash, now: u64) -> Result<()> {
        let clock = self.clock()?;
        clock.require_phase(now, Phase::Main)?;
        let quarter = clock.current_quarter(now)?;
        if !self.ledger.is_moderator(caller, quarter, &self.config) {
            return Err(governance::VoteError::NotEligible.into());
        }
        self.funding.endorse(id, caller)?;
        Ok(())
    }

    /// Open draft voting on the latest version.
    pub fn finalize_proposal(&mut self, caller: &str, id: DocHash, now: u64) -> Result<()> {
        self.clock()?.require_phase(now, Phase::Main)?;
        self.funding
            .finalize(&mut self.votes, id, caller, &self.config, now)?;
        Ok(())
    }

    /// Moderator draft vote.
    pub fn draft_vote(&mut self, caller: &str, id: DocHash, choice: bool, now: u64) -> Result<()> {
        let quarter = self.current_quarter(now)?;
        self.votes.draft_vote(
            &self.ledger,
            &mut self.points,
            &self.config,
            id,
            caller,
            choice,
            quarter,
            now,
        )?;
        Ok(())
    }

    pub fn claim_draft_result(&mut self, caller: &str, id: DocHash, now: u64) -> Result<RoundResult> {
        let quarter = self.current_quarter(now)?;
        let totals = self.ledger.totals_for(quarter);
        Ok(self.funding.claim_draft_result(
            &mut self.votes,
            &self.reward_bank,
            id,
            caller,
            totals.moderator_stake,
            &self.config,
            now,
        )?)
    }

    /// Commit a milestone/interim vote.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_vote(
        &mut self,
        caller: &str,
        id: DocHash,
        round: usize,
        hash: [u8; 32],
        nonce: u64,
        now: u64,
    ) -> Result<()> {
        let quarter = self.current_quarter(now)?;
        self.votes.commit_vote(
            &self.ledger,
            &self.config,
            id,
            round,
            caller,
            hash,
            nonce,
            quarter,
            now,
        )?;
        Ok(())
    }

    /// Reveal a milestone/interim vote.
    #[allow(clippy::too_many_arguments)]
    pub fn reveal_vote(
        &mut self,
        caller: &str,
        id: DocHash,
        round: usize,
        choice: bool,
        salt: &Salt,
        now: u64,
    ) -> Result<()> {
        let quarter = self.current_quarter(now)?;
        self.votes.reveal_vote(
            &mut self.points,
            &self.config,
            id,
            round,
            caller,
            choice,
            salt,
            quarter,
            now,
        )?;
        Ok(())
    }

    pub fn claim_voting_result(&mut self, caller: &str, id: DocHash, now: u64) -> Result<RoundResult> {
        let quarter = self.current_quarter(now)?;
        let totals = self.ledger.totals_for(quarter);
        Ok(self.funding.claim_voting_result(
            &mut self.votes,
            &self.reward_bank,
            id,
            caller,
            totals.participant_stake,
            &self.config,
            now,
        )?)
    }

    pub fn finish_milestone(&mut self, caller: &str, id: DocHash, now: u64) -> Result<()> {
        self.funding
            .finish_milestone(&mut self.votes, id, caller, &self.config, now)?;
        Ok(())
    }

    /// Release voted-through, PRL-cleared funding to a KYC-approved
    /// proposer.
    pub fn claim_funding(&mut self, caller: &str, id: DocHash) -> Result<u64> {
        if !self.kyc_approved.contains(caller) {
            return Err(DaoError::KycRequired);
        }
        Ok(self
            .funding
            .claim_funding(&mut self.reward_bank, id, caller)?)
    }

    // ---- compliance and migration --------------------------------------

    /// Clear or revoke an address for receiving funds.
    pub fn set_kyc_status(&mut self, caller: &str, addr: &str, approved: bool) -> Result<()> {
        require_role(&self.roles, caller, Role::KycAdmin)?;
        if approved {
            self.kyc_approved.insert(addr.to_string());
        } else {
            self.kyc_approved.remove(addr);
        }
        Ok(())
    }

    /// PRL compliance flag for one milestone.
    pub fn set_compliance(&mut self, caller: &str, id: DocHash, milestone: usize, cleared: bool) -> Result<()> {
        require_role(&self.roles, caller, Role::Prl)?;
        self.funding.set_compliance(id, milestone, cleared)?;
        Ok(())
    }

    /// Terminal PRL stop.
    pub fn prl_stop(&mut self, caller: &str, id: DocHash) -> Result<()> {
        require_role(&self.roles, caller, Role::Prl)?;
        self.funding.prl_stop(id)?;
        Ok(())
    }

    /// One-time, irreversible treasury hand-off to a successor.
    pub fn migrate_to_new_dao(&mut self, caller: &str, successor: &str) -> Result<u64> {
        require_role(&self.roles, caller, Role::Root)?;
        Ok(self
            .funding
            .migrate_to_new_dao(&mut self.reward_bank, successor)?)
    }

    // ---- special proposals ---------------------------------------------

    /// Founder-only policy proposal; its voting round opens immediately.
    pub fn create_special(
        &mut self,
        caller: &str,
        doc: DocHash,
        updates: Vec<ParamUpdate>,
        now: u64,
    ) -> Result<()> {
        require_role(&self.roles, caller, Role::Founder)?;
        self.clock()?.require_phase(now, Phase::Main)?;
        self.votes
            .create_special(doc, caller.to_string(), updates, now, &self.config)?;
        Ok(())
    }

    pub fn commit_special(
        &mut self,
        caller: &str,
        id: DocHash,
        hash: [u8; 32],
        nonce: u64,
        now: u64,
    ) -> Result<()> {
        let quarter = self.current_quarter(now)?;
        self.votes
            .commit_special(&self.ledger, &self.config, id, caller, hash, nonce, quarter, now)?;
        Ok(())
    }

    pub fn reveal_special(
        &mut self,
        caller: &str,
        id: DocHash,
        choice: bool,
        salt: &Salt,
        now: u64,
    ) -> Result<()> {
        let quarter = self.current_quarter(now)?;
        self.votes
            .reveal_special(&mut self.points, &self.config, id, caller, choice, salt, quarter, now)?;
        Ok(())
    }

    pub fn claim_special(&mut self, id: DocHash, now: u64) -> Result<RoundResult> {
        Ok(self
            .votes
            .claim_special(id, self.ledger.total_locked(), &self.config, now)?)
    }

    /// Apply a passed special proposal to the live configuration.
    pub fn apply_special(&mut self, id: DocHash) -> Result<()> {
        self.votes.apply_special(&mut self.config, id)?;
        Ok(())
    }

    // ---- queries and host wiring ---------------------------------------

    pub fn config(&self) -> &DaoConfig {
        &self.config
    }

    pub fn participant(&self, addr: &str) -> Option<&Participant> {
        self.ledger.participant(addr).ok()
    }

    pub fn proposal(&self, id: &DocHash) -> Option<&Proposal> {
        self.funding.proposal(id).ok()
    }

    pub fn quarter_info(&self, quarter: u64) -> Option<&QuarterInfo> {
        self.engine.quarter_info(quarter)
    }

    pub fn totals_for(&self, quarter: u64) -> QuarterTotals {
        self.ledger.totals_for(quarter)
    }

    pub fn treasury_balance(&self) -> u64 {
        self.funding.treasury_balance(&self.reward_bank)
    }

    pub fn votes(&self) -> &VotingManager {
        &self.votes
    }

    /// Stake-token bank, for host custody wiring (minting, allowances).
    pub fn stake_bank_mut(&mut self) -> &mut MemoryBank {
        &mut self.stake_bank
    }

    /// Reward-token bank; the treasury account lives here.
    pub fn reward_bank_mut(&mut self) -> &mut MemoryBank {
        &mut self.reward_bank
    }

    pub fn roles_mut(&mut self) -> &mut RoleTable {
        &mut self.roles
    }

    // ---- internal gates ------------------------------------------------

    fn settle_if_known(&mut self, addr: &str, quarter: u64) -> Result<()> {
        if self.ledger.participant(addr).is_ok() {
            self.engine
                .settle_participant(&mut self.ledger, &self.points, &self.config, addr, quarter)?;
        }
        Ok(())
    }

    fn require_main_phase_participant(&self, caller: &str, now: u64) -> Result<u64> {
        let clock = self.clock()?;
        clock.require_phase(now, Phase::Main)?;
        let quarter = clock.current_quarter(now)?;
        if !self.ledger.is_participant(caller, quarter, &self.config) {
            return Err(DaoError::NotParticipant);
        }
        Ok(quarter)
    }

    fn ensure_not_migrated(&self) -> Result<()> {
        if self.funding.migrated_to().is_some() {
            return Err(DaoError::Migrated);
        }
        Ok(())
    }
}
