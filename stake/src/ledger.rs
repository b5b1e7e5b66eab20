//! The stake ledger
//!
//! Holds every participant record in an ordered map (address order is what
//! the rewards batch cursor resumes over) plus per-quarter pool totals for
//! quorum math. Pool accounting follows a strict remove / mutate / re-add
//! sequence so the totals stay in sync with the records through promotions,
//! demotions and threshold crossings.

use std::collections::HashMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use cadence_core::{Address, DaoConfig, EpochClock, Phase, TokenBank};

use crate::error::{Result, StakeError};
use crate::participant::Participant;

/// Effective stake registered for one quarter, split into the participant
/// pool and its moderator subset. Moderator stake is included in both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterTotals {
    pub participant_stake: u64,
    pub moderator_stake: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakeLedger {
    /// Bank account stake is held under while locked.
    custodian: Address,
    participants: std::collections::BTreeMap<Address, Participant>,
    total_locked: u64,
    quarter_totals: HashMap<u64, QuarterTotals>,
}

impl StakeLedger {
    pub fn new(custodian: Address) -> Self {
        Self {
            custodian,
            participants: std::collections::BTreeMap::new(),
            total_locked: 0,
            quarter_totals: HashMap::new(),
        }
    }

    /// Lock `amount` of previously approved stake. Legal in either phase;
    /// stake locked during Main counts toward this quarter's pools prorated
    /// by the time left, while stake already held counts in full.
    pub fn lock_stake(
        &mut self,
        bank: &mut dyn TokenBank,
        addr: &str,
        amount: u64,
        clock: &EpochClock,
        config: &DaoConfig,
        now: u64,
    ) -> Result<()> {
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        let quarter = clock.current_quarter(now)?;
        let phase = clock.current_phase(now)?;
        bank.transfer_from(addr, &self.custodian, amount)?;

        self.pool_remove(addr, quarter, config);
        let p = self
            .participants
            .entry(addr.to_string())
            .or_insert_with(|| Participant::new(addr.to_string(), quarter));

        // Stake carried over from earlier quarters has been locked the whole
        // quarter so far and counts in full.
        if p.stake_quarter < quarter {
            p.effective_stake = p.locked_stake;
            p.stake_quarter = quarter;
        }
        let effective_add = match phase {
            Phase::Locking => amount,
            Phase::Main => prorate(amount, clock.time_left_in_quarter(now)?, config.quarter_duration),
        };
        p.locked_stake += amount;
        p.effective_stake += effective_add;
        self.total_locked += amount;

        if p.meets_participation_minimum(config) {
            p.last_participated_quarter = quarter;
        }
        self.refresh_flag_and_pool(addr, quarter, config);
        Ok(())
    }

    /// Withdraw locked stake. Locking phase only. Remaining stake keeps
    /// participating; dropping below a threshold demotes symmetrically with
    /// the lock path, using effective stake for the pool totals.
    pub fn withdraw_stake(
        &mut self,
        bank: &mut dyn TokenBank,
        addr: &str,
        amount: u64,
        clock: &EpochClock,
        config: &DaoConfig,
        now: u64,
    ) -> Result<()> {
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        clock.require_phase(now, Phase::Locking)?;
        let quarter = clock.current_quarter(now)?;
        {
            let p = self.participant(addr)?;
            if amount > p.locked_stake {
                return Err(StakeError::InsufficientStake {
                    requested: amount,
                    locked: p.locked_stake,
                });
            }
        }

        self.pool_remove(addr, quarter, config);
        let custodian = self.custodian.clone();
        if let Some(p) = self.participants.get_mut(addr) {
            p.locked_stake -= amount;
            // Within the locking phase effective stake tracks the locked amount.
            p.effective_stake = p.locked_stake;
            p.stake_quarter = quarter;
            if p.meets_participation_minimum(config) {
                p.last_participated_quarter = quarter;
            }
        }
        self.total_locked -= amount;
        self.refresh_flag_and_pool(addr, quarter, config);
        bank.transfer(&custodian, addr, amount)?;
        Ok(())
    }

    /// Register continued participation for `quarter`. The caller settles
    /// pending rewards and reputation first; this refreshes the effective
    /// stake to the full locked amount and re-evaluates moderator status
    /// with the updated reputation.
    pub fn confirm_participation(&mut self, addr: &str, quarter: u64, config: &DaoConfig) -> Result<()> {
        let p = self.participant(addr)?;
        if !p.meets_participation_minimum(config) {
            return Err(StakeError::BelowParticipationMinimum);
        }
        if p.last_participated_quarter == quarter {
            return Err(StakeError::AlreadyConfirmed(quarter));
        }
        self.pool_remove(addr, quarter, config);
        if let Some(p) = self.participants.get_mut(addr) {
            p.effective_stake = p.locked_stake;
            p.stake_quarter = quarter;
            p.last_participated_quarter = quarter;
        }
        self.refresh_flag_and_pool(addr, quarter, config);
        Ok(())
    }

    /// Re-evaluate moderator status after a reputation change, keeping this
    /// quarter's pool totals consistent.
    pub fn refresh_moderator_status(&mut self, addr: &str, quarter: u64, config: &DaoConfig) {
        self.pool_remove(addr, quarter, config);
        self.refresh_flag_and_pool(addr, quarter, config);
    }

    pub fn participant(&self, addr: &str) -> Result<&Participant> {
        self.participants
            .get(addr)
            .ok_or_else(|| StakeError::UnknownParticipant(addr.to_string()))
    }

    /// Mutable record access for the rewards engine. Callers that change
    /// reputation or stake-adjacent fields must follow up with
    /// [`refresh_moderator_status`](Self::refresh_moderator_status).
    pub fn participant_mut(&mut self, addr: &str) -> Result<&mut Participant> {
        self.participants
            .get_mut(addr)
            .ok_or_else(|| StakeError::UnknownParticipant(addr.to_string()))
    }

    pub fn is_participant(&self, addr: &str, quarter: u64, config: &DaoConfig) -> bool {
        self.participants
            .get(addr)
            .is_some_and(|p| p.participates_in(quarter, config))
    }

    pub fn is_moderator(&self, addr: &str, quarter: u64, config: &DaoConfig) -> bool {
        self.participants
            .get(addr)
            .is_some_and(|p| p.participates_in(quarter, config) && p.is_moderator)
    }

    /// Pool totals registered for `quarter`.
    pub fn totals_for(&self, quarter: u64) -> QuarterTotals {
        self.quarter_totals.get(&quarter).copied().unwrap_or_default()
    }

    pub fn total_locked(&self) -> u64 {
        self.total_locked
    }

    /// Number of participant records ever created.
    pub fn record_count(&self) -> usize {
        self.participants.len()
    }

    /// Up to `limit` records strictly after `cursor` in address order. The
    /// rewards batch job resumes its pass through this window.
    pub fn participants_after(&self, cursor: Option<&str>, limit: usize) -> Vec<&Participant> {
        let lower = match cursor {
            Some(c) => Bound::Excluded(c),
            None => Bound::Unbounded,
        };
        self.participants
            .range::<str, _>((lower, Bound::Unbounded))
            .take(limit)
            .map(|(_, p)| p)
            .collect()
    }

    fn pool_remove(&mut self, addr: &str, quarter: u64, config: &DaoConfig) {
        let Some(p) = self.participants.get(addr) else {
            return;
        };
        if !p.participates_in(quarter, config) {
            return;
        }
        let totals = self.quarter_totals.entry(quarter).or_default();
        totals.participant_stake -= p.effective_stake;
        if p.is_moderator {
            totals.moderator_stake -= p.effective_stake;
        }
    }

    fn refresh_flag_and_pool(&mut self, addr: &str, quarter: u64, config: &DaoConfig) {
        let Some(p) = self.participants.get_mut(addr) else {
            return;
        };
        p.is_moderator = p.qualifies_as_moderator(config);
        if !p.participates_in(quarter, config) {
            return;
        }
        let effective = p.effective_stake;
        let moderator = p.is_moderator;
        let totals = self.quarter_totals.entry(quarter).or_default();
        totals.participant_stake += effective;
        if moderator {
            totals.moderator_stake += effective;
        }
    }
}

fn prorate(amount: u64, time_left: u64, quarter_duration: u64) -> u64 {
    (amount as u128 * time_left as u128 / quarter_duration as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{MemoryBank, TOKEN_UNIT};

    const START: u64 = 1_000_000;

    fn setup() -> (StakeLedger, MemoryBank, EpochClock, DaoConfig) {
        let config = DaoConfig::default();
        let clock = config.clock(START);
        let ledger = StakeLedger::new("dao-vault".to_string());
        let mut bank = MemoryBank::new();
        for who in ["alice", "bob", "carol"] {
            bank.mint(who, 10_000 * TOKEN_UNIT);
            bank.approve(who, "dao-vault", 10_000 * TOKEN_UNIT);
        }
        (ledger, bank, clock, config)
    }

    #[test]
    fn test_lock_in_locking_phase_counts_in_full() {
        let (mut ledger, mut bank, clock, config) = setup();
        ledger
            .lock_stake(&mut bank, "alice", 5 * TOKEN_UNIT, &clock, &config, START)
            .unwrap();

        let p = ledger.participant("alice").unwrap();
        assert_eq!(p.locked_stake, 5 * TOKEN_UNIT);
        assert_eq!(p.effective_stake, 5 * TOKEN_UNIT);
        assert_eq!(p.last_participated_quarter, 1);
        assert_eq!(ledger.totals_for(1).participant_stake, 5 * TOKEN_UNIT);
        assert_eq!(bank.balance_of("dao-vault"), 5 * TOKEN_UNIT);
    }

    #[test]
    fn test_lock_in_main_phase_is_prorated() {
        let (mut ledger, mut bank, clock, config) = setup();
        // Lock with exactly half the quarter remaining.
        let now = START + config.quarter_duration / 2;
        ledger
            .lock_stake(&mut bank, "alice", 4 * TOKEN_UNIT, &clock, &config, now)
            .unwrap();

        let p = ledger.participant("alice").unwrap();
        assert_eq!(p.locked_stake, 4 * TOKEN_UNIT);
        assert_eq!(p.effective_stake, 2 * TOKEN_UNIT);
        assert_eq!(ledger.totals_for(1).participant_stake, 2 * TOKEN_UNIT);
    }

    #[test]
    fn test_zero_amount_rejected() {
        let (mut ledger, mut bank, clock, config) = setup();
        assert_eq!(
            ledger.lock_stake(&mut bank, "alice", 0, &clock, &config, START),
            Err(StakeError::ZeroAmount)
        );
    }

    #[test]
    fn test_lock_requires_allowance() {
        let (mut ledger, mut bank, clock, config) = setup();
        bank.approve("alice", "dao-vault", 0);
        let err = ledger
            .lock_stake(&mut bank, "alice", TOKEN_UNIT, &clock, &config, START)
            .unwrap_err();
        assert!(matches!(err, StakeError::Core(_)));
    }

    #[test]
    fn test_withdraw_only_in_locking_phase() {
        let (mut ledger, mut bank, clock, config) = setup();
        ledger
            .lock_stake(&mut bank, "alice", 5 * TOKEN_UNIT, &clock, &config, START)
            .unwrap();

        let main_phase = START + config.locking_phase_duration;
        let err = ledger
            .withdraw_stake(&mut bank, "alice", TOKEN_UNIT, &clock, &config, main_phase)
            .unwrap_err();
        assert!(matches!(err, StakeError::Core(_)));

        ledger
            .withdraw_stake(&mut bank, "alice", TOKEN_UNIT, &clock, &config, START + 1)
            .unwrap();
        assert_eq!(ledger.participant("alice").unwrap().locked_stake, 4 * TOKEN_UNIT);
        assert_eq!(ledger.totals_for(1).participant_stake, 4 * TOKEN_UNIT);
    }

    #[test]
    fn test_withdraw_more_than_locked_fails() {
        let (mut ledger, mut bank, clock, config) = setup();
        ledger
            .lock_stake(&mut bank, "alice", TOKEN_UNIT, &clock, &config, START)
            .unwrap();
        assert_eq!(
            ledger.withdraw_stake(&mut bank, "alice", 2 * TOKEN_UNIT, &clock, &config, START),
            Err(StakeError::InsufficientStake {
                requested: 2 * TOKEN_UNIT,
                locked: TOKEN_UNIT,
            })
        );
    }

    #[test]
    fn test_withdraw_below_minimum_unregisters() {
        let (mut ledger, mut bank, clock, config) = setup();
        ledger
            .lock_stake(&mut bank, "alice", TOKEN_UNIT, &clock, &config, START)
            .unwrap();
        ledger
            .withdraw_stake(&mut bank, "alice", TOKEN_UNIT / 2, &clock, &config, START)
            .unwrap();

        assert!(!ledger.is_participant("alice", 1, &config));
        assert_eq!(ledger.totals_for(1).participant_stake, 0);
        // Record survives with the remaining stake.
        assert_eq!(ledger.participant("alice").unwrap().locked_stake, TOKEN_UNIT / 2);
    }

    #[test]
    fn test_moderator_promotion_and_demotion() {
        let (mut ledger, mut bank, clock, config) = setup();
        ledger
            .lock_stake(&mut bank, "alice", config.moderator_min_stake, &clock, &config, START)
            .unwrap();
        // Stake alone is not enough.
        assert!(!ledger.is_moderator("alice", 1, &config));
        assert_eq!(ledger.totals_for(1).moderator_stake, 0);

        ledger.participant_mut("alice").unwrap().reputation = config.moderator_min_reputation;
        ledger.refresh_moderator_status("alice", 1, &config);
        assert!(ledger.is_moderator("alice", 1, &config));
        assert_eq!(ledger.totals_for(1).moderator_stake, config.moderator_min_stake);

        // Withdrawing below the bar demotes and clears the pool symmetrically.
        ledger
            .withdraw_stake(&mut bank, "alice", TOKEN_UNIT, &clock, &config, START)
            .unwrap();
        assert!(!ledger.is_moderator("alice", 1, &config));
        assert_eq!(ledger.totals_for(1).moderator_stake, 0);
        assert_eq!(
            ledger.totals_for(1).participant_stake,
            config.moderator_min_stake - TOKEN_UNIT
        );
    }

    #[test]
    fn test_confirm_participation_next_quarter() {
        let (mut ledger, mut bank, clock, config) = setup();
        let mid_q1 = START + config.quarter_duration / 2;
        ledger
            .lock_stake(&mut bank, "alice", 4 * TOKEN_UNIT, &clock, &config, mid_q1)
            .unwrap();
        assert_eq!(ledger.participant("alice").unwrap().effective_stake, 2 * TOKEN_UNIT);

        ledger.confirm_participation("alice", 2, &config).unwrap();
        let p = ledger.participant("alice").unwrap();
        // Effective stake refreshes to the full locked amount.
        assert_eq!(p.effective_stake, 4 * TOKEN_UNIT);
        assert_eq!(p.last_participated_quarter, 2);
        assert_eq!(ledger.totals_for(2).participant_stake, 4 * TOKEN_UNIT);

        assert_eq!(
            ledger.confirm_participation("alice", 2, &config),
            Err(StakeError::AlreadyConfirmed(2))
        );
    }

    #[test]
    fn test_carryover_stake_counts_in_full_on_new_quarter_lock() {
        let (mut ledger, mut bank, clock, config) = setup();
        let mid_q1 = START + config.quarter_duration / 2;
        ledger
            .lock_stake(&mut bank, "alice", 4 * TOKEN_UNIT, &clock, &config, mid_q1)
            .unwrap();

        // Locking more during quarter 2's main phase: old stake full, new prorated.
        let mid_q2 = START + config.quarter_duration + config.quarter_duration / 2;
        ledger
            .lock_stake(&mut bank, "alice", 2 * TOKEN_UNIT, &clock, &config, mid_q2)
            .unwrap();
        let p = ledger.participant("alice").unwrap();
        assert_eq!(p.locked_stake, 6 * TOKEN_UNIT);
        assert_eq!(p.effective_stake, 4 * TOKEN_UNIT + TOKEN_UNIT);
        assert_eq!(ledger.totals_for(2).participant_stake, 5 * TOKEN_UNIT);
    }

    #[test]
    fn test_participants_after_pages_in_address_order() {
        let (mut ledger, mut bank, clock, config) = setup();
        for who in ["alice", "bob", "carol"] {
            ledger
                .lock_stake(&mut bank, who, TOKEN_UNIT, &clock, &config, START)
                .unwrap();
        }

        let first = ledger.participants_after(None, 2);
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].address, "alice");
        assert_eq!(first[1].address, "bob");

        let rest = ledger.participants_after(Some("bob"), 2);
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].address, "carol");

        assert!(ledger.participants_after(Some("carol"), 2).is_empty());
    }
}
