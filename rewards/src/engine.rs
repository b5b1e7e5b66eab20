//! The accrual engine
//!
//! Once per quarter, at the start of the Locking phase, a founder drives a
//! bounded-step pass over the whole participant set that totals the
//! effective stake of the quarter just ended and finalizes that quarter's
//! `QuarterInfo`. Individual balances are settled lazily on each
//! participant's next interaction. Every mutating stake operation for a
//! quarter is gated on that quarter being finalized, which freezes the
//! participant set under the pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cadence_core::{Address, DaoConfig, EpochClock, Phase, TokenBank, DAY};
use stake::{PointsBook, StakeLedger};

use crate::demurrage::demurrage_charge;
use crate::error::{Result, RewardsError};
use crate::formula::{effective_balance, pool_share, reputation_bonus, reputation_penalty};

/// Snapshot written exactly once at the transition into `quarter`.
///
/// The scaling constants are the ones the global pass used; the totals and
/// pool describe the quarter that just ended. Immutable once written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterInfo {
    pub quarter: u64,
    pub minimal_participation_point: u64,
    pub quarter_point_scaling_factor: u64,
    pub reputation_point_scaling_factor: u64,
    pub moderator_rewards_num: u64,
    pub moderator_rewards_den: u64,
    /// Total effective stake of the previous quarter, participant pool.
    pub total_effective_stake: u64,
    /// Total effective stake of the previous quarter, moderator pool.
    pub total_effective_moderator_stake: u64,
    /// Reward tokens distributable for the previous quarter.
    pub rewards_pool: u64,
    pub distribution_timestamp: u64,
    pub cumulative_distributed: u64,
}

/// Continuation of an incomplete global pass: the last processed address
/// plus the running totals, persisted between invocations. The scaling
/// constants are pinned at pass start so a mid-pass reconfiguration cannot
/// skew the totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccrualCursor {
    pub quarter: u64,
    pub last_processed: Option<Address>,
    pub total_effective_stake: u64,
    pub total_effective_moderator_stake: u64,
    minimal_participation_point: u64,
    quarter_point_scaling_factor: u64,
    reputation_point_scaling_factor: u64,
}

impl AccrualCursor {
    fn start(quarter: u64, config: &DaoConfig) -> Self {
        Self {
            quarter,
            last_processed: None,
            total_effective_stake: 0,
            total_effective_moderator_stake: 0,
            minimal_participation_point: config.minimal_participation_point,
            quarter_point_scaling_factor: config.quarter_point_scaling_factor,
            reputation_point_scaling_factor: config.reputation_point_scaling_factor,
        }
    }
}

/// Result of one bounded-step invocation of the global pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    InProgress { processed: usize },
    Completed,
}

impl BatchStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, BatchStatus::Completed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccrualEngine {
    /// Bank account the reward pool is held under.
    custodian: Address,
    quarters: BTreeMap<u64, QuarterInfo>,
    cursor: Option<AccrualCursor>,
    /// Deposits plus recovered demurrage not yet assigned to a quarter.
    pending_pool: u64,
}

impl AccrualEngine {
    pub fn new(custodian: Address) -> Self {
        Self {
            custodian,
            quarters: BTreeMap::new(),
            cursor: None,
            pending_pool: 0,
        }
    }

    /// Feed previously approved reward tokens into the undistributed pool.
    pub fn deposit_rewards(&mut self, bank: &mut dyn TokenBank, from: &str, amount: u64) -> Result<()> {
        bank.transfer_from(from, &self.custodian, amount)?;
        self.pending_pool += amount;
        Ok(())
    }

    /// One bounded-step invocation of the global accrual for the current
    /// quarter. Founder-gated by the caller; legal only in the Locking
    /// phase. Processes up to `chunk_size` participants, persists the
    /// cursor, and finalizes `QuarterInfo` exactly once when the pass
    /// covers the whole set. Idempotent after completion.
    pub fn process_quarter_transition(
        &mut self,
        ledger: &StakeLedger,
        points: &PointsBook,
        config: &DaoConfig,
        clock: &EpochClock,
        now: u64,
        chunk_size: usize,
    ) -> Result<BatchStatus> {
        clock.require_phase(now, Phase::Locking)?;
        let quarter = clock.current_quarter(now)?;
        if quarter <= 1 {
            return Err(RewardsError::FirstQuarter);
        }
        if self.quarters.contains_key(&quarter) {
            return Ok(BatchStatus::Completed);
        }

        let mut cursor = match self.cursor.take() {
            Some(c) if c.quarter == quarter => c,
            Some(c) => {
                // A pass abandoned at an earlier boundary; its totals were
                // never finalized and cannot be reused.
                log::warn!("discarding stale accrual cursor for quarter {}", c.quarter);
                AccrualCursor::start(quarter, config)
            }
            None => AccrualCursor::start(quarter, config),
        };

        let prev = quarter - 1;
        let chunk = ledger.participants_after(cursor.last_processed.as_deref(), chunk_size.max(1));
        for p in &chunk {
            let stake = if p.stake_quarter == prev {
                p.effective_stake
            } else {
                p.locked_stake
            };
            let qp = points.quarter_points(&p.address, prev);
            cursor.total_effective_stake += effective_balance(
                cursor.minimal_participation_point,
                cursor.quarter_point_scaling_factor,
                cursor.reputation_point_scaling_factor,
                qp,
                p.reputation,
                stake,
            );
            let mqp = points.moderator_points(&p.address, prev);
            if mqp > 0 {
                cursor.total_effective_moderator_stake += effective_balance(
                    cursor.minimal_participation_point,
                    cursor.quarter_point_scaling_factor,
                    cursor.reputation_point_scaling_factor,
                    mqp,
                    p.reputation,
                    stake,
                );
            }
            cursor.last_processed = Some(p.address.clone());
        }
        let processed = chunk.len();

        if !ledger.participants_after(cursor.last_processed.as_deref(), 1).is_empty() {
            self.cursor = Some(cursor);
            return Ok(BatchStatus::InProgress { processed });
        }

        let cumulative = self
            .quarters
            .values()
            .next_back()
            .map(|info| info.cumulative_distributed)
            .unwrap_or(0);
        let pool = self.pending_pool;
        self.pending_pool = 0;
        let info = QuarterInfo {
            quarter,
            minimal_participation_point: cursor.minimal_participation_point,
            quarter_point_scaling_factor: cursor.quarter_point_scaling_factor,
            reputation_point_scaling_factor: cursor.reputation_point_scaling_factor,
            moderator_rewards_num: config.moderator_rewards_num,
            moderator_rewards_den: config.moderator_rewards_den,
            total_effective_stake: cursor.total_effective_stake,
            total_effective_moderator_stake: cursor.total_effective_moderator_stake,
            rewards_pool: pool,
            distribution_timestamp: now,
            cumulative_distributed: cumulative + pool,
        };
        self.quarters.insert(quarter, info);
        log::info!(
            "quarter {} started: pool {}, effective stake {} ({} moderator)",
            quarter,
            pool,
            info.total_effective_stake,
            info.total_effective_moderator_stake,
        );
        Ok(BatchStatus::Completed)
    }

    /// Whether dependent operations may run for `quarter`. The first
    /// quarter has no prior boundary and is always ready.
    pub fn is_quarter_ready(&self, quarter: u64) -> bool {
        quarter <= 1 || self.quarters.contains_key(&quarter)
    }

    /// Gate consulted before any settlement or stake mutation: rejected
    /// with `AlreadyInProgress` while a pass for `quarter` is incomplete,
    /// and with `RewardsNotReady` before one has started.
    pub fn ensure_ready(&self, quarter: u64) -> Result<()> {
        if let Some(cursor) = &self.cursor {
            if cursor.quarter == quarter {
                return Err(RewardsError::AlreadyInProgress);
            }
        }
        if !self.is_quarter_ready(quarter) {
            return Err(RewardsError::RewardsNotReady { quarter });
        }
        Ok(())
    }

    /// Settle a participant's reputation and rewards through the end of
    /// the previous quarter. Idempotent; must run before any stake
    /// mutation so settlement sees the stake the finalized totals used.
    pub fn settle_participant(
        &mut self,
        ledger: &mut StakeLedger,
        points: &PointsBook,
        config: &DaoConfig,
        addr: &str,
        current_quarter: u64,
    ) -> Result<()> {
        self.ensure_ready(current_quarter)?;
        if current_quarter <= 1 {
            return Ok(());
        }
        let target = current_quarter - 1;
        let p = ledger.participant_mut(addr)?;
        let last_q = p.last_participated_quarter;
        // The reputation value the finalized totals were computed with;
        // reward shares must use it even though the deltas below may move
        // the live value first.
        let reputation_at_pass = p.reputation;

        if p.last_quarter_reputation_updated < target {
            // Point-based delta for the last quarter actually participated.
            if last_q >= 1 && last_q <= target && p.last_quarter_reputation_updated < last_q {
                let qp = points.quarter_points(addr, last_q);
                let min_pp = config.minimal_participation_point;
                if qp >= min_pp {
                    p.reputation += reputation_bonus(
                        qp,
                        min_pp,
                        config.reputation_per_extra_point_num,
                        config.reputation_per_extra_point_den,
                    );
                } else {
                    p.reputation = p
                        .reputation
                        .saturating_sub(reputation_penalty(qp, min_pp, config.max_reputation_deduction));
                }
                p.last_quarter_reputation_updated = last_q;
            }
            // Flat penalty per fully skipped quarter after that.
            let missed = target.saturating_sub(p.last_quarter_reputation_updated);
            if missed > 0 {
                let per_quarter = config.max_reputation_deduction + config.punishment_for_not_locking;
                p.reputation = p.reputation.saturating_sub(missed * per_quarter);
            }
            p.last_quarter_reputation_updated = target;
        }

        if p.last_quarter_rewards_updated < target {
            if last_q >= 1 && last_q <= target && p.last_quarter_rewards_updated < last_q {
                // Totals for quarter `last_q` were finalized at the
                // transition into the quarter after it.
                if let Some(info) = self.quarters.get(&(last_q + 1)).copied() {
                    let qp = points.quarter_points(addr, last_q);
                    let stake = if p.stake_quarter == last_q {
                        p.effective_stake
                    } else {
                        p.locked_stake
                    };
                    let effective = effective_balance(
                        info.minimal_participation_point,
                        info.quarter_point_scaling_factor,
                        info.reputation_point_scaling_factor,
                        qp,
                        reputation_at_pass,
                        stake,
                    );
                    let participant_portion = info.moderator_rewards_den - info.moderator_rewards_num;
                    let mut delta = pool_share(
                        effective,
                        info.rewards_pool,
                        participant_portion,
                        info.moderator_rewards_den,
                        info.total_effective_stake,
                    );
                    let mqp = points.moderator_points(addr, last_q);
                    if mqp > 0 {
                        let moderator_effective = effective_balance(
                            info.minimal_participation_point,
                            info.quarter_point_scaling_factor,
                            info.reputation_point_scaling_factor,
                            mqp,
                            reputation_at_pass,
                            stake,
                        );
                        delta += pool_share(
                            moderator_effective,
                            info.rewards_pool,
                            info.moderator_rewards_num,
                            info.moderator_rewards_den,
                            info.total_effective_moderator_stake,
                        );
                    }
                    p.claimable_reward += delta;
                }
            }
            p.last_quarter_rewards_updated = target;
        }

        // The reputation deltas may have crossed the moderator bar.
        ledger.refresh_moderator_status(addr, current_quarter, config);
        Ok(())
    }

    /// Settle, charge demurrage for the days since the last distribution,
    /// pay out the remainder and recover the charge into the pool.
    #[allow(clippy::too_many_arguments)]
    pub fn claim_rewards(
        &mut self,
        ledger: &mut StakeLedger,
        points: &PointsBook,
        bank: &mut dyn TokenBank,
        config: &DaoConfig,
        addr: &str,
        current_quarter: u64,
        now: u64,
    ) -> Result<u64> {
        self.settle_participant(ledger, points, config, addr, current_quarter)?;
        let last_distribution = self
            .quarters
            .values()
            .next_back()
            .map(|info| info.distribution_timestamp)
            .unwrap_or(now);
        let p = ledger.participant_mut(addr)?;
        let balance = p.claimable_reward;
        if balance == 0 {
            return Err(RewardsError::NothingToClaim);
        }
        let days = now.saturating_sub(last_distribution) / DAY;
        let charge = demurrage_charge(balance, days, config.demurrage_rate_num, config.demurrage_rate_den);
        let payout = balance - charge;
        bank.transfer(&self.custodian, addr, payout)?;
        p.claimable_reward = 0;
        self.pending_pool += charge;
        Ok(payout)
    }

    /// Settle any missed quarters, then register continued participation
    /// for the current quarter with the updated reputation.
    pub fn confirm_continued_participation(
        &mut self,
        ledger: &mut StakeLedger,
        points: &PointsBook,
        config: &DaoConfig,
        clock: &EpochClock,
        addr: &str,
        now: u64,
    ) -> Result<()> {
        clock.require_phase(now, Phase::Locking)?;
        let quarter = clock.current_quarter(now)?;
        self.settle_participant(ledger, points, config, addr, quarter)?;
        ledger.confirm_participation(addr, quarter, config)?;
        Ok(())
    }

    /// Redeem a founding badge for a one-time reputation grant. The badge
    /// itself is taken into custody by the host before this is called.
    pub fn redeem_badge(
        &mut self,
        ledger: &mut StakeLedger,
        points: &PointsBook,
        config: &DaoConfig,
        clock: &EpochClock,
        addr: &str,
        now: u64,
    ) -> Result<()> {
        let quarter = clock.current_quarter(now)?;
        self.settle_participant(ledger, points, config, addr, quarter)?;
        let p = ledger.participant_mut(addr)?;
        if p.badge_redeemed {
            return Err(RewardsError::BadgeAlreadyRedeemed);
        }
        p.badge_redeemed = true;
        p.reputation += config.badge_reputation_bonus;
        ledger.refresh_moderator_status(addr, quarter, config);
        Ok(())
    }

    pub fn quarter_info(&self, quarter: u64) -> Option<&QuarterInfo> {
        self.quarters.get(&quarter)
    }

    pub fn cursor(&self) -> Option<&AccrualCursor> {
        self.cursor.as_ref()
    }

    pub fn pending_pool(&self) -> u64 {
        self.pending_pool
    }
}
