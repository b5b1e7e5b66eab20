//! Accrual arithmetic
//!
//! Pure integer functions shared by the global pass and per-user
//! settlement. Everything floors; intermediates run in `u128` so stakes
//! near the `u64` range cannot overflow.

/// Stake contribution to the reward and quorum calculations after applying
/// participation- and reputation-based scaling.
///
/// Participation below the floor degrades the base linearly
/// (`stake * quarter_point / min_participation`); above the floor the full
/// stake counts and extra points and reputation scale it up:
///
/// ```text
/// effective = base * (qp_scale + qp - min_pp) * (rp_scale + reputation)
///                  / (qp_scale * rp_scale)
/// ```
pub fn effective_balance(
    min_participation: u64,
    qp_scale: u64,
    rp_scale: u64,
    quarter_point: u64,
    reputation: u64,
    stake: u64,
) -> u64 {
    if min_participation == 0 || qp_scale == 0 || rp_scale == 0 {
        return 0;
    }
    let base = if quarter_point > min_participation {
        stake as u128
    } else {
        stake as u128 * quarter_point as u128 / min_participation as u128
    };
    let participation_scale =
        (qp_scale as u128 + quarter_point as u128).saturating_sub(min_participation as u128);
    let reputation_scale = rp_scale as u128 + reputation as u128;
    (base * participation_scale * reputation_scale / (qp_scale as u128 * rp_scale as u128)) as u64
}

/// One participant's share of a reward pool portion:
/// `effective * pool * portion_num / (total_effective * portion_den)`,
/// floored. Zero when nothing was effective that quarter.
pub fn pool_share(
    effective: u64,
    pool: u64,
    portion_num: u64,
    portion_den: u64,
    total_effective: u64,
) -> u64 {
    if total_effective == 0 || portion_den == 0 {
        return 0;
    }
    (effective as u128 * pool as u128 * portion_num as u128
        / (total_effective as u128 * portion_den as u128)) as u64
}

/// Reputation earned for clearing the participation floor by
/// `quarter_point - min_participation` points.
pub fn reputation_bonus(quarter_point: u64, min_participation: u64, num: u64, den: u64) -> u64 {
    if den == 0 {
        return 0;
    }
    (quarter_point.saturating_sub(min_participation) as u128 * num as u128 / den as u128) as u64
}

/// Reputation lost for finishing `quarter_point` points under the floor.
pub fn reputation_penalty(quarter_point: u64, min_participation: u64, max_deduction: u64) -> u64 {
    if min_participation == 0 {
        return 0;
    }
    ((min_participation - quarter_point) as u128 * max_deduction as u128
        / min_participation as u128) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN_PP: u64 = 2;
    const QP_SCALE: u64 = 400;
    const RP_SCALE: u64 = 2000;

    #[test]
    fn test_zero_points_zero_contribution() {
        assert_eq!(effective_balance(MIN_PP, QP_SCALE, RP_SCALE, 0, 500, 1_000_000), 0);
    }

    #[test]
    fn test_below_floor_degrades_but_does_not_discard() {
        let full = effective_balance(MIN_PP, QP_SCALE, RP_SCALE, MIN_PP, 0, 1_000_000);
        let half = effective_balance(MIN_PP, QP_SCALE, RP_SCALE, 1, 0, 1_000_000);
        assert!(half > 0);
        assert!(half < full);
    }

    #[test]
    fn test_at_floor_with_neutral_reputation() {
        // base = stake, participation scale = qp_scale, so the result is
        // stake * (rp_scale + rep) / rp_scale.
        let stake = 1_000_000;
        assert_eq!(
            effective_balance(MIN_PP, QP_SCALE, RP_SCALE, MIN_PP, 0, stake),
            stake
        );
        assert_eq!(
            effective_balance(MIN_PP, QP_SCALE, RP_SCALE, MIN_PP, RP_SCALE, stake),
            2 * stake
        );
    }

    #[test]
    fn test_monotonic_in_points_and_reputation() {
        let stake = 5_000_000;
        let mut last = 0;
        for qp in 0..50 {
            let e = effective_balance(MIN_PP, QP_SCALE, RP_SCALE, qp, 100, stake);
            assert!(e >= last);
            last = e;
        }
        let low_rep = effective_balance(MIN_PP, QP_SCALE, RP_SCALE, 5, 10, stake);
        let high_rep = effective_balance(MIN_PP, QP_SCALE, RP_SCALE, 5, 1_000, stake);
        assert!(high_rep > low_rep);
    }

    #[test]
    fn test_no_overflow_at_extremes() {
        let e = effective_balance(MIN_PP, QP_SCALE, RP_SCALE, 10_000, 1_000_000, u64::MAX / 4);
        assert!(e > 0);
    }

    #[test]
    fn test_pool_share_rounds_down() {
        // 3 equal participants over a pool of 100: each gets 33.
        assert_eq!(pool_share(1, 100, 1, 1, 3), 33);
        assert_eq!(pool_share(0, 100, 1, 1, 3), 0);
        assert_eq!(pool_share(1, 100, 1, 1, 0), 0);
    }

    #[test]
    fn test_reputation_deltas() {
        // Two points over the floor at 1/1.
        assert_eq!(reputation_bonus(4, MIN_PP, 1, 1), 2);
        // Zero points under a floor of 2 loses the full deduction.
        assert_eq!(reputation_penalty(0, MIN_PP, 20), 20);
        // One point under loses half.
        assert_eq!(reputation_penalty(1, MIN_PP, 20), 10);
    }
}
