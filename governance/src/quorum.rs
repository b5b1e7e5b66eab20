//! Quorum and quota calculation
//!
//! Pure functions; no state. Quorum scales with the size of the funding ask
//! relative to the treasury so large asks cannot pass on thin turnout.

/// Minimum participation (by weight) for a vote to be binding.
///
/// `total_stake * fixed_num / fixed_den` plus
/// `total_stake * amount_requested * scale_num / (treasury_balance * scale_den)`,
/// each term floored. The scaled term is zero when nothing is requested or
/// the treasury is empty.
#[allow(clippy::too_many_arguments)]
pub fn min_quorum(
    total_stake: u64,
    fixed_num: u64,
    fixed_den: u64,
    scale_num: u64,
    scale_den: u64,
    amount_requested: u64,
    treasury_balance: u64,
) -> u64 {
    let fixed = total_stake as u128 * fixed_num as u128 / fixed_den as u128;
    let scaled = if treasury_balance == 0 {
        0
    } else {
        total_stake as u128 * amount_requested as u128 * scale_num as u128
            / (treasury_balance as u128 * scale_den as u128)
    };
    (fixed + scaled) as u64
}

/// Strict-majority check above the configured ratio: passes only when
/// `for_votes / (for_votes + against_votes)` strictly exceeds `num / den`.
pub fn quota_pass(for_votes: u64, against_votes: u64, quota_num: u64, quota_den: u64) -> bool {
    for_votes as u128 * quota_den as u128
        > quota_num as u128 * (for_votes as u128 + against_votes as u128)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_quorum_fixed_term_only() {
        // 5% of 1000 with no ask.
        assert_eq!(min_quorum(1000, 5, 100, 25, 100, 0, 10_000), 50);
    }

    #[test]
    fn test_min_quorum_scales_with_ask() {
        // 5% fixed + 25% * ask/treasury.
        let small = min_quorum(1000, 5, 100, 25, 100, 1_000, 10_000);
        let large = min_quorum(1000, 5, 100, 25, 100, 8_000, 10_000);
        assert_eq!(small, 50 + 25);
        assert_eq!(large, 50 + 200);
    }

    #[test]
    fn test_min_quorum_monotonic_in_amount() {
        let mut last = 0;
        for ask in (0..=10_000).step_by(250) {
            let q = min_quorum(123_456, 5, 100, 35, 100, ask, 10_000);
            assert!(q >= last, "quorum decreased at ask {ask}");
            last = q;
        }
    }

    #[test]
    fn test_min_quorum_empty_treasury() {
        assert_eq!(min_quorum(1000, 5, 100, 25, 100, 500, 0), 50);
    }

    #[test]
    fn test_quota_exact_ratio_fails() {
        // Exactly half for a 1/2 quota: fails.
        assert!(!quota_pass(50, 50, 1, 2));
        // One vote over the line: passes.
        assert!(quota_pass(51, 49, 1, 2));
    }

    #[test]
    fn test_quota_exact_supermajority_boundary() {
        // 51/100 quota: exactly 51% fails, strictly above passes.
        assert!(!quota_pass(51, 49, 51, 100));
        assert!(quota_pass(52, 48, 51, 100));
    }

    #[test]
    fn test_quota_no_votes_fails() {
        assert!(!quota_pass(0, 0, 1, 2));
    }

    #[test]
    fn test_no_overflow_at_full_scale() {
        // Stakes near u64::MAX must not overflow the intermediate products.
        let q = min_quorum(u64::MAX, 5, 100, 35, 100, u64::MAX, u64::MAX);
        assert!(q > 0);
        assert!(quota_pass(u64::MAX / 2 + 1, u64::MAX / 2 - 1, 1, 2));
    }
}
