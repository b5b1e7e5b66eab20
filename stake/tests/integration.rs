//! Integration tests for the stake ledger

use cadence_core::{DaoConfig, MemoryBank, TokenBank, TOKEN_UNIT};
use stake::{StakeError, StakeLedger};

const START: u64 = 1_704_067_200; // 2024-01-01

fn setup() -> (StakeLedger, MemoryBank, DaoConfig) {
    let config = DaoConfig::default();
    let mut bank = MemoryBank::new();
    bank.mint("staker", 1_000 * TOKEN_UNIT);
    bank.approve("staker", "vault", 1_000 * TOKEN_UNIT);
    (StakeLedger::new("vault".to_string()), bank, config)
}

#[test]
fn test_withdraw_during_main_phase_always_wrong_phase() {
    let (mut ledger, mut bank, config) = setup();
    let clock = config.clock(START);
    ledger
        .lock_stake(&mut bank, "staker", 10 * TOKEN_UNIT, &clock, &config, START)
        .unwrap();

    // Sweep the whole main phase of two quarters: withdrawal never succeeds.
    for offset in [
        config.locking_phase_duration,
        config.quarter_duration / 2,
        config.quarter_duration - 1,
        config.quarter_duration + config.locking_phase_duration,
    ] {
        let result = ledger.withdraw_stake(&mut bank, "staker", TOKEN_UNIT, &clock, &config, START + offset);
        assert!(
            matches!(result, Err(StakeError::Core(_))),
            "withdraw succeeded at offset {offset}"
        );
    }
    assert_eq!(ledger.participant("staker").unwrap().locked_stake, 10 * TOKEN_UNIT);
}

#[test]
fn test_lock_succeeds_in_both_phases_with_different_effective_amounts() {
    let (mut ledger, mut bank, config) = setup();
    let clock = config.clock(START);

    ledger
        .lock_stake(&mut bank, "staker", 2 * TOKEN_UNIT, &clock, &config, START)
        .unwrap();
    assert_eq!(ledger.participant("staker").unwrap().effective_stake, 2 * TOKEN_UNIT);

    // Main phase with a third of the quarter left.
    let now = START + config.quarter_duration - config.quarter_duration / 3;
    ledger
        .lock_stake(&mut bank, "staker", 3 * TOKEN_UNIT, &clock, &config, now)
        .unwrap();
    let p = ledger.participant("staker").unwrap();
    assert_eq!(p.locked_stake, 5 * TOKEN_UNIT);
    assert_eq!(p.effective_stake, 2 * TOKEN_UNIT + TOKEN_UNIT);
}

#[test]
fn test_full_withdrawal_zeroes_but_keeps_record() {
    let (mut ledger, mut bank, config) = setup();
    let clock = config.clock(START);
    ledger
        .lock_stake(&mut bank, "staker", 10 * TOKEN_UNIT, &clock, &config, START)
        .unwrap();
    ledger
        .withdraw_stake(&mut bank, "staker", 10 * TOKEN_UNIT, &clock, &config, START + 1)
        .unwrap();

    let p = ledger.participant("staker").unwrap();
    assert_eq!(p.locked_stake, 0);
    assert_eq!(p.effective_stake, 0);
    assert_eq!(ledger.total_locked(), 0);
    assert_eq!(bank.balance_of("staker"), 1_000 * TOKEN_UNIT);
}
