//! Integration tests for the voting protocol against a live stake ledger

use cadence_core::{DaoConfig, DocHash, MemoryBank, ParamKey, ParamUpdate, TokenBank, TOKEN_UNIT};
use governance::{commitment, RoundOutcome, Salt, VoteError, VotingManager};
use stake::{PointsBook, StakeLedger};

const START: u64 = 1_704_067_200;

struct Fixture {
    config: DaoConfig,
    ledger: StakeLedger,
    bank: MemoryBank,
    points: PointsBook,
    votes: VotingManager,
}

fn fixture() -> Fixture {
    let config = DaoConfig::default();
    let clock = config.clock(START);
    let mut ledger = StakeLedger::new("vault".to_string());
    let mut bank = MemoryBank::new();
    for (who, amount) in [
        ("alice", 600 * TOKEN_UNIT),
        ("bob", 100 * TOKEN_UNIT),
        ("carol", 50 * TOKEN_UNIT),
    ] {
        bank.mint(who, 2 * amount);
        bank.approve(who, "vault", 2 * amount);
        ledger
            .lock_stake(&mut bank, who, amount, &clock, &config, START)
            .unwrap();
    }
    // alice qualifies as a moderator once her reputation clears the bar.
    ledger.participant_mut("alice").unwrap().reputation = config.moderator_min_reputation;
    ledger.refresh_moderator_status("alice", 1, &config);

    Fixture {
        config,
        ledger,
        bank,
        points: PointsBook::new(),
        votes: VotingManager::new(),
    }
}

fn salt(seed: u8) -> Salt {
    [seed; 32]
}

#[test]
fn test_commitment_round_trip_with_random_salts() {
    use rand::Rng;
    let mut rng = rand::rng();
    for _ in 0..32 {
        let s: Salt = rng.random();
        let choice: bool = rng.random();
        let hash = commitment("voter", &choice, &s);
        assert_eq!(hash, commitment("voter", &choice, &s));
        assert_ne!(hash, commitment("voter", &!choice, &s));
        assert_ne!(hash, commitment("other", &choice, &s));
    }
}

#[test]
fn test_nonce_must_strictly_increase_across_rounds() {
    let mut f = fixture();
    let id = DocHash::digest(b"proposal");
    let now = START + 11 * 86_400;
    f.votes.open_round(id, 0, now, 100, 50).unwrap();

    let hash = commitment("bob", &true, &salt(1));
    f.votes
        .commit_vote(&f.ledger, &f.config, id, 0, "bob", hash, 5, 1, now)
        .unwrap();

    // A second round: bob's nonce must exceed 5, even in a fresh round.
    f.votes.open_round(id, 1, now, 100, 50).unwrap();
    let hash2 = commitment("bob", &false, &salt(2));
    assert_eq!(
        f.votes
            .commit_vote(&f.ledger, &f.config, id, 1, "bob", hash2, 5, 1, now),
        Err(VoteError::NonceReused { supplied: 5, last: 5 })
    );
    assert_eq!(
        f.votes
            .commit_vote(&f.ledger, &f.config, id, 1, "bob", hash2, 4, 1, now),
        Err(VoteError::NonceReused { supplied: 4, last: 5 })
    );
    f.votes
        .commit_vote(&f.ledger, &f.config, id, 1, "bob", hash2, 6, 1, now)
        .unwrap();
}

#[test]
fn test_failed_nonce_or_window_leaves_nonce_unconsumed() {
    let mut f = fixture();
    let id = DocHash::digest(b"proposal");
    let now = START + 11 * 86_400;
    f.votes.open_round(id, 0, now, 100, 50).unwrap();

    let hash = commitment("bob", &true, &salt(1));
    // Committing after the window fails and must not burn the nonce.
    assert_eq!(
        f.votes
            .commit_vote(&f.ledger, &f.config, id, 0, "bob", hash, 7, 1, now + 100),
        Err(VoteError::CommitClosed)
    );
    assert_eq!(f.votes.last_nonce("bob"), 0);
}

#[test]
fn test_weight_is_snapshotted_at_commit_time() {
    let mut f = fixture();
    let clock = f.config.clock(START);
    let id = DocHash::digest(b"proposal");
    let now = START + 11 * 86_400;
    f.votes.open_round(id, 0, now, 100, 50).unwrap();

    let hash = commitment("bob", &true, &salt(3));
    f.votes
        .commit_vote(&f.ledger, &f.config, id, 0, "bob", hash, 1, 1, now)
        .unwrap();

    // bob locks more stake between commit and reveal.
    f.ledger
        .lock_stake(&mut f.bank, "bob", 100 * TOKEN_UNIT, &clock, &f.config, now + 10)
        .unwrap();

    f.votes
        .reveal_vote(&mut f.points, &f.config, id, 0, "bob", true, &salt(3), 1, now + 110)
        .unwrap();
    // The tally carries the commit-time weight, not the inflated stake.
    let round = f.votes.round(&id, 0).unwrap();
    assert_eq!(round.tally().for_weight, 100 * TOKEN_UNIT);
}

#[test]
fn test_reveal_awards_quarter_points() {
    let mut f = fixture();
    let id = DocHash::digest(b"proposal");
    let now = START + 11 * 86_400;
    f.votes.open_round(id, 0, now, 100, 50).unwrap();

    for (who, choice, seed, nonce) in [("bob", true, 4u8, 1u64), ("carol", false, 5, 1)] {
        let hash = commitment(who, &choice, &salt(seed));
        f.votes
            .commit_vote(&f.ledger, &f.config, id, 0, who, hash, nonce, 1, now)
            .unwrap();
        f.votes
            .reveal_vote(&mut f.points, &f.config, id, 0, who, choice, &salt(seed), 1, now + 105)
            .unwrap();
    }
    assert_eq!(f.points.quarter_points("bob", 1), f.config.quarter_point_per_vote);
    assert_eq!(f.points.quarter_points("carol", 1), f.config.quarter_point_per_vote);
}

#[test]
fn test_draft_vote_requires_moderator() {
    let mut f = fixture();
    let id = DocHash::digest(b"proposal");
    let now = START + 11 * 86_400;
    f.votes.open_draft(id, now, f.config.draft_voting_duration).unwrap();

    assert_eq!(
        f.votes
            .draft_vote(&f.ledger, &mut f.points, &f.config, id, "bob", true, 1, now),
        Err(VoteError::NotEligible)
    );
    f.votes
        .draft_vote(&f.ledger, &mut f.points, &f.config, id, "alice", true, 1, now)
        .unwrap();
    assert_eq!(
        f.points.moderator_points("alice", 1),
        f.config.moderator_point_per_draft_vote
    );

    // Re-voting flips the tally but earns no second point.
    f.votes
        .draft_vote(&f.ledger, &mut f.points, &f.config, id, "alice", false, 1, now + 5)
        .unwrap();
    let draft = f.votes.draft(&id).unwrap();
    assert_eq!(draft.tally().for_weight, 0);
    assert_eq!(draft.tally().against_weight, 600 * TOKEN_UNIT);
    assert_eq!(
        f.points.moderator_points("alice", 1),
        f.config.moderator_point_per_draft_vote
    );
}

#[test]
fn test_claim_round_applies_quorum_and_quota() {
    let mut f = fixture();
    let id = DocHash::digest(b"proposal");
    let now = START + 11 * 86_400;
    f.votes.open_round(id, 0, now, 100, 50).unwrap();

    // Only carol (50 of 750 units registered) votes: quota is met but the
    // scaled quorum is not.
    let hash = commitment("carol", &true, &salt(6));
    f.votes
        .commit_vote(&f.ledger, &f.config, id, 0, "carol", hash, 1, 1, now)
        .unwrap();
    f.votes
        .reveal_vote(&mut f.points, &f.config, id, 0, "carol", true, &salt(6), 1, now + 105)
        .unwrap();

    let totals = f.ledger.totals_for(1);
    let result = f
        .votes
        .claim_round(
            id,
            0,
            totals.participant_stake,
            400 * TOKEN_UNIT,
            1_000 * TOKEN_UNIT,
            &f.config,
            now + 150,
        )
        .unwrap();
    assert_eq!(result.outcome, RoundOutcome::Failed);
    assert!(result.tally.total() < result.quorum);

    // Claiming twice is a replay.
    assert_eq!(
        f.votes
            .claim_round(id, 0, totals.participant_stake, 0, 0, &f.config, now + 151)
            .unwrap_err(),
        VoteError::AlreadyClaimed
    );
}

#[test]
fn test_special_proposal_full_cycle() {
    let mut f = fixture();
    let id = DocHash::digest(b"raise-moderator-bar");
    let now = START + 11 * 86_400;
    let updates = vec![ParamUpdate {
        key: ParamKey::ModeratorMinStake,
        value: 800 * TOKEN_UNIT,
    }];
    f.votes
        .create_special(id, "founder".to_string(), updates, now, &f.config)
        .unwrap();

    // All three participants vote in favor, weighted by locked stake.
    for (who, seed, nonce) in [("alice", 7u8, 1u64), ("bob", 8, 1), ("carol", 9, 1)] {
        let hash = commitment(who, &true, &salt(seed));
        f.votes
            .commit_special(&f.ledger, &f.config, id, who, hash, nonce, 1, now)
            .unwrap();
    }
    let reveal_at = now + f.config.special_commit_duration + 1;
    for (who, seed) in [("alice", 7u8), ("bob", 8), ("carol", 9)] {
        f.votes
            .reveal_special(&mut f.points, &f.config, id, who, true, &salt(seed), 1, reveal_at)
            .unwrap();
    }

    let claim_at = now + f.config.special_commit_duration + f.config.special_reveal_duration;
    let result = f
        .votes
        .claim_special(id, f.ledger.total_locked(), &f.config, claim_at)
        .unwrap();
    assert_eq!(result.outcome, RoundOutcome::Passed);
    assert_eq!(result.tally.for_weight, 750 * TOKEN_UNIT);

    f.votes.apply_special(&mut f.config, id).unwrap();
    assert_eq!(f.config.moderator_min_stake, 800 * TOKEN_UNIT);
    assert_eq!(
        f.votes.apply_special(&mut f.config, id),
        Err(VoteError::AlreadyApplied)
    );
}
