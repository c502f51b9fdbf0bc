//! Pool state machine scenarios.

use super::*;
use crate::error::PoolError;
use crate::pool::{PoolLimits, ShieldedPool};
use crate::token::TokenLedger;
use crate::verifier::TransactVerifiers;
use veilpool_transaction::Proof;

#[test]
fn test_deposit_then_withdraw() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 100_000_000)]);
    let alice = account(1);
    let bob = account(2);

    // Shield 80_000_000 into two fresh commitments; the dummy input
    // nullifier makes the deposit one-shot.
    let deposit = make_tx(
        pool.root(),
        vec![nullifier(100)],
        [commitment(10), commitment(11)],
        80_000_000,
        account(0),
    );
    let record = pool.transact(&mut ledger, &alice, &deposit).unwrap();
    assert_eq!(record.commitments[0].0, 0);
    assert_eq!(record.commitments[1].0, 1);
    assert_eq!(pool.custody_balance(), 80_000_000);
    assert_eq!(ledger.balance_of(&alice), 20_000_000);
    assert_eq!(pool.nullifier_count(), 1);

    // Unshield 50_000_000 to bob, leaving a 30_000_000 change note.
    let withdraw = make_tx(
        pool.root(),
        vec![nullifier(1)],
        [commitment(12), commitment(13)],
        -50_000_000,
        bob,
    );
    let record = pool.transact(&mut ledger, &alice, &withdraw).unwrap();
    assert_eq!(record.commitments.len(), 2);
    assert_eq!(record.commitments[0].0, 2);
    assert_eq!(record.nullifiers, vec![nullifier(1)]);
    assert_eq!(pool.custody_balance(), 30_000_000);
    assert_eq!(ledger.balance_of(&bob), 50_000_000);
    assert_eq!(ledger.balance_of(&account(0)), 30_000_000);
    assert_eq!(pool.nullifier_count(), 2);
    assert_eq!(pool.next_index(), 4);
}

#[test]
fn test_client_built_notes_flow() {
    // Same flow as above, but with real commitments and a real derived
    // nullifier instead of fixed byte patterns.
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use veilpool_privacy::{Note, SpendingKey};

    let mut rng = StdRng::seed_from_u64(42);
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 100_000_000)]);
    let key = SpendingKey::random(&mut rng);

    let shielded = Note::new(80_000_000, key.public_key(), &mut rng);
    // Dummy zero-value input: not in the tree, but its nullifier is
    // real and makes the deposit replay-proof.
    let filler = Note::new(0, key.public_key(), &mut rng).with_position(0);
    let deposit = make_tx(
        pool.root(),
        vec![filler.nullifier(&key).unwrap()],
        [shielded.commitment(), filler.commitment()],
        80_000_000,
        account(0),
    );
    let record = pool.transact(&mut ledger, &account(1), &deposit).unwrap();
    let shielded = shielded.with_position(record.commitments[0].0);

    let change = Note::new(30_000_000, key.public_key(), &mut rng);
    let dummy = Note::new(0, key.public_key(), &mut rng);
    let withdraw = make_tx(
        pool.root(),
        vec![shielded.nullifier(&key).unwrap()],
        [change.commitment(), dummy.commitment()],
        -50_000_000,
        account(2),
    );
    pool.transact(&mut ledger, &account(1), &withdraw).unwrap();

    assert!(pool.is_spent(&shielded.nullifier(&key).unwrap()));
    assert_eq!(pool.custody_balance(), 30_000_000);
    assert_eq!(ledger.balance_of(&account(2)), 50_000_000);
}

#[test]
fn test_transact_before_initialize() {
    let mut pool =
        ShieldedPool::new(asset(), 8, 10, TransactVerifiers::mock()).unwrap();
    let mut ledger = new_ledger(&[(1, 100)]);
    let tx = make_tx(pool.root(), vec![], [commitment(1), commitment(2)], 0, account(0));

    assert_eq!(
        pool.transact(&mut ledger, &account(1), &tx),
        Err(PoolError::NotInitialized)
    );
}

#[test]
fn test_initialize_is_one_shot() {
    let mut pool = new_pool(8, 10);
    let again = PoolLimits {
        min_withdrawal: 1,
        max_deposit: 2,
    };
    assert_eq!(pool.initialize(again), Err(PoolError::AlreadyInitialized));
}

#[test]
fn test_unknown_root_rejected() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 1_000_000)]);

    let tx = make_tx([9u8; 32], vec![], [commitment(1), commitment(2)], 1_000_000, account(0));
    let before = snapshot(&pool, &ledger, &[0, 1]);

    assert_eq!(
        pool.transact(&mut ledger, &account(1), &tx),
        Err(PoolError::StaleRoot([9u8; 32]))
    );
    assert_eq!(snapshot(&pool, &ledger, &[0, 1]), before);
}

#[test]
fn test_evicted_root_goes_stale() {
    // History of 2: a root stays valid through the next insert, then
    // falls out of the window.
    let mut pool = new_pool(8, 2);
    let mut ledger = new_ledger(&[(1, 10_000_000_000)]);
    let alice = account(1);

    let d1 = make_tx(pool.root(), vec![nullifier(31)], [commitment(1), commitment(2)], 1_000_000, account(0));
    pool.transact(&mut ledger, &alice, &d1).unwrap();
    let old_root = pool.root();

    let d2 = make_tx(pool.root(), vec![nullifier(32)], [commitment(3), commitment(4)], 1_000_000, account(0));
    pool.transact(&mut ledger, &alice, &d2).unwrap();

    // Still in the 2-slot window.
    assert!(pool.is_known_root(&old_root));

    let d3 = make_tx(pool.root(), vec![nullifier(33)], [commitment(5), commitment(6)], 1_000_000, account(0));
    pool.transact(&mut ledger, &alice, &d3).unwrap();

    assert!(!pool.is_known_root(&old_root));
    let late = make_tx(old_root, vec![nullifier(34)], [commitment(7), commitment(8)], 1_000_000, account(0));
    assert_eq!(
        pool.transact(&mut ledger, &alice, &late),
        Err(PoolError::StaleRoot(old_root))
    );
}

#[test]
fn test_double_spend_replay() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 10_000_000)]);
    let alice = account(1);

    // Deposit carrying a dummy input nullifier as its replay guard.
    let tx = make_tx(
        pool.root(),
        vec![nullifier(7)],
        [commitment(1), commitment(2)],
        1_000_000,
        account(0),
    );
    pool.transact(&mut ledger, &alice, &tx).unwrap();
    assert!(pool.is_spent(&nullifier(7)));

    let before = snapshot(&pool, &ledger, &[0, 1]);
    assert_eq!(
        pool.transact(&mut ledger, &alice, &tx),
        Err(PoolError::DoubleSpend(nullifier(7)))
    );
    assert_eq!(snapshot(&pool, &ledger, &[0, 1]), before);
}

#[test]
fn test_duplicate_nullifier_within_transaction() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 10_000_000)]);

    let tx = make_tx(
        pool.root(),
        vec![nullifier(3), nullifier(3)],
        [commitment(1), commitment(2)],
        0,
        account(0),
    );
    assert_eq!(
        pool.transact(&mut ledger, &account(1), &tx),
        Err(PoolError::DoubleSpend(nullifier(3)))
    );
    assert_eq!(pool.nullifier_count(), 0);
}

#[test]
fn test_zero_inputs_rejected() {
    // Without at least one nullifier a deposit payload would be
    // replayable for as long as its root stays in the window.
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 10_000_000)]);

    let tx = make_tx(pool.root(), vec![], [commitment(1), commitment(2)], 1_000_000, account(0));
    let before = snapshot(&pool, &ledger, &[0, 1]);
    assert_eq!(
        pool.transact(&mut ledger, &account(1), &tx),
        Err(PoolError::ShapeMismatch { inputs: 0, max: 16 })
    );
    assert_eq!(snapshot(&pool, &ledger, &[0, 1]), before);
}

#[test]
fn test_too_many_inputs() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 10_000_000)]);

    let nullifiers = (1..=17).map(nullifier).collect();
    let tx = make_tx(pool.root(), nullifiers, [commitment(1), commitment(2)], 0, account(0));
    assert_eq!(
        pool.transact(&mut ledger, &account(1), &tx),
        Err(PoolError::ShapeMismatch { inputs: 17, max: 16 })
    );
}

#[test]
fn test_sixteen_inputs_use_large_shape() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 10_000_000)]);

    let nullifiers: Vec<_> = (1..=16).map(nullifier).collect();
    let tx = make_tx(
        pool.root(),
        nullifiers.clone(),
        [commitment(20), commitment(21)],
        0,
        account(0),
    );
    let record = pool.transact(&mut ledger, &account(1), &tx).unwrap();
    assert_eq!(record.nullifiers.len(), 16);
    assert_eq!(pool.nullifier_count(), 16);
}

#[test]
fn test_invalid_proof_rejected() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 10_000_000)]);

    let mut tx = make_tx(
        pool.root(),
        vec![nullifier(1)],
        [commitment(1), commitment(2)],
        1_000_000,
        account(0),
    );
    tx.proof = Proof(vec![]);

    let before = snapshot(&pool, &ledger, &[0, 1]);
    assert_eq!(
        pool.transact(&mut ledger, &account(1), &tx),
        Err(PoolError::InvalidProof)
    );
    assert_eq!(snapshot(&pool, &ledger, &[0, 1]), before);
}

#[test]
fn test_deposit_above_maximum() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, u64::MAX / 2)]);

    let amount = MAX_DEPOSIT + 1;
    let tx = make_tx(
        pool.root(),
        vec![nullifier(1)],
        [commitment(1), commitment(2)],
        amount as i64,
        account(0),
    );
    assert_eq!(
        pool.transact(&mut ledger, &account(1), &tx),
        Err(PoolError::DepositAboveMaximum {
            amount,
            max_deposit: MAX_DEPOSIT
        })
    );
}

#[test]
fn test_withdrawal_below_minimum() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 10_000_000)]);
    let alice = account(1);

    let deposit = make_tx(
        pool.root(),
        vec![nullifier(50)],
        [commitment(1), commitment(2)],
        1_000_000,
        account(0),
    );
    pool.transact(&mut ledger, &alice, &deposit).unwrap();

    let dust = MIN_WITHDRAWAL - 1;
    let withdraw = make_tx(
        pool.root(),
        vec![nullifier(1)],
        [commitment(3), commitment(4)],
        -(dust as i64),
        account(2),
    );
    let before = snapshot(&pool, &ledger, &[0, 1, 2]);
    assert_eq!(
        pool.transact(&mut ledger, &alice, &withdraw),
        Err(PoolError::WithdrawalBelowMinimum {
            amount: dust,
            min_withdrawal: MIN_WITHDRAWAL
        })
    );
    assert_eq!(snapshot(&pool, &ledger, &[0, 1, 2]), before);
}

#[test]
fn test_underfunded_deposit_moves_nothing() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 500_000)]);

    let tx = make_tx(
        pool.root(),
        vec![nullifier(1)],
        [commitment(1), commitment(2)],
        1_000_000,
        account(0),
    );
    let before = snapshot(&pool, &ledger, &[0, 1]);

    let err = pool.transact(&mut ledger, &account(1), &tx).unwrap_err();
    assert!(matches!(err, PoolError::Token(_)));
    assert_eq!(snapshot(&pool, &ledger, &[0, 1]), before);
}

#[test]
fn test_capacity_exhausted() {
    // Height 2 = 4 leaves = two pair inserts.
    let mut pool = new_pool(2, 10);
    let mut ledger = new_ledger(&[(1, 100_000_000)]);
    let alice = account(1);

    for seed in [1u8, 3] {
        let tx = make_tx(
            pool.root(),
            vec![nullifier(seed + 40)],
            [commitment(seed), commitment(seed + 1)],
            1_000_000,
            account(0),
        );
        pool.transact(&mut ledger, &alice, &tx).unwrap();
    }

    let tx = make_tx(
        pool.root(),
        vec![nullifier(60)],
        [commitment(5), commitment(6)],
        1_000_000,
        account(0),
    );
    let before = snapshot(&pool, &ledger, &[0, 1]);
    assert_eq!(
        pool.transact(&mut ledger, &alice, &tx),
        Err(PoolError::CapacityExhausted { capacity: 4 })
    );
    assert_eq!(snapshot(&pool, &ledger, &[0, 1]), before);
}

#[test]
fn test_value_conservation_over_sequence() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 1_000_000_000)]);
    let alice = account(1);

    let moves: [i64; 4] = [300_000_000, -100_000_000, 0, -50_000_000];
    let mut expected_custody: i64 = 0;
    let mut seed = 10u8;

    for (i, amount) in moves.into_iter().enumerate() {
        let tx = make_tx(
            pool.root(),
            vec![nullifier(i as u8 + 1)],
            [commitment(seed), commitment(seed + 1)],
            amount,
            account(2),
        );
        seed += 2;
        pool.transact(&mut ledger, &alice, &tx).unwrap();
        expected_custody += amount;
    }

    assert_eq!(pool.custody_balance(), expected_custody as u64);
    assert_eq!(ledger.balance_of(&account(0)), expected_custody as u64);
    assert_eq!(
        ledger.balance_of(&alice) + ledger.balance_of(&account(0)) + ledger.balance_of(&account(2)),
        1_000_000_000
    );
}

#[test]
fn test_each_transact_adds_exactly_one_pair() {
    let mut pool = new_pool(8, 10);
    let mut ledger = new_ledger(&[(1, 100_000_000)]);

    for (i, seed) in [(0u64, 1u8), (2, 3), (4, 5)] {
        assert_eq!(pool.next_index(), i);
        let tx = make_tx(
            pool.root(),
            vec![nullifier(seed + 30)],
            [commitment(seed), commitment(seed + 1)],
            1_000_000,
            account(0),
        );
        let record = pool.transact(&mut ledger, &account(1), &tx).unwrap();
        assert_eq!(record.commitments.len(), 2);
        assert_eq!(record.new_root, pool.root());
    }
    assert_eq!(pool.next_index(), 6);
}
