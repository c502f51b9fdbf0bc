//! Integration tests for the pool state machine and bridge adapter.

mod pool;

use veilpool_privacy::{Commitment, Nullifier};
use veilpool_transaction::{AccountId, AssetId, ExtData, Proof, ShieldedTransaction};

use crate::pool::{PoolLimits, ShieldedPool};
use crate::token::{InMemoryTokenLedger, TokenLedger};
use crate::verifier::TransactVerifiers;

pub const MIN_WITHDRAWAL: u64 = 100_000;
pub const MAX_DEPOSIT: u64 = 10_000_000_000;

pub fn account(id: u8) -> AccountId {
    AccountId([id; 32])
}

pub fn asset() -> AssetId {
    AssetId([0x11; 32])
}

pub fn commitment(seed: u8) -> Commitment {
    Commitment([seed; 32])
}

pub fn nullifier(seed: u8) -> Nullifier {
    Nullifier([seed; 32])
}

/// Initialized pool with mock verifiers and the standard test limits.
pub fn new_pool(height: usize, history: usize) -> ShieldedPool {
    let mut pool =
        ShieldedPool::new(asset(), height, history, TransactVerifiers::mock()).unwrap();
    pool.initialize(PoolLimits {
        min_withdrawal: MIN_WITHDRAWAL,
        max_deposit: MAX_DEPOSIT,
    })
    .unwrap();
    pool
}

/// Ledger with custody bound to `account(0)` and the given balances.
pub fn new_ledger(funded: &[(u8, u64)]) -> InMemoryTokenLedger {
    let mut ledger = InMemoryTokenLedger::new(account(0));
    for (id, amount) in funded {
        ledger.mint(&account(*id), *amount);
    }
    ledger
}

pub fn make_tx(
    root: [u8; 32],
    nullifiers: Vec<Nullifier>,
    outputs: [Commitment; 2],
    public_amount: i64,
    recipient: AccountId,
) -> ShieldedTransaction {
    ShieldedTransaction {
        proof: Proof(vec![0xAB; 64]),
        ext_data: ExtData {
            root,
            input_nullifiers: nullifiers,
            output_commitments: outputs,
            public_amount,
            recipient,
            relayer_fee: 0,
        },
    }
}

/// Everything a failed transaction must leave untouched.
#[derive(Debug, PartialEq)]
pub struct PoolSnapshot {
    root: [u8; 32],
    next_index: u64,
    nullifier_count: usize,
    custody: u64,
    balances: Vec<u64>,
}

pub fn snapshot(pool: &ShieldedPool, ledger: &InMemoryTokenLedger, accounts: &[u8]) -> PoolSnapshot {
    PoolSnapshot {
        root: pool.root(),
        next_index: pool.next_index(),
        nullifier_count: pool.nullifier_count(),
        custody: pool.custody_balance(),
        balances: accounts
            .iter()
            .map(|id| ledger.balance_of(&account(*id)))
            .collect(),
    }
}
