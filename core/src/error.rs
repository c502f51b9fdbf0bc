//! Error taxonomy for pool state transitions.
//!
//! Every rejection reason a `transact` or bridged deposit can surface.
//! The pool mutates no state on any of these, so callers may retry a
//! corrected transaction without cleanup.

use thiserror::Error;
use veilpool_privacy::{MerkleError, Nullifier};
use veilpool_transaction::{AssetId, PayloadError};

use crate::token::TokenError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoolError {
    /// The proof was built against a root no longer in the history
    /// window (or never in it).
    #[error("accumulator root {} is stale or unknown", hex::encode(.0))]
    StaleRoot([u8; 32]),

    /// An input nullifier is already marked spent, or appears twice in
    /// the same transaction.
    #[error("nullifier {} already spent", hex::encode(.0.as_bytes()))]
    DoubleSpend(Nullifier),

    /// Input count fits neither fixed circuit arity.
    #[error("no circuit shape for {inputs} inputs (max {max})")]
    ShapeMismatch { inputs: usize, max: usize },

    /// The proof failed verification against the public signals, or its
    /// bytes are not a valid encoding.
    #[error("proof verification failed")]
    InvalidProof,

    /// Net deposit above the configured per-transaction maximum.
    #[error("deposit of {amount} exceeds maximum {max_deposit}")]
    DepositAboveMaximum { amount: u64, max_deposit: u64 },

    /// Net withdrawal below the configured dust threshold.
    #[error("withdrawal of {amount} below minimum {min_withdrawal}")]
    WithdrawalBelowMinimum { amount: u64, min_withdrawal: u64 },

    /// Bridged deposit carries a different asset than the pool custodies.
    #[error("asset mismatch: pool custodies {}, deposit carries {}", expected.to_hex(), got.to_hex())]
    AssetMismatch { expected: AssetId, got: AssetId },

    /// The accumulator cannot absorb another commitment pair.
    #[error("accumulator capacity exhausted ({capacity} leaves)")]
    CapacityExhausted { capacity: u64 },

    /// `initialize` called a second time.
    #[error("pool limits already initialized")]
    AlreadyInitialized,

    /// `transact` called before `initialize`.
    #[error("pool limits not initialized")]
    NotInitialized,

    /// Bridged token amount does not match the payload's public amount.
    #[error("bridge delivered {delivered} but payload claims public amount {claimed}")]
    BridgeAmountMismatch { delivered: u64, claimed: i64 },

    /// Bridged payload bytes did not decode to a shielded transaction.
    #[error("malformed bridge payload: {0}")]
    MalformedPayload(String),

    /// Accumulator construction or insertion failure.
    #[error(transparent)]
    Merkle(#[from] MerkleError),

    /// External token movement failed; no pool state was touched.
    #[error(transparent)]
    Token(#[from] TokenError),
}

impl From<PayloadError> for PoolError {
    fn from(err: PayloadError) -> Self {
        PoolError::MalformedPayload(err.to_string())
    }
}
