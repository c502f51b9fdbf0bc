//! Veilpool core
//!
//! The shielded pool state machine and everything it needs at runtime:
//! proof verification, the spent-nullifier set, the token custody
//! boundary, and the bridge adapter that feeds L1 deposits into the
//! pool.
//!
//! ```text
//!   L1 relay ──> BridgeAdapter ──> ShieldedPool ──> TokenLedger
//!                     │                │
//!                WithdrawalOutbox   MerkleTreeWithHistory
//!                                   NullifierSet
//! ```
//!
//! `ShieldedPool::transact` is the single entry point for state
//! transitions. It validates everything first and mutates nothing until
//! all checks (including the external token movement) have passed, so a
//! rejected transaction leaves pool state byte-identical.

pub mod bridge;
pub mod error;
pub mod nullifiers;
pub mod pool;
pub mod token;
pub mod verifier;

pub use bridge::{BridgeAdapter, WithdrawalOutbox};
pub use error::PoolError;
pub use nullifiers::NullifierSet;
pub use pool::{PoolLimits, ShieldedPool};
pub use token::{InMemoryTokenLedger, TokenError, TokenLedger};
pub use verifier::{
    Groth16Verifier, MockVerifier, ProofVerifier, TransactShape, TransactVerifiers, VerifierError,
    LARGE_ARITY, SMALL_ARITY,
};

#[cfg(test)]
mod tests;
