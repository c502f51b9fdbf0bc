//! Veilpool Privacy SDK
//!
//! UTXO-style shielded-value primitives for the Veilpool pool.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Shielded Transaction                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐ │
//! │  │  Nullifiers  │  │ Commitments  │  │   Public amount       │ │
//! │  │  (spent)     │  │  (new UTXOs) │  │   (net value delta)   │ │
//! │  └──────────────┘  └──────────────┘  └───────────────────────┘ │
//! │         │                 │                     │               │
//! │         ▼                 ▼                     ▼               │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              ZK Proof (Groth16)                          │   │
//! │  │  • Valid nullifier derivation                            │   │
//! │  │  • Valid commitment structure                            │   │
//! │  │  • Σ inputs + public_amount = Σ outputs                  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod commitment;
pub mod merkle;
pub mod note;
pub mod nullifier;

pub use commitment::{Commitment, CommitmentScheme};
pub use merkle::{
    DEFAULT_ROOT_HISTORY_SIZE, MAX_TREE_HEIGHT, MerkleError, MerkleHasher, MerkleTreeWithHistory,
};
pub use note::{Note, NoteValue, SpendingKey};
pub use nullifier::{Nullifier, NullifierKey};
