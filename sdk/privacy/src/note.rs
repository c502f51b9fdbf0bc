//! Shielded Notes
//!
//! A Note is the client-side view of a UTXO held privately in the pool.
//! The pool itself only ever sees commitments and nullifiers; notes and
//! spending keys stay with the owner, who uses them to build transaction
//! proofs off-chain.
//!
//! ```text
//! Note = {
//!     value: u64,           // Amount in base units
//!     randomness: [u8; 32], // Blinding factor
//!     owner_pk: [u8; 32],   // Owner's public key
//!     position: u64,        // Leaf position (set on insertion)
//! }
//! ```

use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::commitment::{Commitment, CommitmentScheme};
use crate::nullifier::{Nullifier, NullifierKey};

/// A shielded note representing privately held value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// The value (amount) held in this note
    pub value: NoteValue,
    /// Random blinding factor for hiding the commitment
    pub randomness: [u8; 32],
    /// Owner's public key (who can spend this note)
    pub owner_pk: [u8; 32],
    /// Leaf position in the accumulator (None if not yet inserted)
    pub position: Option<u64>,
}

/// Note value with overflow protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteValue(pub u64);

impl NoteValue {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u64::MAX);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Checked addition
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Checked subtraction
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl Note {
    /// Create a new note with random blinding
    pub fn new<R: Rng>(value: u64, owner_pk: [u8; 32], rng: &mut R) -> Self {
        let mut randomness = [0u8; 32];
        rng.fill_bytes(&mut randomness);

        Self {
            value: NoteValue(value),
            randomness,
            owner_pk,
            position: None,
        }
    }

    /// Create a note with explicit randomness (for testing/recovery)
    pub fn with_randomness(value: u64, owner_pk: [u8; 32], randomness: [u8; 32]) -> Self {
        Self {
            value: NoteValue(value),
            randomness,
            owner_pk,
            position: None,
        }
    }

    /// Compute the commitment for this note
    pub fn commitment(&self) -> Commitment {
        let scheme = CommitmentScheme::new();
        scheme.commit(self.value.0, &self.randomness, &self.owner_pk)
    }

    /// Derive the nullifier for spending this note
    ///
    /// Requires the spending key and that position is set
    pub fn nullifier(&self, spending_key: &SpendingKey) -> Option<Nullifier> {
        let position = self.position?;
        let nk = spending_key.nullifier_key();
        Some(nk.derive_nullifier(&self.commitment(), position))
    }

    /// Set the accumulator position (called after insertion)
    pub fn with_position(mut self, position: u64) -> Self {
        self.position = Some(position);
        self
    }

    /// Check if this note has been inserted into the accumulator
    pub fn is_inserted(&self) -> bool {
        self.position.is_some()
    }
}

/// Spending key - allows spending notes
///
/// This is the most sensitive key. Loss = loss of funds.
/// Compromise = theft of funds.
#[derive(Debug, Clone)]
pub struct SpendingKey {
    key: [u8; 32],
}

impl SpendingKey {
    /// Generate a random spending key
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let mut key = [0u8; 32];
        rng.fill_bytes(&mut key);
        Self { key }
    }

    /// Create from raw bytes
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    /// Derive the nullifier key
    pub fn nullifier_key(&self) -> NullifierKey {
        NullifierKey::from_bytes(self.key)
    }

    /// Derive the public key (address)
    pub fn public_key(&self) -> [u8; 32] {
        use ark_bn254::Fr;
        use ark_crypto_primitives::sponge::{
            CryptographicSponge,
            poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
        };
        use ark_ff::{BigInteger, PrimeField};

        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(254, 2, 8, 57, 0);
        let config = PoseidonConfig::new(8, 57, 5, mds, ark, 2, 1);

        let mut sponge = PoseidonSponge::new(&config);

        let domain = Fr::from_le_bytes_mod_order(
            b"VeilpoolPK\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0\0",
        );
        sponge.absorb(&domain);

        let key_f = Fr::from_le_bytes_mod_order(&self.key);
        sponge.absorb(&key_f);

        let result: Fr = sponge.squeeze_field_elements(1)[0];
        let bytes = result.into_bigint().to_bytes_le();
        let mut arr = [0u8; 32];
        arr[..bytes.len()].copy_from_slice(&bytes);
        arr
    }
}
