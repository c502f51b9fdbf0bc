//! UTXO Commitments
//!
//! Implements Poseidon-based commitments for shielded UTXOs.
//!
//! ```text
//! Commitment = Poseidon(amount || randomness || owner_pk)
//! ```
//!
//! This hides the UTXO contents while allowing ZK proofs of knowledge.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge},
};
use ark_ff::{BigInteger, PrimeField};
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

/// A UTXO commitment (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(pub [u8; 32]);

impl Commitment {
    /// Create commitment from field element
    pub fn from_field(f: Fr) -> Self {
        let bytes = f.into_bigint().to_bytes_le();
        let mut arr = [0u8; 32];
        arr[..bytes.len()].copy_from_slice(&bytes);
        Self(arr)
    }

    /// Convert to field element
    pub fn to_field(&self) -> Fr {
        Fr::from_le_bytes_mod_order(&self.0)
    }

    /// Get raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for Commitment {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Commitment scheme using Poseidon hash
pub struct CommitmentScheme {
    config: PoseidonConfig<Fr>,
}

impl CommitmentScheme {
    /// Create a new commitment scheme with the pool's Poseidon parameters
    pub fn new() -> Self {
        Self {
            config: poseidon_config(),
        }
    }

    /// Commit to a UTXO: C = Poseidon(amount, randomness, owner_pk)
    ///
    /// # Arguments
    /// * `amount` - The UTXO value in base units
    /// * `randomness` - Random blinding factor (32 bytes)
    /// * `owner_pk` - Owner's public key (32 bytes)
    pub fn commit(&self, amount: u64, randomness: &[u8; 32], owner_pk: &[u8; 32]) -> Commitment {
        let mut sponge = PoseidonSponge::new(&self.config);

        let amount_f = Fr::from(amount);
        let randomness_f = Fr::from_le_bytes_mod_order(randomness);
        let owner_f = Fr::from_le_bytes_mod_order(owner_pk);

        sponge.absorb(&amount_f);
        sponge.absorb(&randomness_f);
        sponge.absorb(&owner_f);

        let result: Fr = sponge.squeeze_field_elements(1)[0];
        Commitment::from_field(result)
    }

    /// Generate random blinding factor
    pub fn random_blinding<R: Rng>(rng: &mut R) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        bytes
    }
}

impl Default for CommitmentScheme {
    fn default() -> Self {
        Self::new()
    }
}

/// Poseidon configuration for Veilpool
///
/// Field: BN254 Fr (254 bits)
/// Rate: 2, Capacity: 1
/// Security: 128 bits
fn poseidon_config() -> PoseidonConfig<Fr> {
    use ark_crypto_primitives::sponge::poseidon::find_poseidon_ark_and_mds;

    let prime_bits: u64 = 254;
    let rate: usize = 2;
    let capacity: usize = 1;
    let full_rounds: u64 = 8;
    let partial_rounds: u64 = 57;
    let alpha: u64 = 5;
    let skip_matrices: u64 = 0;

    let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(
        prime_bits,
        rate,
        full_rounds,
        partial_rounds,
        skip_matrices,
    );

    PoseidonConfig::new(
        full_rounds as usize,
        partial_rounds as usize,
        alpha,
        mds,
        ark,
        rate,
        capacity,
    )
}
