//! Proof verification boundary.
//!
//! The pool never inspects proof internals; it hands opaque proof bytes
//! and an ordered public-signal vector to a [`ProofVerifier`] and acts
//! on the boolean. Two circuit shapes exist, one per fixed input arity,
//! and the pool picks between them per transaction.
//!
//! Signal vector layout (length `arity + 5`):
//!
//! ```text
//! [ root, public_amount, ext_data_hash,
//!   nullifier_0 .. nullifier_{arity-1},   (zero-padded)
//!   output_commitment_0, output_commitment_1 ]
//! ```

use ark_bn254::{Bn254, Fr};
use ark_groth16::{
    Groth16, PreparedVerifyingKey, Proof as Groth16Proof, VerifyingKey, prepare_verifying_key,
};
use ark_serialize::CanonicalDeserialize;
use thiserror::Error;

use veilpool_transaction::{ExtData, Proof, hash_to_field, public_amount_to_field};

/// Input arity of the small circuit.
pub const SMALL_ARITY: usize = 2;
/// Input arity of the large circuit.
pub const LARGE_ARITY: usize = 16;

/// Signals = root + public_amount + ext_data_hash + nullifiers + 2 outputs.
pub const fn signal_len(arity: usize) -> usize {
    arity + 5
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("proof bytes are not a valid Groth16 encoding")]
    MalformedProof,
    #[error("verifying key bytes are not a valid Groth16 encoding")]
    MalformedKey,
    #[error("expected {expected} public signals, got {got}")]
    SignalCount { expected: usize, got: usize },
    #[error("verification backend failure: {0}")]
    Backend(String),
}

/// One circuit shape's verifier. `verify` returns `Ok(false)` for a
/// well-formed proof that does not satisfy the signals; errors are
/// reserved for malformed inputs and backend failures.
pub trait ProofVerifier: Send + Sync {
    fn arity(&self) -> usize;
    fn verify(&self, proof: &Proof, signals: &[Fr]) -> Result<bool, VerifierError>;
}

/// Which of the two fixed circuit arities a transaction uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactShape {
    Small,
    Large,
}

impl TransactShape {
    /// Pick the smallest arity that fits the input count.
    ///
    /// Zero inputs is not a shape: every transaction publishes at least
    /// one nullifier, so a replayed payload always trips the spent set.
    /// Pure deposits pad with dummy zero-value inputs, which still carry
    /// real nullifiers.
    pub fn for_input_count(inputs: usize) -> Option<Self> {
        match inputs {
            1..=SMALL_ARITY => Some(TransactShape::Small),
            _ if inputs <= LARGE_ARITY => Some(TransactShape::Large),
            _ => None,
        }
    }

    pub fn arity(&self) -> usize {
        match self {
            TransactShape::Small => SMALL_ARITY,
            TransactShape::Large => LARGE_ARITY,
        }
    }
}

/// Build the ordered public-signal vector for one transaction,
/// zero-padding the nullifier block out to the circuit arity.
pub fn build_public_signals(ext: &ExtData, shape: TransactShape) -> Vec<Fr> {
    let arity = shape.arity();
    let mut signals = Vec::with_capacity(signal_len(arity));

    signals.push(hash_to_field(&ext.root));
    signals.push(public_amount_to_field(ext.public_amount));
    signals.push(hash_to_field(&ext.ext_data_hash()));

    for slot in 0..arity {
        match ext.input_nullifiers.get(slot) {
            Some(n) => signals.push(n.to_field()),
            None => signals.push(Fr::from(0u64)),
        }
    }

    for commitment in &ext.output_commitments {
        signals.push(commitment.to_field());
    }

    signals
}

// ============================================================
// Groth16 over BN254
// ============================================================

/// Production verifier: a prepared verifying key for one circuit shape.
pub struct Groth16Verifier {
    pvk: PreparedVerifyingKey<Bn254>,
    arity: usize,
}

impl Groth16Verifier {
    /// Load from a compressed arkworks-serialized verifying key.
    pub fn from_vk_bytes(bytes: &[u8], arity: usize) -> Result<Self, VerifierError> {
        let vk = VerifyingKey::<Bn254>::deserialize_compressed(bytes)
            .map_err(|_| VerifierError::MalformedKey)?;
        Ok(Self {
            pvk: prepare_verifying_key(&vk),
            arity,
        })
    }
}

impl ProofVerifier for Groth16Verifier {
    fn arity(&self) -> usize {
        self.arity
    }

    fn verify(&self, proof: &Proof, signals: &[Fr]) -> Result<bool, VerifierError> {
        let expected = signal_len(self.arity);
        if signals.len() != expected {
            return Err(VerifierError::SignalCount {
                expected,
                got: signals.len(),
            });
        }

        let proof = Groth16Proof::<Bn254>::deserialize_compressed(proof.as_bytes())
            .map_err(|_| VerifierError::MalformedProof)?;

        Groth16::<Bn254>::verify_proof(&self.pvk, &proof, signals)
            .map_err(|e| VerifierError::Backend(e.to_string()))
    }
}

// ============================================================
// Mock verifier for development and tests
// ============================================================

/// Accepts any non-empty proof after checking the signal count. Lets
/// the full pool path run without a trusted setup.
pub struct MockVerifier {
    arity: usize,
}

impl MockVerifier {
    pub fn new(arity: usize) -> Self {
        Self { arity }
    }
}

impl ProofVerifier for MockVerifier {
    fn arity(&self) -> usize {
        self.arity
    }

    fn verify(&self, proof: &Proof, signals: &[Fr]) -> Result<bool, VerifierError> {
        let expected = signal_len(self.arity);
        if signals.len() != expected {
            return Err(VerifierError::SignalCount {
                expected,
                got: signals.len(),
            });
        }
        Ok(!proof.is_empty())
    }
}

/// The pool's pair of verifiers, one per circuit shape.
pub struct TransactVerifiers {
    pub small: Box<dyn ProofVerifier>,
    pub large: Box<dyn ProofVerifier>,
}

impl TransactVerifiers {
    pub fn new(small: Box<dyn ProofVerifier>, large: Box<dyn ProofVerifier>) -> Self {
        Self { small, large }
    }

    /// Mock pair for development wiring and tests.
    pub fn mock() -> Self {
        Self {
            small: Box::new(MockVerifier::new(SMALL_ARITY)),
            large: Box::new(MockVerifier::new(LARGE_ARITY)),
        }
    }

    pub fn select(&self, shape: TransactShape) -> &dyn ProofVerifier {
        match shape {
            TransactShape::Small => self.small.as_ref(),
            TransactShape::Large => self.large.as_ref(),
        }
    }
}
