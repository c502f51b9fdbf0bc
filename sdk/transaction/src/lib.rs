//! Veilpool transaction types
//!
//! The public payload that accompanies a zero-knowledge proof into the
//! pool, the opaque proof wrapper, and the record emitted after a
//! successful state transition. Everything here is wire-visible; secrets
//! never leave the proving client.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use veilpool_privacy::{Commitment, Nullifier};

pub mod bridge;
pub use bridge::{BridgedDeposit, L1WithdrawRequest};

/// A ledger account identifier (pool custody, depositors, recipients)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// The asset a pool custodies; bridged deposits must carry the same id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub [u8; 32]);

impl AssetId {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Opaque proof bytes (compressed Groth16 encoding)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof(pub Vec<u8>);

impl Proof {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The non-secret payload accompanying a proof.
///
/// `public_amount` is the signed net value entering (+) or leaving (-)
/// the shielded set. The circuit enforces
/// Σ inputs + public_amount = Σ outputs; the pool only re-checks token
/// movement against the external ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtData {
    /// Accumulator root the proof was built against
    pub root: [u8; 32],
    /// Nullifiers of the spent inputs (1..=16; pure deposits pad with
    /// dummy zero-value inputs that still carry real nullifiers)
    pub input_nullifiers: Vec<Nullifier>,
    /// The two output commitments created by this transaction
    pub output_commitments: [Commitment; 2],
    /// Signed net public amount in base units
    pub public_amount: i64,
    /// External recipient for net withdrawals
    pub recipient: AccountId,
    /// Relayer fee bound into the proof (settled inside the circuit)
    pub relayer_fee: u64,
}

impl ExtData {
    /// Binding hash over the fields that are not individual public
    /// signals. Part of the signal vector so a proof cannot be replayed
    /// with a different recipient or fee.
    pub fn ext_data_hash(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.recipient.0);
        hasher.update(&self.public_amount.to_le_bytes());
        hasher.update(&self.relayer_fee.to_le_bytes());
        *hasher.finalize().as_bytes()
    }

    /// Magnitude of a net withdrawal, if this is one
    pub fn withdrawal_amount(&self) -> Option<u64> {
        if self.public_amount < 0 {
            Some(self.public_amount.unsigned_abs())
        } else {
            None
        }
    }

    /// Magnitude of a net deposit, if this is one
    pub fn deposit_amount(&self) -> Option<u64> {
        if self.public_amount > 0 {
            Some(self.public_amount as u64)
        } else {
            None
        }
    }
}

/// Map the signed public amount into the proving field.
///
/// Negative amounts become the additive inverse, matching the circuit's
/// modular balance equation.
pub fn public_amount_to_field(amount: i64) -> Fr {
    if amount >= 0 {
        Fr::from(amount as u64)
    } else {
        -Fr::from(amount.unsigned_abs())
    }
}

/// Proof plus its public payload - the unit the pool validates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldedTransaction {
    pub proof: Proof,
    pub ext_data: ExtData,
}

/// Errors decoding a bridged transaction payload
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("malformed transaction payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ShieldedTransaction {
    /// Serialize for transport as bridge `encodedTransactionData`
    pub fn encode(&self) -> Result<Vec<u8>, PayloadError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a bridged payload
    pub fn decode(bytes: &[u8]) -> Result<Self, PayloadError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Record emitted after a successful `transact`, for off-chain indexing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Accumulator root after the insert
    pub new_root: [u8; 32],
    /// Inserted commitments with their leaf positions
    pub commitments: Vec<(u64, Commitment)>,
    /// Nullifiers marked spent
    pub nullifiers: Vec<Nullifier>,
    /// Net public amount of the transaction
    pub public_amount: i64,
    /// Recipient of a net withdrawal (zero account otherwise)
    pub recipient: AccountId,
}

/// Reduce a 32-byte binding hash into the proving field
pub fn hash_to_field(bytes: &[u8; 32]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}
