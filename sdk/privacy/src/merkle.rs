//! Merkle Accumulator with Root History
//!
//! Implements the append-only commitment accumulator. Leaves are inserted
//! in pairs (one shielded transaction always creates two outputs), the root
//! is recomputed incrementally from a filled-subtree cache, and a circular
//! buffer retains the last K roots so proofs built against a slightly stale
//! root are still accepted.
//!
//! ```text
//!                    Root
//!                   /    \
//!                 H01    H23
//!                /  \   /   \
//!               H0  H1 H2   H3
//!               |   |   |    |
//!              C0  C1  C2   C3  (UTXO Commitments)
//! ```

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    CryptographicSponge,
    poseidon::{PoseidonConfig, PoseidonSponge, find_poseidon_ark_and_mds},
};
use ark_ff::{BigInteger, PrimeField};
use thiserror::Error;

/// Maximum supported tree height (capacity 2^32 leaves)
pub const MAX_TREE_HEIGHT: usize = 32;

/// Default number of recent roots retained for stale-root tolerance
pub const DEFAULT_ROOT_HISTORY_SIZE: usize = 100;

/// The all-zero word is reserved as a sentinel for empty history slots.
/// Poseidon never produces it, so it can never shadow a real root.
const ZERO_SENTINEL: [u8; 32] = [0u8; 32];

/// Errors raised by the accumulator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MerkleError {
    /// The tree has no room left for another pair of leaves
    #[error("accumulator full: capacity {capacity} leaves")]
    CapacityExhausted { capacity: u64 },

    /// Height outside the supported range
    #[error("invalid tree height {0}: must be 2..={MAX_TREE_HEIGHT}")]
    InvalidHeight(usize),

    /// Root history must hold at least one root
    #[error("invalid root history size {0}: must be >= 1")]
    InvalidHistorySize(usize),
}

/// Poseidon-based Merkle hash function
#[derive(Debug)]
pub struct MerkleHasher {
    config: PoseidonConfig<Fr>,
    /// Precomputed empty subtree roots at each level
    zeros: Vec<[u8; 32]>,
}

impl MerkleHasher {
    /// Create a hasher with empty-subtree roots precomputed up to `height`
    pub fn new(height: usize) -> Self {
        let config = Self::poseidon_config();
        let empty_leaf = Self::compute_empty_leaf(&config);
        let zeros = Self::compute_zeros(&config, &empty_leaf, height);

        Self { config, zeros }
    }

    /// Hash two children to get parent
    pub fn hash_pair(&self, left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
        let mut sponge = PoseidonSponge::new(&self.config);

        let left_f = Fr::from_le_bytes_mod_order(left);
        let right_f = Fr::from_le_bytes_mod_order(right);

        sponge.absorb(&left_f);
        sponge.absorb(&right_f);

        let result: Fr = sponge.squeeze_field_elements(1)[0];
        let bytes = result.into_bigint().to_bytes_le();
        let mut arr = [0u8; 32];
        arr[..bytes.len()].copy_from_slice(&bytes);
        arr
    }

    /// Root of an empty subtree spanning 2^level leaves
    pub fn zero(&self, level: usize) -> &[u8; 32] {
        &self.zeros[level]
    }

    fn poseidon_config() -> PoseidonConfig<Fr> {
        let (ark, mds) = find_poseidon_ark_and_mds::<Fr>(254, 2, 8, 57, 0);
        PoseidonConfig::new(8, 57, 5, mds, ark, 2, 1)
    }

    fn compute_empty_leaf(config: &PoseidonConfig<Fr>) -> [u8; 32] {
        let mut sponge = PoseidonSponge::new(config);
        sponge.absorb(&Fr::from(0u64));
        let result: Fr = sponge.squeeze_field_elements(1)[0];
        let bytes = result.into_bigint().to_bytes_le();
        let mut arr = [0u8; 32];
        arr[..bytes.len()].copy_from_slice(&bytes);
        arr
    }

    fn compute_zeros(
        config: &PoseidonConfig<Fr>,
        empty_leaf: &[u8; 32],
        height: usize,
    ) -> Vec<[u8; 32]> {
        let mut zeros = vec![*empty_leaf];
        let mut prev = *empty_leaf;

        for _ in 0..height {
            let mut sponge = PoseidonSponge::new(config);
            let prev_f = Fr::from_le_bytes_mod_order(&prev);
            sponge.absorb(&prev_f);
            sponge.absorb(&prev_f);
            let result: Fr = sponge.squeeze_field_elements(1)[0];
            let bytes = result.into_bigint().to_bytes_le();
            let mut arr = [0u8; 32];
            arr[..bytes.len()].copy_from_slice(&bytes);
            zeros.push(arr);
            prev = arr;
        }

        zeros
    }
}

/// Fixed-height append-only accumulator with a bounded root-history window.
///
/// Storage is O(height) via the filled-subtree cache: one partial hash per
/// level for the rightmost incomplete subtree, never the whole tree.
#[derive(Debug)]
pub struct MerkleTreeWithHistory {
    height: usize,
    hasher: MerkleHasher,
    /// Rightmost partial hash per level (index = level)
    filled_subtrees: Vec<[u8; 32]>,
    /// Circular buffer of the last K roots
    root_history: Vec<[u8; 32]>,
    /// Write cursor into `root_history`
    current_root_index: usize,
    /// Next free leaf slot
    next_index: u64,
}

impl MerkleTreeWithHistory {
    /// Create an empty accumulator of the given height with a K-slot
    /// root-history window.
    pub fn new(height: usize, root_history_size: usize) -> Result<Self, MerkleError> {
        if height < 2 || height > MAX_TREE_HEIGHT {
            return Err(MerkleError::InvalidHeight(height));
        }
        if root_history_size == 0 {
            return Err(MerkleError::InvalidHistorySize(root_history_size));
        }

        let hasher = MerkleHasher::new(height);
        let filled_subtrees = (0..height).map(|l| *hasher.zero(l)).collect();

        let mut root_history = vec![ZERO_SENTINEL; root_history_size];
        root_history[0] = *hasher.zero(height);

        Ok(Self {
            height,
            hasher,
            filled_subtrees,
            root_history,
            current_root_index: 0,
            next_index: 0,
        })
    }

    /// Leaf capacity (2^height)
    pub fn capacity(&self) -> u64 {
        1u64 << self.height
    }

    /// Next free leaf position
    pub fn next_index(&self) -> u64 {
        self.next_index
    }

    /// Whether another pair of leaves fits
    pub fn can_insert_pair(&self) -> bool {
        self.next_index + 2 <= self.capacity()
    }

    /// The most recent root
    pub fn root(&self) -> [u8; 32] {
        self.root_history[self.current_root_index]
    }

    /// Insert two leaves and return the new root.
    ///
    /// The pair is combined at level 0, then hashed upward using the
    /// filled-subtree cache for left siblings and the empty-subtree chain
    /// for right siblings. The new root is written into the circular
    /// history buffer, evicting the (K-1)-old entry.
    pub fn insert_pair(
        &mut self,
        leaf_a: &[u8; 32],
        leaf_b: &[u8; 32],
    ) -> Result<[u8; 32], MerkleError> {
        if !self.can_insert_pair() {
            return Err(MerkleError::CapacityExhausted {
                capacity: self.capacity(),
            });
        }

        let mut current = self.hasher.hash_pair(leaf_a, leaf_b);
        let mut index = (self.next_index / 2) as usize;

        for level in 1..self.height {
            if index % 2 == 0 {
                // Left child: remember it and pad with the empty subtree
                self.filled_subtrees[level] = current;
                current = self.hasher.hash_pair(&current, self.hasher.zero(level));
            } else {
                // Right child: combine with the cached left sibling
                let left = self.filled_subtrees[level];
                current = self.hasher.hash_pair(&left, &current);
            }
            index /= 2;
        }

        self.next_index += 2;
        self.current_root_index = (self.current_root_index + 1) % self.root_history.len();
        self.root_history[self.current_root_index] = current;

        Ok(current)
    }

    /// True iff `root` is one of the last K roots.
    ///
    /// Never true for the zero sentinel, and false for any root already
    /// evicted from the window.
    pub fn is_known_root(&self, root: &[u8; 32]) -> bool {
        if *root == ZERO_SENTINEL {
            return false;
        }

        // Walk backwards from the cursor; stops after one full lap.
        let k = self.root_history.len();
        let mut i = self.current_root_index;
        for _ in 0..k {
            if self.root_history[i] == *root {
                return true;
            }
            i = if i == 0 { k - 1 } else { i - 1 };
        }
        false
    }
}
