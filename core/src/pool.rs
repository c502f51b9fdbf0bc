//! The shielded pool state machine.
//!
//! One pool custodies one asset. Shielded value lives as commitments in
//! a Merkle accumulator; spends publish nullifiers; net value enters or
//! leaves through a [`TokenLedger`].
//!
//! `transact` is strictly all-or-nothing. Validation runs front to
//! back, the single fallible external effect (the token movement) runs
//! next, and only then does the commit phase touch pool state. The
//! commit phase itself cannot fail: capacity and duplicates were ruled
//! out during validation.

use std::collections::HashSet;
use std::fs;

use anyhow::Context;
use log::{debug, info};

use veilpool_config::VeilpoolConfig;
use veilpool_privacy::{MerkleTreeWithHistory, Nullifier};
use veilpool_transaction::{
    AccountId, AssetId, BridgedDeposit, ShieldedTransaction, TransactionRecord,
};

use crate::error::PoolError;
use crate::nullifiers::NullifierSet;
use crate::token::{TokenError, TokenLedger};
use crate::verifier::{
    Groth16Verifier, TransactShape, TransactVerifiers, VerifierError, build_public_signals,
    LARGE_ARITY, SMALL_ARITY,
};

/// Economic bounds, set once at initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLimits {
    /// Net withdrawals below this are rejected as dust.
    pub min_withdrawal: u64,
    /// Net deposits above this are rejected.
    pub max_deposit: u64,
}

pub struct ShieldedPool {
    asset: AssetId,
    tree: MerkleTreeWithHistory,
    nullifiers: NullifierSet,
    /// Pool-side mirror of the custody balance; equals total deposits
    /// minus total withdrawals.
    custody: u64,
    limits: Option<PoolLimits>,
    verifiers: TransactVerifiers,
}

impl ShieldedPool {
    pub fn new(
        asset: AssetId,
        tree_height: usize,
        root_history_size: usize,
        verifiers: TransactVerifiers,
    ) -> Result<Self, PoolError> {
        Ok(Self {
            asset,
            tree: MerkleTreeWithHistory::new(tree_height, root_history_size)?,
            nullifiers: NullifierSet::new(),
            custody: 0,
            limits: None,
            verifiers,
        })
    }

    /// Build a pool from runtime configuration. Uses the mock verifier
    /// pair when the flag is set, otherwise loads both Groth16 verifying
    /// keys from disk.
    pub fn from_config(config: &VeilpoolConfig) -> anyhow::Result<Self> {
        let asset = AssetId(config.asset_bytes()?);

        let verifiers = if config.features.mock_verifier {
            info!("proof verification: mock (accepting any well-formed proof)");
            TransactVerifiers::mock()
        } else {
            let small_path = config
                .features
                .small_vk_path
                .as_deref()
                .context("small_vk_path required unless mock_verifier is set")?;
            let large_path = config
                .features
                .large_vk_path
                .as_deref()
                .context("large_vk_path required unless mock_verifier is set")?;

            let small_bytes = fs::read(small_path)
                .with_context(|| format!("reading verifying key {small_path}"))?;
            let large_bytes = fs::read(large_path)
                .with_context(|| format!("reading verifying key {large_path}"))?;

            info!("proof verification: Groth16 ({small_path}, {large_path})");
            TransactVerifiers::new(
                Box::new(Groth16Verifier::from_vk_bytes(&small_bytes, SMALL_ARITY)?),
                Box::new(Groth16Verifier::from_vk_bytes(&large_bytes, LARGE_ARITY)?),
            )
        };

        let pool = Self::new(
            asset,
            config.tree.height,
            config.tree.root_history_size,
            verifiers,
        )?;
        Ok(pool)
    }

    /// One-shot limit setup. The pool accepts no transactions before
    /// this and the limits cannot be changed afterwards.
    pub fn initialize(&mut self, limits: PoolLimits) -> Result<(), PoolError> {
        if self.limits.is_some() {
            return Err(PoolError::AlreadyInitialized);
        }
        info!(
            "pool initialized: min_withdrawal={} max_deposit={} asset={}",
            limits.min_withdrawal,
            limits.max_deposit,
            self.asset.to_hex()
        );
        self.limits = Some(limits);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.limits.is_some()
    }

    pub fn asset(&self) -> &AssetId {
        &self.asset
    }

    /// Latest accumulator root.
    pub fn root(&self) -> [u8; 32] {
        self.tree.root()
    }

    /// True iff `root` is within the recent-root window.
    pub fn is_known_root(&self, root: &[u8; 32]) -> bool {
        self.tree.is_known_root(root)
    }

    pub fn nullifier_count(&self) -> usize {
        self.nullifiers.len()
    }

    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.nullifiers.is_spent(nullifier)
    }

    /// Value the pool believes it custodies.
    pub fn custody_balance(&self) -> u64 {
        self.custody
    }

    /// Next free leaf position in the accumulator.
    pub fn next_index(&self) -> u64 {
        self.tree.next_index()
    }

    /// Validate and apply one shielded transaction.
    ///
    /// `source` funds a net deposit via `ledger.transfer_from`; it is
    /// ignored for transfers and withdrawals. On any `Err`, neither the
    /// ledger nor the pool changed.
    pub fn transact(
        &mut self,
        ledger: &mut dyn TokenLedger,
        source: &AccountId,
        tx: &ShieldedTransaction,
    ) -> Result<TransactionRecord, PoolError> {
        let limits = self.limits.ok_or(PoolError::NotInitialized)?;
        let ext = &tx.ext_data;

        // -- validation, no effects ---------------------------------

        if !self.tree.is_known_root(&ext.root) {
            return Err(PoolError::StaleRoot(ext.root));
        }

        let mut seen = HashSet::with_capacity(ext.input_nullifiers.len());
        for nullifier in &ext.input_nullifiers {
            if self.nullifiers.is_spent(nullifier) || !seen.insert(*nullifier) {
                return Err(PoolError::DoubleSpend(*nullifier));
            }
        }

        let shape = TransactShape::for_input_count(ext.input_nullifiers.len()).ok_or(
            PoolError::ShapeMismatch {
                inputs: ext.input_nullifiers.len(),
                max: LARGE_ARITY,
            },
        )?;

        let signals = build_public_signals(ext, shape);
        match self.verifiers.select(shape).verify(&tx.proof, &signals) {
            Ok(true) => {}
            Ok(false) | Err(VerifierError::MalformedProof) => {
                return Err(PoolError::InvalidProof);
            }
            Err(VerifierError::SignalCount { got, .. }) => {
                return Err(PoolError::ShapeMismatch {
                    inputs: got,
                    max: LARGE_ARITY,
                });
            }
            Err(VerifierError::MalformedKey) | Err(VerifierError::Backend(_)) => {
                return Err(PoolError::InvalidProof);
            }
        }

        let deposit = ext.deposit_amount();
        let withdrawal = ext.withdrawal_amount();

        if let Some(amount) = deposit {
            if amount > limits.max_deposit {
                return Err(PoolError::DepositAboveMaximum {
                    amount,
                    max_deposit: limits.max_deposit,
                });
            }
        }
        if let Some(amount) = withdrawal {
            if amount < limits.min_withdrawal {
                return Err(PoolError::WithdrawalBelowMinimum {
                    amount,
                    min_withdrawal: limits.min_withdrawal,
                });
            }
        }

        if !self.tree.can_insert_pair() {
            return Err(PoolError::CapacityExhausted {
                capacity: self.tree.capacity(),
            });
        }

        // Custody arithmetic is checked before the ledger moves, so an
        // overflow cannot strand tokens mid-transaction.
        let new_custody = match (deposit, withdrawal) {
            (Some(amount), _) => self
                .custody
                .checked_add(amount)
                .ok_or_else(|| {
                    PoolError::Token(TokenError::BalanceOverflow {
                        account: source.to_hex(),
                    })
                })?,
            (_, Some(amount)) => self
                .custody
                .checked_sub(amount)
                .ok_or_else(|| {
                    PoolError::Token(TokenError::InsufficientBalance {
                        account: ext.recipient.to_hex(),
                        balance: self.custody,
                        needed: amount,
                    })
                })?,
            (None, None) => self.custody,
        };

        // -- token movement: the last fallible step -----------------

        if let Some(amount) = deposit {
            ledger.transfer_from(source, amount)?;
        } else if let Some(amount) = withdrawal {
            ledger.transfer(&ext.recipient, amount)?;
        }

        // -- commit: cannot fail from here --------------------------

        for nullifier in &ext.input_nullifiers {
            self.nullifiers.insert(*nullifier);
        }

        let position = self.tree.next_index();
        let [out_a, out_b] = &ext.output_commitments;
        let new_root = self.tree.insert_pair(&out_a.0, &out_b.0)?;
        self.custody = new_custody;

        debug!(
            "transact: {} inputs, public_amount={}, new_root={}",
            ext.input_nullifiers.len(),
            ext.public_amount,
            hex::encode(new_root)
        );

        Ok(TransactionRecord {
            new_root,
            commitments: vec![(position, *out_a), (position + 1, *out_b)],
            nullifiers: ext.input_nullifiers.clone(),
            public_amount: ext.public_amount,
            recipient: ext.recipient,
        })
    }

    /// Accept a deposit delivered over the bridge.
    ///
    /// The escrow account already holds the bridged tokens; this checks
    /// the asset and the delivered amount against the embedded payload,
    /// then runs the ordinary `transact` path with escrow as the source.
    pub fn on_bridged_deposit(
        &mut self,
        ledger: &mut dyn TokenLedger,
        escrow: &AccountId,
        deposit: &BridgedDeposit,
    ) -> Result<TransactionRecord, PoolError> {
        if deposit.token != self.asset {
            return Err(PoolError::AssetMismatch {
                expected: self.asset,
                got: deposit.token,
            });
        }

        let tx = ShieldedTransaction::decode(&deposit.data)?;

        if tx.ext_data.deposit_amount() != Some(deposit.amount) {
            return Err(PoolError::BridgeAmountMismatch {
                delivered: deposit.amount,
                claimed: tx.ext_data.public_amount,
            });
        }

        self.transact(ledger, escrow, &tx)
    }
}
