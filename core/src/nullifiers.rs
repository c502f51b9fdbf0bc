//! Spent-nullifier bookkeeping.
//!
//! Append-only set; a nullifier that enters never leaves. Double-spend
//! rejection is a lookup here, nothing else.

use std::collections::HashSet;

use veilpool_privacy::Nullifier;

use crate::error::PoolError;

#[derive(Debug, Default, Clone)]
pub struct NullifierSet {
    spent: HashSet<Nullifier>,
}

impl NullifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_spent(&self, nullifier: &Nullifier) -> bool {
        self.spent.contains(nullifier)
    }

    /// Fails if the nullifier is already in the set.
    pub fn mark_spent(&mut self, nullifier: Nullifier) -> Result<(), PoolError> {
        if !self.spent.insert(nullifier) {
            return Err(PoolError::DoubleSpend(nullifier));
        }
        Ok(())
    }

    /// Unconditional insert for the commit phase, after validation has
    /// already ruled out duplicates.
    pub(crate) fn insert(&mut self, nullifier: Nullifier) {
        self.spent.insert(nullifier);
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
