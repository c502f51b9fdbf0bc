//! Token custody boundary.
//!
//! The pool never mints or burns; it only moves previously issued
//! balances between external accounts and its own custody account. The
//! [`TokenLedger`] trait is that boundary: deposits pull from a source
//! account into custody, withdrawals push from custody to a recipient.

use std::collections::HashMap;

use thiserror::Error;
use veilpool_transaction::AccountId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("account {account} holds {balance}, transfer needs {needed}")]
    InsufficientBalance {
        account: String,
        balance: u64,
        needed: u64,
    },
    #[error("balance overflow on account {account}")]
    BalanceOverflow { account: String },
}

/// Ledger operations the pool requires. Implementations settle
/// atomically per call: on `Err`, no balance moved.
pub trait TokenLedger {
    /// Pull `amount` from `owner` into the pool's custody account.
    fn transfer_from(&mut self, owner: &AccountId, amount: u64) -> Result<(), TokenError>;

    /// Push `amount` from the pool's custody account to `recipient`.
    fn transfer(&mut self, recipient: &AccountId, amount: u64) -> Result<(), TokenError>;

    /// Current balance of an account.
    fn balance_of(&self, account: &AccountId) -> u64;
}

/// Single-asset ledger keyed by account, bound to one pool custody
/// account at construction.
#[derive(Debug, Clone)]
pub struct InMemoryTokenLedger {
    custody: AccountId,
    balances: HashMap<AccountId, u64>,
}

impl InMemoryTokenLedger {
    pub fn new(custody: AccountId) -> Self {
        Self {
            custody,
            balances: HashMap::new(),
        }
    }

    /// Issue balance out of thin air, saturating at `u64::MAX`. Test
    /// and dev wiring only; the pool itself never calls this.
    pub fn mint(&mut self, account: &AccountId, amount: u64) {
        let balance = self.balances.entry(*account).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn custody_account(&self) -> &AccountId {
        &self.custody
    }

    fn move_balance(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: u64,
    ) -> Result<(), TokenError> {
        let from_balance = self.balance_of(from);
        let new_from = from_balance
            .checked_sub(amount)
            .ok_or_else(|| TokenError::InsufficientBalance {
                account: from.to_hex(),
                balance: from_balance,
                needed: amount,
            })?;
        let to_balance = self.balance_of(to);
        let new_to = to_balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::BalanceOverflow {
                account: to.to_hex(),
            })?;

        self.balances.insert(*from, new_from);
        self.balances.insert(*to, new_to);
        Ok(())
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn transfer_from(&mut self, owner: &AccountId, amount: u64) -> Result<(), TokenError> {
        let custody = self.custody;
        self.move_balance(owner, &custody, amount)
    }

    fn transfer(&mut self, recipient: &AccountId, amount: u64) -> Result<(), TokenError> {
        let custody = self.custody;
        self.move_balance(&custody, recipient, amount)
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(id: u8) -> AccountId {
        AccountId([id; 32])
    }

    #[test]
    fn test_deposit_withdraw_roundtrip() {
        let mut ledger = InMemoryTokenLedger::new(account(0));
        ledger.mint(&account(1), 100);

        ledger.transfer_from(&account(1), 60).unwrap();
        assert_eq!(ledger.balance_of(&account(0)), 60);
        assert_eq!(ledger.balance_of(&account(1)), 40);

        ledger.transfer(&account(2), 25).unwrap();
        assert_eq!(ledger.balance_of(&account(0)), 35);
        assert_eq!(ledger.balance_of(&account(2)), 25);
    }

    #[test]
    fn test_mint_saturates() {
        let mut ledger = InMemoryTokenLedger::new(account(0));
        ledger.mint(&account(1), u64::MAX - 5);
        ledger.mint(&account(1), 100);
        assert_eq!(ledger.balance_of(&account(1)), u64::MAX);
    }

    #[test]
    fn test_insufficient_balance_moves_nothing() {
        let mut ledger = InMemoryTokenLedger::new(account(0));
        ledger.mint(&account(1), 10);

        let err = ledger.transfer_from(&account(1), 11).unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { balance: 10, needed: 11, .. }));
        assert_eq!(ledger.balance_of(&account(1)), 10);
        assert_eq!(ledger.balance_of(&account(0)), 0);
    }
}
