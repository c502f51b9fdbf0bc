//! Bridge adapter.
//!
//! Inbound: an async loop draining relay messages from an mpsc channel
//! into `ShieldedPool::on_bridged_deposit`, funded by the escrow
//! account. Rejected deposits are logged and dropped; the escrowed
//! tokens stay put for out-of-band recovery.
//!
//! Outbound: net withdrawals submitted through the adapter are queued
//! in the [`WithdrawalOutbox`] for the relay to settle on L1.

use std::collections::VecDeque;
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::{Mutex, mpsc};

use veilpool_transaction::{
    AccountId, BridgedDeposit, L1WithdrawRequest, ShieldedTransaction, TransactionRecord,
};

use crate::error::PoolError;
use crate::pool::ShieldedPool;
use crate::token::TokenLedger;

/// Withdrawals awaiting L1 settlement, in submission order.
#[derive(Debug, Default)]
pub struct WithdrawalOutbox {
    pending: VecDeque<L1WithdrawRequest>,
}

impl WithdrawalOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the withdrawal half of a transaction record, if it has one.
    pub fn collect(&mut self, record: &TransactionRecord) {
        if let Some(amount) = record
            .public_amount
            .is_negative()
            .then(|| record.public_amount.unsigned_abs())
        {
            self.pending.push_back(L1WithdrawRequest {
                to_l1_address: record.recipient.0,
                amount,
            });
        }
    }

    /// Hand all queued withdrawals to the relay.
    pub fn drain(&mut self) -> Vec<L1WithdrawRequest> {
        self.pending.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Connects the pool to the external message relay.
pub struct BridgeAdapter<L: TokenLedger> {
    pool: Arc<Mutex<ShieldedPool>>,
    ledger: Arc<Mutex<L>>,
    escrow: AccountId,
    outbox: Arc<Mutex<WithdrawalOutbox>>,
}

impl<L: TokenLedger> BridgeAdapter<L> {
    pub fn new(
        pool: Arc<Mutex<ShieldedPool>>,
        ledger: Arc<Mutex<L>>,
        escrow: AccountId,
    ) -> Self {
        Self {
            pool,
            ledger,
            escrow,
            outbox: Arc::new(Mutex::new(WithdrawalOutbox::new())),
        }
    }

    /// Shared handle to the outbound withdrawal queue.
    pub fn outbox(&self) -> Arc<Mutex<WithdrawalOutbox>> {
        Arc::clone(&self.outbox)
    }

    /// Apply one relayed deposit against the pool.
    pub async fn deliver(&self, deposit: &BridgedDeposit) -> Result<TransactionRecord, PoolError> {
        let mut pool = self.pool.lock().await;
        let mut ledger = self.ledger.lock().await;
        pool.on_bridged_deposit(&mut *ledger, &self.escrow, deposit)
    }

    /// Submit a locally proven transaction (transfer or withdrawal);
    /// net withdrawals land in the outbox for L1 settlement.
    pub async fn submit(&self, tx: &ShieldedTransaction) -> Result<TransactionRecord, PoolError> {
        let record = {
            let mut pool = self.pool.lock().await;
            let mut ledger = self.ledger.lock().await;
            pool.transact(&mut *ledger, &self.escrow, tx)?
        };
        self.outbox.lock().await.collect(&record);
        Ok(record)
    }

    /// Drain relay messages until the channel closes. Rejections are
    /// logged; the loop never aborts on a bad message.
    pub async fn run(self, mut relay: mpsc::Receiver<BridgedDeposit>) {
        info!("bridge adapter: listening for relayed deposits");
        while let Some(deposit) = relay.recv().await {
            match self.deliver(&deposit).await {
                Ok(record) => {
                    info!(
                        "bridged deposit accepted: amount={} new_root={}",
                        deposit.amount,
                        hex::encode(record.new_root)
                    );
                }
                Err(err) => {
                    warn!("bridged deposit rejected: {err}");
                }
            }
        }
        info!("bridge adapter: relay channel closed, stopping");
    }
}
