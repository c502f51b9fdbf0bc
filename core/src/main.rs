//! Veilpool dev service.
//!
//! Wires configuration, an in-memory token ledger, the shielded pool
//! and the bridge adapter into a running process. The relay channel is
//! exposed only in-process; a production deployment replaces the sender
//! side with a real L1 message relay.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::sync::{Mutex, mpsc};

use veilpool_config::VeilpoolConfig;
use veilpool_core::{BridgeAdapter, InMemoryTokenLedger, PoolLimits, ShieldedPool};
use veilpool_transaction::AccountId;

/// Dev-only balance minted to the escrow so relayed deposits can settle.
const DEV_ESCROW_BALANCE: u64 = 1_000_000_000_000;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = VeilpoolConfig::load().context("loading configuration")?;
    let limits = PoolLimits {
        min_withdrawal: config.pool.min_withdrawal,
        max_deposit: config.pool.max_deposit,
    };
    let escrow = AccountId(config.escrow_bytes()?);
    let channel_capacity = config.bridge.channel_capacity;

    let mut pool = ShieldedPool::from_config(&config).context("building pool")?;
    pool.initialize(limits)?;
    info!(
        "pool ready: height={} history={} root={}",
        config.tree.height,
        config.tree.root_history_size,
        hex::encode(pool.root())
    );

    let mut ledger = InMemoryTokenLedger::new(AccountId([0u8; 32]));
    ledger.mint(&escrow, DEV_ESCROW_BALANCE);

    let adapter = BridgeAdapter::new(
        Arc::new(Mutex::new(pool)),
        Arc::new(Mutex::new(ledger)),
        escrow,
    );
    let outbox = adapter.outbox();

    let (relay_tx, relay_rx) = mpsc::channel(channel_capacity);
    let adapter_task = tokio::spawn(adapter.run(relay_rx));

    info!("veilpool running; ctrl-c to stop");
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;

    // Closing the sender stops the adapter loop.
    drop(relay_tx);
    adapter_task.await.context("joining bridge adapter")?;

    let pending = outbox.lock().await.drain();
    if !pending.is_empty() {
        info!("{} withdrawal(s) left unsettled in the outbox", pending.len());
    }
    info!("shutdown complete");
    Ok(())
}
