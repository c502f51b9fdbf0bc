use serde::{Deserialize, Serialize};

use crate::AssetId;

/// One-shot deposit notification delivered by the external message relay.
///
/// `data` carries an encoded [`crate::ShieldedTransaction`]; the paired
/// token transfer of `amount` has already been escrowed by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgedDeposit {
    pub token: AssetId,
    pub amount: u64,
    pub data: Vec<u8>,
}

/// A withdrawal bound for L1 settlement through the bridge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct L1WithdrawRequest {
    pub to_l1_address: [u8; 32],
    pub amount: u64,
}
