//! Pending-ledger mint batching.
//!
//! Entries worth minting are partitioned into fixed-size batches and
//! submitted sequentially: the first batch lets the sink pick the chain
//! nonce, every later batch uses the previous nonce plus one, with a
//! pause between submissions.

use std::time::Duration;

use ember_core::types::{Amount, RewardLedger};
use ember_core::{Address, EmberError};

use crate::ports::{MintReceipt, MintSink};

/// Partition pending entries strictly above `min_amount` into batches of
/// at most `batch_size`, in address order.
pub fn plan_batches(
    pending: &RewardLedger,
    min_amount: Amount,
    batch_size: usize,
) -> Vec<Vec<(Address, Amount)>> {
    let eligible: Vec<(Address, Amount)> = pending
        .iter()
        .filter(|(_, amount)| *amount > min_amount)
        .map(|(address, amount)| (address.clone(), amount))
        .collect();

    eligible
        .chunks(batch_size.max(1))
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// Submit planned batches through the sink, sequencing nonces.
pub async fn mint_pending(
    sink: &dyn MintSink,
    batches: &[Vec<(Address, Amount)>],
    pause: Duration,
) -> Result<Vec<MintReceipt>, EmberError> {
    let mut receipts = Vec::with_capacity(batches.len());
    let mut nonce: Option<u64> = None;

    for (index, batch) in batches.iter().enumerate() {
        let receipt = sink.mint_batch(batch, nonce).await?;
        tracing::info!(
            batch = index,
            items = batch.len(),
            tx = %receipt.tx_id,
            nonce = receipt.nonce,
            "submitted mint batch"
        );
        nonce = Some(receipt.nonce + 1);
        receipts.push(receipt);

        if index + 1 < batches.len() && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
    Ok(receipts)
}
