//! Fixed-size batches: concurrent within a batch, sequential across batches.

use crate::chain::{Address, BalanceSource, BlockRef};
use crate::pipeline::retry::{fetch_balance, BalanceResult, RetryPolicy};
use futures::future::join_all;
use std::time::Duration;
use tracing::info;

const DEFAULT_BATCH_SIZE: usize = 30;
const DEFAULT_BATCH_PAUSE_MS: u64 = 500;

#[derive(Clone, Debug)]
pub struct BatchConfig {
    /// Concurrent fetches per batch. 0 is treated as 1.
    pub batch_size: usize,
    /// Pause between consecutive batches; none after the last.
    pub pause: Duration,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            pause: Duration::from_millis(DEFAULT_BATCH_PAUSE_MS),
        }
    }
}

/// Fetch every balance, `batch_size` at a time. Output order matches `addresses`.
pub async fn run_batches<B: BalanceSource>(
    source: &B,
    addresses: &[Address],
    block: BlockRef,
    batch: &BatchConfig,
    retry: &RetryPolicy,
) -> Vec<BalanceResult> {
    let size = batch.batch_size.max(1);
    let total = addresses.len();
    let mut results = Vec::with_capacity(total);

    for (i, chunk) in addresses.chunks(size).enumerate() {
        let balances = join_all(
            chunk
                .iter()
                .map(|addr| fetch_balance(source, addr, block, retry)),
        )
        .await;
        results.extend(balances);

        let done = results.len();
        info!(batch = i + 1, checked = done, total, "checked {done} of {total} holders");
        if done < total && !batch.pause.is_zero() {
            tokio::time::sleep(batch.pause).await;
        }
    }
    results
}
