//! Resolve → enumerate → batched balances → total.

mod aggregate;
mod batch;
mod owners;
mod retry;
#[cfg(test)]
pub(crate) mod testutil;

pub use aggregate::{total, AggregateTotal};
pub use batch::{run_batches, BatchConfig};
pub use owners::{enumerate_owners, EnumerateError, DEFAULT_MAX_PAGES};
pub use retry::{fetch_balance, BalanceResult, RetryPolicy};

use crate::chain::{epoch_to_rfc3339, BalanceSource, BlockRef, BlockResolver, OwnerSource};
use crate::config::BAYC_CONTRACT;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("block resolution: {0}")]
    Resolve(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("owner enumeration: {0}")]
    Enumerate(#[from] EnumerateError),
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub batch: BatchConfig,
    pub retry: RetryPolicy,
    pub max_pages: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch: BatchConfig::default(),
            retry: RetryPolicy::default(),
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// Outcome of one run.
#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub epoch: u64,
    pub block: BlockRef,
    pub total: AggregateTotal,
}

/// The full fetch pipeline over injected backends.
pub struct Pipeline<R, O, B> {
    resolver: R,
    owners: O,
    balances: B,
    contract: String,
    config: PipelineConfig,
}

impl<R, O, B> Pipeline<R, O, B>
where
    R: BlockResolver,
    O: OwnerSource,
    B: BalanceSource,
{
    pub fn new(resolver: R, owners: O, balances: B, config: PipelineConfig) -> Self {
        Self {
            resolver,
            owners,
            balances,
            contract: BAYC_CONTRACT.to_string(),
            config,
        }
    }

    #[cfg(test)]
    fn contract(&self) -> &str {
        &self.contract
    }

    #[cfg(test)]
    fn balances(&self) -> &B {
        &self.balances
    }

    /// Run every stage for `epoch`. Only per-address fetch failures are absorbed;
    /// resolution and enumeration failures abort the run.
    pub async fn run(&self, epoch: u64) -> Result<RunSummary, PipelineError> {
        let when = epoch_to_rfc3339(epoch).unwrap_or_else(|_| "out of range".to_string());
        info!(epoch, %when, "converting epoch to block number");
        let block = self
            .resolver
            .resolve(epoch)
            .await
            .map_err(|e| PipelineError::Resolve(Box::new(e)))?;
        info!(block = block.number(), "block number");

        info!(contract = %self.contract, "fetching all holders");
        let holders = enumerate_owners(&self.owners, &self.contract, self.config.max_pages).await?;
        info!(holders = holders.len(), "found holders");

        info!(block = block.number(), "fetching ETH balances");
        let results = run_batches(
            &self.balances,
            &holders,
            block,
            &self.config.batch,
            &self.config.retry,
        )
        .await;
        let sum = total(&results);
        info!(
            eth = sum.eth,
            holders = sum.holders,
            degraded = sum.degraded,
            "aggregation complete"
        );
        Ok(RunSummary {
            epoch,
            block,
            total: sum,
        })
    }
}
