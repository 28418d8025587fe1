//! Backend traits consumed by the pipeline. Real clients and test doubles implement these.

use crate::chain::normalize::{Address, BlockRef};
use alloy::primitives::U256;
use async_trait::async_trait;

/// How a failed balance query should be treated by the retry loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Other,
}

/// Time → block resolution.
#[async_trait]
pub trait BlockResolver: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Last block mined at or before `epoch` (seconds).
    async fn resolve(&self, epoch: u64) -> Result<BlockRef, Self::Error>;
}

/// One page of owners as returned by the index.
#[derive(Clone, Debug, Default)]
pub struct OwnerPage {
    /// Owner addresses as the index returned them (not yet normalized).
    pub owners: Vec<String>,
    /// Continuation cursor; `None` on the last page.
    pub page_key: Option<String>,
}

/// Paginated owners-by-contract index.
#[async_trait]
pub trait OwnerSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    async fn owners_page(
        &self,
        contract: &str,
        page_key: Option<&str>,
    ) -> Result<OwnerPage, Self::Error>;
}

/// Historical native balance lookups.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Balance in wei of `address` at `block`.
    async fn balance_at(&self, address: &Address, block: BlockRef) -> Result<U256, Self::Error>;

    /// Classify a failure for the retry loop.
    fn classify(&self, err: &Self::Error) -> FailureKind;
}
