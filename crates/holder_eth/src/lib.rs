//! holder_eth — total ETH held by the holders of a fixed NFT collection at a point in time.
//!
//! Resolves a Unix timestamp to a block, enumerates every current owner of the
//! collection, then fetches each owner's balance at that block in paced batches.
//! Read-only; no keys beyond API credentials; no transaction signing.

pub mod chain;
pub mod config;
pub mod pipeline;

pub use chain::{
    Address, AlchemyOwners, BalanceSource, BlockRef, BlockResolver, EtherscanResolver,
    FailureKind, HttpClient, HttpConfig, OwnerPage, OwnerSource, RpcNode,
};
pub use config::{Settings, BAYC_CONTRACT};
pub use pipeline::{
    AggregateTotal, BalanceResult, BatchConfig, Pipeline, PipelineConfig, PipelineError,
    RetryPolicy, RunSummary,
};
