//! Remote clients (block explorer, NFT index, JSON-RPC node) and the traits the pipeline drives.

pub(crate) mod alchemy;
pub(crate) mod etherscan;
mod fetch;
mod normalize;
pub(crate) mod rpc;
mod source;

pub use alchemy::{parse_owner_page, AlchemyError, AlchemyOwners};
pub use etherscan::{parse_block_response, EtherscanResolver, ResolveError};
pub use fetch::{HttpClient, HttpConfig, HttpError};
pub use normalize::{
    epoch_to_rfc3339, ether_value, parse_epoch, Address, BlockRef, NormalizeError,
};
pub use rpc::{RpcError, RpcNode};
pub use source::{BalanceSource, BlockResolver, FailureKind, OwnerPage, OwnerSource};
