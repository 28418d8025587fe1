//! Ethereum JSON-RPC node client (`eth_getBalance` at a historical block).

use crate::chain::normalize::{Address, BlockRef};
use crate::chain::source::{BalanceSource, FailureKind};
use alloy::eips::BlockId;
use alloy::primitives::{self, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::transports::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

const HTTP_TOO_MANY_REQUESTS: u16 = 429;
/// Non-standard "limit exceeded" code used by several node providers.
const RPC_LIMIT_EXCEEDED: i64 = -32005;

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("invalid node url {0:?}: {1}")]
    Url(String, url::ParseError),
    #[error("invalid address: {0}")]
    Address(String),
    #[error("rpc: {0}")]
    Transport(#[from] TransportError),
}

impl RpcError {
    pub fn is_rate_limited(&self) -> bool {
        let RpcError::Transport(err) = self else {
            return false;
        };
        match err {
            TransportError::ErrorResp(payload) => {
                payload.code == i64::from(HTTP_TOO_MANY_REQUESTS)
                    || payload.code == RPC_LIMIT_EXCEEDED
            }
            TransportError::Transport(TransportErrorKind::HttpError(http)) => {
                http.status == HTTP_TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

pub struct RpcNode {
    provider: DynProvider,
}

impl RpcNode {
    /// HTTP provider for `url`. Fails only if `url` does not parse.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        let rpc_url: Url = url.parse().map_err(|e| RpcError::Url(url.to_string(), e))?;
        Ok(Self::from_provider(
            ProviderBuilder::new().connect_http(rpc_url).erased(),
        ))
    }

    pub fn from_provider(provider: DynProvider) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl BalanceSource for RpcNode {
    type Error = RpcError;

    async fn balance_at(&self, address: &Address, block: BlockRef) -> Result<U256, RpcError> {
        let owner: primitives::Address = address
            .as_str()
            .parse()
            .map_err(|_| RpcError::Address(address.to_string()))?;
        let wei = self
            .provider
            .get_balance(owner)
            .block_id(BlockId::number(block.number()))
            .await?;
        Ok(wei)
    }

    fn classify(&self, err: &RpcError) -> FailureKind {
        if err.is_rate_limited() {
            FailureKind::RateLimited
        } else {
            FailureKind::Other
        }
    }
}
