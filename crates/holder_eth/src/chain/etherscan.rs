//! Etherscan-compatible block-by-timestamp lookup.

use crate::chain::fetch::{HttpClient, HttpError};
use crate::chain::normalize::BlockRef;
use crate::chain::source::BlockResolver;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_ETHERSCAN_URL: &str = "https://api.etherscan.io/v2/api";
const MAINNET_CHAIN_ID: u64 = 1;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("request: {0}")]
    Http(#[from] HttpError),
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("etherscan error: {0}")]
    Api(String),
    #[error("no block in response")]
    NoResult,
    #[error("invalid block number: {0}")]
    InvalidBlock(String),
}

#[derive(Deserialize)]
struct EtherscanResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<serde_json::Value>,
}

/// Parse a `getblocknobytime` response body. Anything but `status == "1"` with a
/// decimal block number in `result` is an error.
pub fn parse_block_response(body: &str) -> Result<BlockRef, ResolveError> {
    let resp: EtherscanResponse = serde_json::from_str(body)?;
    if resp.status != "1" {
        // On failure Etherscan puts the detail in `result` and a summary in `message`.
        let detail = match (resp.message, resp.result) {
            (_, Some(serde_json::Value::String(r))) if !r.is_empty() => r,
            (Some(m), _) if !m.is_empty() => m,
            _ => "unknown error".to_string(),
        };
        return Err(ResolveError::Api(detail));
    }
    let raw = match resp.result {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => return Err(ResolveError::NoResult),
    };
    raw.trim()
        .parse::<u64>()
        .map(BlockRef)
        .map_err(|_| ResolveError::InvalidBlock(raw))
}

/// Resolves timestamps with `closest=before` semantics.
pub struct EtherscanResolver {
    http: Arc<HttpClient>,
    base_url: String,
    api_key: String,
}

impl EtherscanResolver {
    pub fn new(
        http: Arc<HttpClient>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn url_for(&self, epoch: u64) -> String {
        format!(
            "{}?chainid={}&module=block&action=getblocknobytime\
             &timestamp={}&closest=before&apikey={}",
            self.base_url.trim_end_matches('/'),
            MAINNET_CHAIN_ID,
            epoch,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl BlockResolver for EtherscanResolver {
    type Error = ResolveError;

    async fn resolve(&self, epoch: u64) -> Result<BlockRef, ResolveError> {
        debug!(epoch, "getblocknobytime");
        let body = self.http.get_text(&self.url_for(epoch)).await?;
        let block = parse_block_response(&body)?;
        info!(epoch, block = block.number(), "resolved block");
        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::fetch::HttpConfig;

    #[test]
    fn parse_ok() {
        let body = r#"{"status":"1","message":"OK","result":"12712551"}"#;
        assert_eq!(parse_block_response(body).unwrap(), BlockRef(12_712_551));
    }

    #[test]
    fn parse_numeric_result() {
        let body = r#"{"status":"1","message":"OK","result":17000000}"#;
        assert_eq!(parse_block_response(body).unwrap(), BlockRef(17_000_000));
    }

    #[test]
    fn parse_api_error_keeps_detail() {
        let body = r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#;
        match parse_block_response(body) {
            Err(ResolveError::Api(msg)) => assert_eq!(msg, "Invalid API Key"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn parse_missing_result() {
        let body = r#"{"status":"1","message":"OK"}"#;
        assert!(matches!(parse_block_response(body), Err(ResolveError::NoResult)));
        let body = r#"{"status":"1","message":"OK","result":""}"#;
        assert!(matches!(parse_block_response(body), Err(ResolveError::NoResult)));
    }

    #[test]
    fn parse_non_numeric_block() {
        let body = r#"{"status":"1","message":"OK","result":"Error! No closest block found"}"#;
        assert!(matches!(
            parse_block_response(body),
            Err(ResolveError::InvalidBlock(_))
        ));
    }

    #[test]
    fn parse_garbage_body() {
        assert!(matches!(
            parse_block_response("<html>502</html>"),
            Err(ResolveError::Parse(_))
        ));
    }

    #[test]
    fn url_has_closest_before_and_encoded_key() {
        let http = Arc::new(HttpClient::new(HttpConfig::default()).unwrap());
        let r = EtherscanResolver::new(http, "https://api.example/v2/api/", "k&y");
        let url = r.url_for(1_700_000_000);
        assert!(url.starts_with("https://api.example/v2/api?chainid=1&"));
        assert!(url.contains("timestamp=1700000000"));
        assert!(url.contains("closest=before"));
        assert!(url.ends_with("apikey=k%26y"));
    }
}
