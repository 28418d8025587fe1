//! Alchemy NFT API owners-by-contract client.

use crate::chain::fetch::{HttpClient, HttpError};
use crate::chain::source::{OwnerPage, OwnerSource};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ALCHEMY_NFT_URL: &str = "https://eth-mainnet.g.alchemy.com/nft/v3";

#[derive(Error, Debug)]
pub enum AlchemyError {
    #[error("request: {0}")]
    Http(#[from] HttpError),
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Owners are plain strings unless token balances were requested.
#[derive(Deserialize)]
#[serde(untagged)]
enum OwnerRecord {
    Plain(String),
    Detailed {
        #[serde(rename = "ownerAddress")]
        owner_address: String,
    },
}

#[derive(Deserialize)]
struct OwnersResponse {
    #[serde(default)]
    owners: Vec<OwnerRecord>,
    #[serde(rename = "pageKey", default)]
    page_key: Option<String>,
}

/// Parse a `getOwnersForContract` response body. An empty `pageKey` counts as absent.
pub fn parse_owner_page(body: &str) -> Result<OwnerPage, AlchemyError> {
    let resp: OwnersResponse = serde_json::from_str(body)?;
    let owners = resp
        .owners
        .into_iter()
        .map(|r| match r {
            OwnerRecord::Plain(a) => a,
            OwnerRecord::Detailed { owner_address } => owner_address,
        })
        .collect();
    Ok(OwnerPage {
        owners,
        page_key: resp.page_key.filter(|k| !k.is_empty()),
    })
}

pub struct AlchemyOwners {
    http: Arc<HttpClient>,
    base_url: String,
    api_key: String,
}

impl AlchemyOwners {
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

    fn url_for(&self, contract: &str, page_key: Option<&str>) -> String {
        let mut url = format!(
            "{}/{}/getOwnersForContract?contractAddress={}&withTokenBalances=false",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.api_key),
            urlencoding::encode(contract)
        );
        if let Some(key) = page_key {
            url.push_str("&pageKey=");
            url.push_str(&urlencoding::encode(key));
        }
        url
    }
}

#[async_trait]
impl OwnerSource for AlchemyOwners {
    type Error = AlchemyError;

    async fn owners_page(
        &self,
        contract: &str,
        page_key: Option<&str>,
    ) -> Result<OwnerPage, AlchemyError> {
        let body = self.http.get_text(&self.url_for(contract, page_key)).await?;
        let page = parse_owner_page(&body)?;
        debug!(
            owners = page.owners.len(),
            more = page.page_key.is_some(),
            "owners page"
        );
        Ok(page)
    }
}
