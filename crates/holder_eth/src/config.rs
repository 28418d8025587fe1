//! Runtime settings: API credentials and endpoints.
//!
//! Read from the environment (the CLI loads `.env` first). Nothing here fails:
//! a missing key becomes an empty string and surfaces later as an
//! authentication error from the service, or for `ETHEREUM_RPC` as an invalid
//! node URL when the node client is built.
//!
//! Variables: `ETHERSCAN_API_KEY`, `ALCHEMY_API_KEY`, `ETHEREUM_RPC`, and the
//! optional endpoint overrides `ETHERSCAN_API_URL`, `ALCHEMY_NFT_URL`.

use crate::chain::alchemy::DEFAULT_ALCHEMY_NFT_URL;
use crate::chain::etherscan::DEFAULT_ETHERSCAN_URL;
use tracing::warn;
use url::Url;

/// Bored Ape Yacht Club (ERC-721).
pub const BAYC_CONTRACT: &str = "0xbc4ca0eda7647a8ab7c2061c2e118a18a936f13d";

pub const ETHERSCAN_API_KEY: &str = "ETHERSCAN_API_KEY";
pub const ALCHEMY_API_KEY: &str = "ALCHEMY_API_KEY";
pub const ETHEREUM_RPC: &str = "ETHEREUM_RPC";
pub const ETHERSCAN_API_URL: &str = "ETHERSCAN_API_URL";
pub const ALCHEMY_NFT_URL: &str = "ALCHEMY_NFT_URL";

#[derive(Clone, Debug)]
pub struct Settings {
    pub etherscan_url: String,
    pub etherscan_api_key: String,
    pub alchemy_url: String,
    pub alchemy_api_key: String,
    pub rpc_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            etherscan_url: DEFAULT_ETHERSCAN_URL.to_string(),
            etherscan_api_key: String::new(),
            alchemy_url: DEFAULT_ALCHEMY_NFT_URL.to_string(),
            alchemy_api_key: String::new(),
            rpc_url: String::new(),
        }
    }
}

impl Settings {
    /// Load from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through an arbitrary lookup (used by tests instead of mutating the environment).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        let defaults = Self::default();
        Self {
            etherscan_url: endpoint(
                ETHERSCAN_API_URL,
                &get(ETHERSCAN_API_URL),
                &defaults.etherscan_url,
            ),
            etherscan_api_key: get(ETHERSCAN_API_KEY),
            alchemy_url: endpoint(ALCHEMY_NFT_URL, &get(ALCHEMY_NFT_URL), &defaults.alchemy_url),
            alchemy_api_key: get(ALCHEMY_API_KEY),
            rpc_url: get(ETHEREUM_RPC),
        }
    }

    /// Names of required variables that are unset or empty.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.etherscan_api_key.is_empty() {
            out.push(ETHERSCAN_API_KEY);
        }
        if self.alchemy_api_key.is_empty() {
            out.push(ALCHEMY_API_KEY);
        }
        if self.rpc_url.is_empty() {
            out.push(ETHEREUM_RPC);
        }
        out
    }
}

/// Use `raw` if it parses as a URL, else fall back to `default`.
fn endpoint(name: &str, raw: &str, default: &str) -> String {
    if raw.is_empty() {
        return default.to_string();
    }
    match Url::parse(raw) {
        Ok(_) => raw.to_string(),
        Err(e) => {
            warn!(var = name, error = %e, "invalid endpoint override, using default");
            default.to_string()
        }
    }
}
