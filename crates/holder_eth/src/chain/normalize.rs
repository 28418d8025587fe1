//! Normalization of addresses, block numbers, balances and epoch input.

use alloy::primitives::utils::format_ether;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("invalid epoch: {0}")]
    InvalidEpoch(String),
    #[error("unreadable balance: {0}")]
    InvalidBalance(String),
}

/// Account address, lowercased. Two addresses are equal iff their lowercased forms are.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Address {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<Address> for String {
    fn from(a: Address) -> Self {
        a.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Historical block number. Immutable once resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockRef(pub u64);

impl BlockRef {
    pub fn number(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parse a positive decimal epoch (seconds). Rejects zero, signs and non-digits.
pub fn parse_epoch(s: &str) -> Result<u64, NormalizeError> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NormalizeError::InvalidEpoch(s.to_string()));
    }
    match s.parse::<u64>() {
        Ok(0) | Err(_) => Err(NormalizeError::InvalidEpoch(s.to_string())),
        Ok(epoch) => Ok(epoch),
    }
}

/// Render epoch seconds as RFC3339 for log lines.
pub fn epoch_to_rfc3339(epoch: u64) -> Result<String, NormalizeError> {
    let secs = i64::try_from(epoch).map_err(|_| NormalizeError::InvalidEpoch(epoch.to_string()))?;
    let dt = OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|e| NormalizeError::InvalidEpoch(e.to_string()))?;
    dt.format(&Rfc3339)
        .map_err(|e| NormalizeError::InvalidEpoch(e.to_string()))
}

/// Whole ETH from wei, read back from alloy's exact 18-decimal rendering.
pub fn ether_value(wei: U256) -> Result<f64, NormalizeError> {
    let rendered = format_ether(wei);
    rendered
        .parse()
        .map_err(|_| NormalizeError::InvalidBalance(rendered))
}
