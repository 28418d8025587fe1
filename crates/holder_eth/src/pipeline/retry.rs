//! Per-address balance fetch with exponential backoff on rate limiting.

use crate::chain::{ether_value, Address, BalanceSource, BlockRef, FailureKind};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 1_000;

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Rate-limit wait after attempt `n` (1-based) is `base_delay * 2^n`.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Balance of one address at one block. `degraded` marks a fetch that gave up;
/// its `eth` is 0, same as a genuinely empty account.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BalanceResult {
    pub address: Address,
    pub block: BlockRef,
    pub eth: f64,
    pub degraded: bool,
}

/// Fetch `address`'s balance at `block`, retrying up to `policy.max_attempts` times.
/// Never fails: exhaustion yields a zero, degraded result.
pub async fn fetch_balance<B: BalanceSource>(
    source: &B,
    address: &Address,
    block: BlockRef,
    policy: &RetryPolicy,
) -> BalanceResult {
    for attempt in 1..=policy.max_attempts {
        match source.balance_at(address, block).await {
            Ok(wei) => match ether_value(wei) {
                Ok(eth) => {
                    return BalanceResult {
                        address: address.clone(),
                        block,
                        eth,
                        degraded: false,
                    };
                }
                Err(e) => warn!(%address, attempt, error = %e, "balance fetch failed"),
            },
            Err(e) => match source.classify(&e) {
                FailureKind::RateLimited => {
                    let delay = policy.delay_for(attempt);
                    warn!(
                        %address,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                FailureKind::Other => {
                    warn!(%address, attempt, error = %e, "balance fetch failed");
                }
            },
        }
    }
    warn!(%address, attempts = policy.max_attempts, "giving up, counting balance as 0");
    BalanceResult {
        address: address.clone(),
        block,
        eth: 0.0,
        degraded: true,
    }
}
