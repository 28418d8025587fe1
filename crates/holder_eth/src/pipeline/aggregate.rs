//! Summation of per-address balances.

use crate::pipeline::retry::BalanceResult;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct AggregateTotal {
    /// Sum of all balances, in ETH. Degraded results contribute 0.
    pub eth: f64,
    /// Number of balances summed.
    pub holders: usize,
    /// Results whose fetch exhausted its retries.
    pub degraded: usize,
}

/// Sum `results`. No filtering; order does not matter beyond float rounding.
pub fn total(results: &[BalanceResult]) -> AggregateTotal {
    results.iter().fold(AggregateTotal::default(), |mut acc, r| {
        acc.eth += r.eth;
        acc.holders += 1;
        if r.degraded {
            acc.degraded += 1;
        }
        acc
    })
}
