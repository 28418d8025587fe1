//! In-memory backends for pipeline tests.

use crate::chain::{
    Address, BalanceSource, BlockRef, BlockResolver, FailureKind, OwnerPage, OwnerSource,
};
use alloy::primitives::U256;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MockError {
    #[error("rate limited")]
    RateLimited,
    #[error("node down")]
    Down,
    #[error("no block before {0}")]
    NoBlock(u64),
}

/// Scripted balances in wei per address. Each call pops the next outcome; the
/// last outcome repeats. Unknown addresses hold 0 wei.
#[derive(Default)]
pub struct MockBalances {
    script: Mutex<HashMap<String, VecDeque<Result<u128, MockError>>>>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    blocks: Mutex<Vec<BlockRef>>,
}

impl MockBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, address: &str, outcomes: Vec<Result<u128, MockError>>) -> Self {
        if let Ok(mut s) = self.script.lock() {
            s.insert(address.to_lowercase(), outcomes.into());
        }
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn blocks_seen(&self) -> Vec<BlockRef> {
        self.blocks.lock().map(|b| b.clone()).unwrap_or_default()
    }

    fn next_outcome(&self, address: &Address) -> Result<u128, MockError> {
        let mut script = self.script.lock().expect("script lock");
        match script.get_mut(address.as_str()) {
            Some(q) if q.len() > 1 => q.pop_front().unwrap_or(Ok(0)),
            Some(q) => q.front().cloned().unwrap_or(Ok(0)),
            None => Ok(0),
        }
    }
}

#[async_trait]
impl BalanceSource for MockBalances {
    type Error = MockError;

    async fn balance_at(&self, address: &Address, block: BlockRef) -> Result<U256, MockError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.blocks.lock().expect("blocks lock").push(block);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.next_outcome(address).map(U256::from)
    }

    fn classify(&self, err: &MockError) -> FailureKind {
        match err {
            MockError::RateLimited => FailureKind::RateLimited,
            _ => FailureKind::Other,
        }
    }
}

/// Pages keyed by the cursor that requests them (`None` = first page).
#[derive(Default)]
pub struct MockOwners {
    pages: HashMap<Option<String>, Result<OwnerPage, MockError>>,
    requested: Mutex<Vec<Option<String>>>,
    /// When set, every page points at itself: the cursor never ends.
    endless: bool,
}

impl MockOwners {
    /// Chain `pages` together with cursors `p1`, `p2`, …; the last page has none.
    pub fn chained(pages: Vec<Vec<&str>>) -> Self {
        let n = pages.len();
        let mut map = HashMap::new();
        for (i, owners) in pages.into_iter().enumerate() {
            let key = if i == 0 { None } else { Some(format!("p{i}")) };
            let next = if i + 1 < n { Some(format!("p{}", i + 1)) } else { None };
            map.insert(
                key,
                Ok(OwnerPage {
                    owners: owners.into_iter().map(String::from).collect(),
                    page_key: next,
                }),
            );
        }
        Self {
            pages: map,
            ..Default::default()
        }
    }

    pub fn endless(owners: Vec<&str>) -> Self {
        let mut map = HashMap::new();
        map.insert(
            None,
            Ok(OwnerPage {
                owners: owners.into_iter().map(String::from).collect(),
                page_key: Some("again".into()),
            }),
        );
        Self {
            pages: map,
            endless: true,
            ..Default::default()
        }
    }

    pub fn failing_at(mut self, cursor: &str) -> Self {
        self.pages.insert(Some(cursor.to_string()), Err(MockError::Down));
        self
    }

    pub fn requested(&self) -> Vec<Option<String>> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OwnerSource for MockOwners {
    type Error = MockError;

    async fn owners_page(
        &self,
        _contract: &str,
        page_key: Option<&str>,
    ) -> Result<OwnerPage, MockError> {
        self.requested
            .lock()
            .expect("requested lock")
            .push(page_key.map(String::from));
        let key = if self.endless { None } else { page_key.map(String::from) };
        match self.pages.get(&key) {
            Some(page) => page.clone(),
            None => Err(MockError::Down),
        }
    }
}

/// Closest-before resolution over a fixed `(block, timestamp)` table.
pub struct TableResolver {
    pub table: Vec<(u64, u64)>,
}

#[async_trait]
impl BlockResolver for TableResolver {
    type Error = MockError;

    async fn resolve(&self, epoch: u64) -> Result<BlockRef, MockError> {
        self.table
            .iter()
            .filter(|(_, ts)| *ts <= epoch)
            .map(|(block, _)| *block)
            .max()
            .map(BlockRef)
            .ok_or(MockError::NoBlock(epoch))
    }
}

/// Paused-clock timers round deadlines up to the millisecond; allow a little slack.
pub fn assert_elapsed(start: tokio::time::Instant, expected: Duration) {
    let elapsed = start.elapsed();
    assert!(
        elapsed >= expected && elapsed <= expected + Duration::from_millis(10),
        "elapsed {elapsed:?}, expected {expected:?}"
    );
}
