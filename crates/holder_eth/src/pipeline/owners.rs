//! Owner enumeration: follow the cursor to the last page, dedupe on lowercased address.

use crate::chain::{Address, OwnerSource};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Generous ceiling; BAYC has 10k tokens and the index returns thousands of owners per page.
pub const DEFAULT_MAX_PAGES: usize = 10_000;

#[derive(Error, Debug)]
pub enum EnumerateError {
    #[error("owner index: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("owner index still paginating after {0} pages")]
    PageLimit(usize),
}

/// All distinct owners of `contract`, in first-seen order.
///
/// Pages are requested strictly one after another. Any page error aborts with
/// no partial result, as does hitting `max_pages` while a cursor is still present.
pub async fn enumerate_owners<O: OwnerSource>(
    source: &O,
    contract: &str,
    max_pages: usize,
) -> Result<Vec<Address>, EnumerateError> {
    let mut seen: HashSet<Address> = HashSet::new();
    let mut owners: Vec<Address> = Vec::new();
    let mut page_key: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = source
            .owners_page(contract, page_key.as_deref())
            .await
            .map_err(|e| EnumerateError::Source(Box::new(e)))?;
        pages += 1;

        let before = owners.len();
        for raw in &page.owners {
            let addr = Address::new(raw);
            if seen.insert(addr.clone()) {
                owners.push(addr);
            }
        }
        debug!(
            page = pages,
            returned = page.owners.len(),
            new = owners.len() - before,
            "owners page merged"
        );

        page_key = page.page_key.filter(|k| !k.is_empty());
        if page_key.is_none() {
            break;
        }
        if pages >= max_pages {
            return Err(EnumerateError::PageLimit(max_pages));
        }
    }

    info!(holders = owners.len(), pages, "owner enumeration complete");
    Ok(owners)
}
