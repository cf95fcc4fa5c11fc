use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A mined block as returned by the Krist lookup API.
///
/// `address` and `hash` are nullable on the server (the genesis block has neither).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KristBlock {
    pub height: u64,
    pub address: Option<String>,
    pub hash: Option<String>,
    pub short_hash: Option<String>,
    pub value: u64,
    pub time: DateTime<Utc>,
    pub difficulty: u64,
}

/// One page of lookup results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult<T> {
    /// Records on this page, in server order.
    pub items: Vec<T>,
    /// Number of records on this page.
    pub count: u64,
    /// Matching records across all pages.
    pub total: u64,
}

impl<T> LookupResult<T> {
    pub fn new(items: Vec<T>, total: u64) -> Self {
        let count = items.len() as u64;
        Self {
            items,
            count,
            total,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppEvent {
    /// Periodic refresh timer fired
    RefreshTick,
    Quit,
}
