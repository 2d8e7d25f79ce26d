//! In-memory response caches with lazy TTL expiry.
//!
//! - **EphemeralCache**: generic key → (value, expiry) map; an entry read
//!   after its expiry is evicted and reported absent. There is no background
//!   sweep and no size bound.
//! - **ArchiveCache**: the typed caches the archive service keeps, one per
//!   namespace, all reading time from the same [`Clock`].
//!
//! Each process owns its own caches. Several server instances behind a load
//! balancer will each fetch and cache independently.

mod clock;
mod ephemeral;

pub use clock::{Clock, ManualClock, SystemClock};
pub use ephemeral::EphemeralCache;

use crate::models::{ListsResponse, MessageDetail, SearchResponse, ThreadsResponse};
use std::sync::Arc;

/// Typed caches backing the archive service.
pub struct ArchiveCache {
    pub lists: EphemeralCache<ListsResponse>,
    pub threads: EphemeralCache<ThreadsResponse>,
    pub messages: EphemeralCache<MessageDetail>,
    pub search: EphemeralCache<SearchResponse>,
}

impl ArchiveCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            lists: EphemeralCache::new(Arc::clone(&clock)),
            threads: EphemeralCache::new(Arc::clone(&clock)),
            messages: EphemeralCache::new(Arc::clone(&clock)),
            search: EphemeralCache::new(clock),
        }
    }
}

pub fn lists_key() -> String {
    "lists".to_string()
}

pub fn threads_key(list_id: &str, qdr: Option<&str>) -> String {
    format!("threads:{}:{}", list_id, qdr.unwrap_or_default())
}

pub fn message_key(list_id: &str, hash: &str) -> String {
    format!("msg:{list_id}:{hash}")
}

pub fn search_key(list_id: &str, query: &str, page: u32) -> String {
    format!("search:{list_id}:{query}:{page}")
}
