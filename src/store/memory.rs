//! In-memory metadata store for tests and local development.

use crate::core::{MetricDefinition, MetridexError, Result};
use crate::store::backend::{MetadataStore, StorePage};
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// DashMap-backed [`MetadataStore`] with deterministic key-ordered
/// pagination and failure injection for exercising the error paths.
pub struct MemoryStore {
    /// Documents keyed by stable key.
    docs: DashMap<String, serde_json::Value>,
    /// Page size served by `fetch_page`.
    page_size: usize,
    /// When set, every write fails with a store error.
    fail_writes: AtomicBool,
    /// Pages to serve before fetches start failing. usize::MAX = never.
    fail_after_pages: AtomicUsize,
    /// Pages served so far.
    pages_served: AtomicUsize,
    /// Total successful writes.
    writes: AtomicU64,
}

impl MemoryStore {
    /// Creates an empty store serving `page_size` documents per page.
    pub fn new(page_size: usize) -> Self {
        Self {
            docs: DashMap::new(),
            page_size: page_size.max(1),
            fail_writes: AtomicBool::new(false),
            fail_after_pages: AtomicUsize::new(usize::MAX),
            pages_served: AtomicUsize::new(0),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of documents held.
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// True when the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Total successful writes observed.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Makes every subsequent write fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Makes fetches fail after `pages` pages have been served.
    pub fn set_fail_after_pages(&self, pages: usize) {
        self.fail_after_pages.store(pages, Ordering::Relaxed);
    }

    /// Plants a raw document under `key`, bypassing serialization.
    ///
    /// Used to simulate corrupt records in the scan.
    pub fn poison(&self, key: &str, doc: serde_json::Value) {
        self.docs.insert(key.to_string(), doc);
    }

    fn sorted_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.docs.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[async_trait::async_trait]
impl MetadataStore for MemoryStore {
    async fn fetch_page(&self, cursor: &str) -> Result<StorePage> {
        let served = self.pages_served.fetch_add(1, Ordering::Relaxed);
        if served >= self.fail_after_pages.load(Ordering::Relaxed) {
            return Err(MetridexError::store("scan failed: injected fetch error"));
        }

        let keys = self.sorted_keys();
        let start = if cursor.is_empty() {
            0
        } else {
            keys.partition_point(|k| k.as_str() <= cursor)
        };
        let end = (start + self.page_size).min(keys.len());

        let documents = keys[start..end]
            .iter()
            .filter_map(|k| self.docs.get(k).map(|e| e.value().clone()))
            .collect();
        let next_cursor = if end < keys.len() {
            keys[end - 1].clone()
        } else {
            String::new()
        };
        Ok(StorePage {
            documents,
            next_cursor,
        })
    }

    async fn write_definition(&self, def: &MetricDefinition) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(MetridexError::store("write failed: injected write error"));
        }
        let doc = serde_json::to_value(def)?;
        self.docs.insert(def.key.as_str().to_string(), doc);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
