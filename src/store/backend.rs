//! Metadata store trait.

use crate::core::{MetricDefinition, Result};

/// One page of the store scan.
///
/// An empty `next_cursor` signals the end of the scan. Documents are
/// raw JSON so a single malformed record can be skipped without
/// failing the page it arrived on.
#[derive(Debug, Clone)]
pub struct StorePage {
    /// Raw definition documents.
    pub documents: Vec<serde_json::Value>,
    /// Continuation cursor; empty when the scan is complete.
    pub next_cursor: String,
}

/// External metadata store interface.
///
/// This trait abstracts the persistent metadata backend so the catalog
/// can run against anything that speaks a paginated scan plus an
/// idempotent per-key document write.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch one page of the definition scan.
    ///
    /// An empty cursor starts the scan; the returned cursor continues it.
    async fn fetch_page(&self, cursor: &str) -> Result<StorePage>;

    /// Write one definition document. Idempotent per stable key.
    async fn write_definition(&self, def: &MetricDefinition) -> Result<()>;
}
