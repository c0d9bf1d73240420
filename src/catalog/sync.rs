//! Sync gateway between the catalog and the external metadata store.
//!
//! Backfill pages are fetched and decoded here, outside the index
//! locks; the catalog applies them under lock afterwards. Write-backs
//! are fire-and-forget: a failure is logged and counted, never
//! propagated, because the ingest stream is the primary source of
//! truth and the next restart's backfill re-converges.

use crate::core::{MetricDefinition, Result};
use crate::store::MetadataStore;
use crate::telemetry::MetricsSink;
use std::sync::Arc;
use std::time::Instant;
use tracing::warn;

/// One fetched page after typed decoding.
#[derive(Debug)]
pub struct DecodedPage {
    /// Definitions that decoded cleanly.
    pub definitions: Vec<MetricDefinition>,
    /// Continuation cursor; empty when the scan is complete.
    pub next_cursor: String,
}

/// Store access for the catalog: paginated scan in, async writes out.
pub struct SyncGateway {
    store: Arc<dyn MetadataStore>,
    sink: Arc<dyn MetricsSink>,
}

impl SyncGateway {
    /// Creates a gateway over a store with an injected metrics sink.
    pub fn new(store: Arc<dyn MetadataStore>, sink: Arc<dyn MetricsSink>) -> Self {
        Self { store, sink }
    }

    /// Fetches and decodes one page of the store scan.
    ///
    /// A document that fails to decode is skipped and counted; it never
    /// fails the page it arrived on.
    pub async fn fetch_page(&self, cursor: &str) -> Result<DecodedPage> {
        let page = self.store.fetch_page(cursor).await?;
        let mut definitions = Vec::with_capacity(page.documents.len());
        for doc in page.documents {
            match serde_json::from_value::<MetricDefinition>(doc) {
                Ok(def) => definitions.push(def),
                Err(e) => {
                    warn!(error = %e, "skipping malformed store document");
                    self.sink.record_document_skipped();
                },
            }
        }
        Ok(DecodedPage {
            definitions,
            next_cursor: page.next_cursor,
        })
    }

    /// Queues an asynchronous best-effort write of `def` to the store.
    ///
    /// Must be called from within a tokio runtime. There is no caller-
    /// visible completion or cancellation; the injected sink observes
    /// the outcome.
    pub fn persist(&self, def: MetricDefinition) {
        let store = Arc::clone(&self.store);
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let start = Instant::now();
            match store.write_definition(&def).await {
                Ok(()) => sink.record_write_ok(start.elapsed()),
                Err(e) => {
                    warn!(key = %def.key, error = %e, "metadata write-back failed");
                    sink.record_write_fail(start.elapsed());
                },
            }
        });
    }
}
