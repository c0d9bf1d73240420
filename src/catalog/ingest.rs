//! Ingest adapter: the per-message entry point for the metric stream.

use crate::catalog::MetricCatalog;
use crate::core::{DataPoint, MetricDefinition, MetridexError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// What one ingest message did to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Unknown key: the metric is now registered.
    Registered,
    /// Known key, metadata fresh: nothing to do.
    Fresh,
    /// Known key, metadata stale: snapshot rebuilt and re-persisted.
    Refreshed,
}

/// Drives the identity table, namespace index, and sync gateway from
/// the ingest stream, one data point at a time.
///
/// Safe to share across ingest workers: each call composes the
/// catalog's atomic primitives and the structures' own locks do the
/// rest. Two workers first-sighting the same key may both register it;
/// that race is deliberately tolerated (lookups converge on one
/// winner) rather than closed with a cross-structure lock that would
/// serialize the hot path.
pub struct IngestAdapter {
    catalog: Arc<MetricCatalog>,
    errors: AtomicU64,
}

impl IngestAdapter {
    /// Creates an adapter over a catalog.
    pub fn new(catalog: Arc<MetricCatalog>) -> Self {
        Self {
            catalog,
            errors: AtomicU64::new(0),
        }
    }

    /// Handles one data point.
    ///
    /// State machine keyed by the point's stable key:
    /// unknown → register + persist; known and fresh → no-op; known and
    /// stale → rebuild, persist, replace in place.
    pub fn record(&self, point: &DataPoint) -> Result<IngestOutcome> {
        point.validate()?;
        let window_secs = self.catalog.staleness_window().as_secs();

        let Some(r) = self.catalog.resolve_key(&point.key) else {
            let def = MetricDefinition::from_point(point);
            self.catalog.persist(def.clone());
            self.catalog.register(def);
            return Ok(IngestOutcome::Registered);
        };

        let last_update = self
            .catalog
            .last_update(r)
            .ok_or(MetridexError::RefNotFound(r.as_u32()))?;
        if last_update < point.time.saturating_sub(window_secs) {
            let def = MetricDefinition::from_point(point);
            self.catalog.persist(def.clone());
            self.catalog.refresh(r, def);
            Ok(IngestOutcome::Refreshed)
        } else {
            Ok(IngestOutcome::Fresh)
        }
    }

    /// Consumes a stream partition until the channel closes.
    ///
    /// Per-message failures are logged and counted; the loop never
    /// exits on them.
    pub async fn run(&self, mut rx: mpsc::Receiver<DataPoint>) {
        while let Some(point) = rx.recv().await {
            if let Err(e) = self.record(&point) {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(key = %point.key, error = %e, "dropped ingest message");
            }
        }
    }

    /// Messages dropped by [`run`](Self::run) so far.
    pub fn error_count(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }
}
