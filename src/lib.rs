//! Metridex - metric-definition catalog with a glob-queryable namespace index.
//!
//! Metridex is the metadata layer of a time-series storage engine. It
//! tracks every metric identity ever seen, assigns each a stable
//! internal reference, and answers hierarchical glob-pattern queries
//! so the query layer can resolve user requests into concrete series.
//!
//! # Architecture
//!
//! - `index`: the identity table (key → ref → definition arena) and the
//!   per-organization namespace forest
//! - `store`: the external metadata store contract (paginated scan,
//!   best-effort async write-back)
//! - `catalog`: ties index and store together; hosts the ingest adapter
//!   and the query surface
//! - `core`: domain models, errors, configuration
//! - `telemetry`: injected counters and logging bootstrap
//!
//! # Example
//!
//! ```no_run
//! use metridex::catalog::{IngestAdapter, MetricCatalog};
//! use metridex::core::Config;
//! use metridex::store::MemoryStore;
//! use metridex::telemetry::WriteBackStats;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let store = Arc::new(MemoryStore::new(config.store.page_size));
//!     let stats = Arc::new(WriteBackStats::new());
//!     let catalog = Arc::new(MetricCatalog::new(store, stats, &config.catalog));
//!     catalog.backfill().await;
//!     let _adapter = IngestAdapter::new(Arc::clone(&catalog));
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod catalog;
pub mod core;
pub mod index;
pub mod store;
pub mod telemetry;

// Re-export core types for convenience
pub use crate::catalog::{IngestAdapter, IngestOutcome, MetricCatalog};
pub use crate::core::{Config, Result};
