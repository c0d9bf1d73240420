//! Observability counters and logging bootstrap.
//!
//! The write-back path reports into an injected [`MetricsSink`] rather
//! than ambient global state, so tests and embedders can read the
//! counters directly.

use crate::core::{LoggingConfig, MetridexError, Result};
use parking_lot::Mutex;
use quantiles::ckms::CKMS;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// CKMS error bound for the latency sketch.
const LATENCY_SKETCH_ERROR: f64 = 0.001;

/// Sink for the catalog's operational counters.
///
/// Implementations must be cheap: the write-back task calls these from
/// the hot path.
pub trait MetricsSink: Send + Sync {
    /// A write-back completed successfully.
    fn record_write_ok(&self, latency: Duration);
    /// A write-back failed.
    fn record_write_fail(&self, latency: Duration);
    /// A store document failed to decode and was skipped.
    fn record_document_skipped(&self);
}

/// Default sink: atomic counters plus a constant-memory latency sketch.
pub struct WriteBackStats {
    ok: AtomicU64,
    failed: AtomicU64,
    skipped: AtomicU64,
    /// Write-back latency in milliseconds.
    latency: Mutex<CKMS<f64>>,
}

impl WriteBackStats {
    /// Creates a zeroed sink.
    pub fn new() -> Self {
        Self {
            ok: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            latency: Mutex::new(CKMS::new(LATENCY_SKETCH_ERROR)),
        }
    }

    /// Successful write-backs so far.
    pub fn ok(&self) -> u64 {
        self.ok.load(Ordering::Relaxed)
    }

    /// Failed write-backs so far.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Malformed store documents skipped during backfill.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Write-back latency at quantile `q` (0.0 ..= 1.0), in milliseconds.
    pub fn latency_quantile_ms(&self, q: f64) -> Option<f64> {
        self.latency.lock().query(q).map(|(_, v)| v)
    }
}

impl Default for WriteBackStats {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink for WriteBackStats {
    fn record_write_ok(&self, latency: Duration) {
        self.ok.fetch_add(1, Ordering::Relaxed);
        self.latency.lock().insert(latency.as_secs_f64() * 1000.0);
    }

    fn record_write_fail(&self, latency: Duration) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        self.latency.lock().insert(latency.as_secs_f64() * 1000.0);
    }

    fn record_document_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }
}

/// Installs the global tracing subscriber from logging configuration.
///
/// Errors if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let directive = config
        .filter
        .clone()
        .unwrap_or_else(|| config.level.as_str().to_string());
    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| MetridexError::config(format!("bad log filter {:?}: {}", directive, e)))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| MetridexError::config(format!("failed to install subscriber: {}", e)))
}
