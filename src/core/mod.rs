//! Core domain models and shared infrastructure for Metridex.
//!
//! This module contains the fundamental types that the index, store,
//! and catalog layers are built on.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{CatalogConfig, Config, LogLevel, LoggingConfig, StoreConfig};
pub use error::{MetridexError, Result};
pub use types::{DataPoint, MetricDefinition, MetricKey, MetricName, MetricRef, OrgId};
