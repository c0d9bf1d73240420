use crate::core::error::{MetridexError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The segment delimiter in hierarchical metric names.
pub const NAME_DELIMITER: char = '.';

/// Organization (tenant) identifier.
///
/// Every metric definition belongs to exactly one organization and
/// namespaces never leak across them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrgId(u32);

impl OrgId {
    /// Creates an organization id.
    pub const fn new(id: u32) -> Self {
        OrgId(id)
    }

    /// Returns the raw id value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for OrgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content-derived stable identity for a metric.
///
/// The key is a hash over the metric's identity attributes (org, name,
/// tags, ...) computed upstream; it is stable across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricKey(String);

impl MetricKey {
    /// Creates a new MetricKey after validation.
    pub fn new(key: String) -> Result<Self> {
        if key.is_empty() {
            return Err(MetridexError::record("metric key cannot be empty"));
        }
        // Upstream keys are content hashes, 64 hex chars at most.
        if key.len() > 64 {
            return Err(MetridexError::record(format!(
                "metric key cannot exceed 64 characters, got {}",
                key.len()
            )));
        }
        Ok(MetricKey(key))
    }

    /// Returns the string representation of the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string value.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dot-delimited hierarchical metric name.
///
/// Wildcards are query syntax, not name syntax, so `*` is rejected here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricName(String);

impl MetricName {
    /// Creates a new MetricName after validation.
    pub fn new(name: String) -> Result<Self> {
        if name.is_empty() {
            return Err(MetridexError::record("metric name cannot be empty"));
        }
        if name.split(NAME_DELIMITER).any(str::is_empty) {
            return Err(MetridexError::record(format!(
                "metric name has an empty segment: {:?}",
                name
            )));
        }
        if name.contains('*') {
            return Err(MetridexError::record(format!(
                "metric name may not contain wildcards: {:?}",
                name
            )));
        }
        Ok(MetricName(name))
    }

    /// Returns the string representation of the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates the name's path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(NAME_DELIMITER)
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Small-integer handle for O(1) access to a [`MetricDefinition`].
///
/// Assigned once per unique stable key, monotonically increasing, never
/// reused. A ref obtained once stays valid for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MetricRef(u32);

impl MetricRef {
    /// Wraps a raw position in the definition arena.
    pub const fn new(pos: u32) -> Self {
        MetricRef(pos)
    }

    /// Returns the arena position this ref addresses.
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns the raw handle value.
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for MetricRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One message from the ingest stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    /// Stable identity hash for the series this point belongs to.
    pub key: MetricKey,
    /// Owning organization.
    pub org_id: OrgId,
    /// Hierarchical metric name.
    pub name: MetricName,
    /// Observation timestamp, unix seconds.
    pub time: u64,
    /// Observed value.
    pub value: f64,
    /// Reporting interval in seconds.
    pub interval: u32,
    /// Unit of measure, free-form ("ms", "B/s", ...).
    pub unit: String,
    /// Measurement type ("gauge", "count", "rate", ...).
    pub mtype: String,
    /// key=value metadata tags.
    pub tags: Vec<String>,
}

impl DataPoint {
    /// Re-validates a point that arrived over the wire.
    ///
    /// Serde deserialization bypasses the newtype constructors, so the
    /// ingest path checks the identity fields again before acting on them.
    pub fn validate(&self) -> Result<()> {
        if self.key.as_str().is_empty() {
            return Err(MetridexError::record("data point with empty key"));
        }
        if self.name.as_str().is_empty() {
            return Err(MetridexError::record("data point with empty name"));
        }
        Ok(())
    }
}

/// Immutable-by-convention snapshot of a metric's identity and metadata.
///
/// Created when a metric is first observed or loaded from the external
/// store; replaced (never mutated in place) when a staleness refresh
/// rebuilds it; never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Stable identity hash.
    pub key: MetricKey,
    /// Owning organization.
    pub org_id: OrgId,
    /// Hierarchical metric name.
    pub name: MetricName,
    /// Reporting interval in seconds.
    pub interval: u32,
    /// Unit of measure.
    pub unit: String,
    /// Measurement type.
    pub mtype: String,
    /// key=value metadata tags.
    pub tags: Vec<String>,
    /// Timestamp of the data point this snapshot was built from, unix seconds.
    pub last_update: u64,
}

impl MetricDefinition {
    /// Builds a definition snapshot from an ingest data point.
    pub fn from_point(point: &DataPoint) -> Self {
        MetricDefinition {
            key: point.key.clone(),
            org_id: point.org_id,
            name: point.name.clone(),
            interval: point.interval,
            unit: point.unit.clone(),
            mtype: point.mtype.clone(),
            tags: point.tags.clone(),
            last_update: point.time,
        }
    }

    /// Whether this snapshot is stale relative to a point observed at `time`.
    ///
    /// Strict comparison against the window edge, matching the ingest
    /// contract: a snapshot exactly `window` old is still fresh.
    pub fn stale_at(&self, time: u64, window_secs: u64) -> bool {
        self.last_update < time.saturating_sub(window_secs)
    }
}
