//! Metric identity and namespace indexing.
//!
//! Two independent structures make up the index layer: the
//! [`IdentityTable`] owns every definition ever seen and hands out
//! stable integer refs, and the [`NamespaceIndex`] arranges the
//! dot-delimited names into a per-organization forest that answers
//! glob-pattern queries. They are deliberately decoupled: the namespace
//! exposes [`MetricRef`](crate::core::MetricRef) values, never pointers
//! into the arena.

pub mod glob;
pub mod identity;
pub mod namespace;

pub use glob::Pattern;
pub use identity::IdentityTable;
pub use namespace::NamespaceIndex;
