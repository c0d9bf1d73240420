//! The identity table: stable key → ref → definition.
//!
//! Definitions live in a single append-only arena and everything else
//! refers to them by integer position. Positions are never removed or
//! reordered, so a [`MetricRef`] obtained once stays valid for the
//! process lifetime.

use crate::core::types::{MetricDefinition, MetricKey, MetricRef};
use ahash::AHashMap;

/// Owns the append-only definition sequence and the key → ref mapping.
///
/// Not internally synchronized; the catalog wraps it in its own
/// reader/writer lock.
#[derive(Debug, Default)]
pub struct IdentityTable {
    /// Arena of definitions; position = ref.
    defs: Vec<MetricDefinition>,
    /// Stable key to arena position. We store positions, not pointers,
    /// to keep the two structures free of lifetime coupling.
    by_key: AHashMap<MetricKey, MetricRef>,
}

impl IdentityTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the ref assigned to a stable key. Never allocates.
    pub fn resolve(&self, key: &MetricKey) -> Option<MetricRef> {
        self.by_key.get(key).copied()
    }

    /// Registers a brand-new definition and returns its ref.
    ///
    /// The caller holds exclusive access and has already checked that the
    /// key is unassigned. If a concurrent ingest of the same new key lost
    /// that check-then-act race, the insert overwrites the key mapping
    /// (last writer wins) and the earlier arena slot goes unreferenced;
    /// lookups converge on one winner.
    pub fn assign(&mut self, def: MetricDefinition) -> MetricRef {
        let r = MetricRef::new(self.defs.len() as u32);
        self.by_key.insert(def.key.clone(), r);
        self.defs.push(def);
        r
    }

    /// Looks up a definition by ref.
    pub fn get(&self, r: MetricRef) -> Option<&MetricDefinition> {
        self.defs.get(r.index())
    }

    /// Overwrites the definition at `r` with a refreshed snapshot.
    ///
    /// Used only for staleness refresh: same stable key, newer metadata.
    /// The ref's identity never changes.
    pub fn replace(&mut self, r: MetricRef, def: MetricDefinition) {
        if let Some(slot) = self.defs.get_mut(r.index()) {
            *slot = def;
        }
    }

    /// Number of definitions in the arena (including any slots orphaned
    /// by the duplicate-registration race).
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// True when nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterates every definition in assignment order.
    pub fn iter(&self) -> impl Iterator<Item = (MetricRef, &MetricDefinition)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, def)| (MetricRef::new(i as u32), def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{MetricName, OrgId};

    fn def(key: &str, name: &str, last_update: u64) -> MetricDefinition {
        MetricDefinition {
            key: MetricKey::new(key.to_string()).unwrap(),
            org_id: OrgId::new(1),
            name: MetricName::new(name.to_string()).unwrap(),
            interval: 10,
            unit: "ms".to_string(),
            mtype: "gauge".to_string(),
            tags: Vec::new(),
            last_update,
        }
    }

    #[test]
    fn test_assign_then_resolve() {
        let mut table = IdentityTable::new();
        let d = def("k1", "a.b.c", 100);
        let key = d.key.clone();

        assert!(table.resolve(&key).is_none());
        let r = table.assign(d);
        assert_eq!(table.resolve(&key), Some(r));
        assert_eq!(table.get(r).unwrap().name.as_str(), "a.b.c");
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_refs_are_sequential_and_stable() {
        let mut table = IdentityTable::new();
        let r1 = table.assign(def("k1", "a.b", 1));
        let r2 = table.assign(def("k2", "a.c", 2));
        assert_eq!(r1.index(), 0);
        assert_eq!(r2.index(), 1);
        // Refs stay valid as the arena grows.
        for i in 0..100 {
            table.assign(def(&format!("k{}", i + 3), "x.y", 3));
        }
        assert_eq!(table.get(r1).unwrap().name.as_str(), "a.b");
    }

    #[test]
    fn test_replace_keeps_identity() {
        let mut table = IdentityTable::new();
        let r = table.assign(def("k1", "a.b", 100));
        table.replace(r, def("k1", "a.b", 9_000));
        assert_eq!(table.get(r).unwrap().last_update, 9_000);
        assert_eq!(table.resolve(&MetricKey::new("k1".to_string()).unwrap()), Some(r));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_assign_converges_on_last_writer() {
        let mut table = IdentityTable::new();
        let r1 = table.assign(def("k1", "a.b", 1));
        let r2 = table.assign(def("k1", "a.b", 2));
        assert_ne!(r1, r2);
        // Both slots exist, but the key maps to exactly one winner.
        assert_eq!(table.len(), 2);
        let resolved = table.resolve(&MetricKey::new("k1".to_string()).unwrap());
        assert_eq!(resolved, Some(r2));
        assert_eq!(table.get(r2).unwrap().last_update, 2);
    }
}
