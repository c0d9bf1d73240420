//! Per-organization hierarchical namespace over metric names.
//!
//! Names are split on the dot delimiter into a forest of segment nodes.
//! Matching walks the forest alongside the pattern and prunes a branch
//! the moment its segment fails, so a query only ever pays for the
//! matching subtree, not the whole namespace.

use crate::core::types::{MetricName, MetricRef, OrgId, NAME_DELIMITER};
use crate::index::glob::{Pattern, Segment};
use ahash::AHashMap;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Registration state for one exact path.
#[derive(Debug)]
struct PathEntry {
    /// The ref this path was first registered with.
    primary: MetricRef,
    /// How many distinct definitions share this exact path.
    count: u32,
}

/// One segment of the namespace forest.
///
/// A node can be both an interior branch and a registered path at the
/// same time ("a.b" and "a.b.c" may both be metrics).
#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<String, Node>,
    entry: Option<PathEntry>,
}

#[derive(Debug, Default)]
struct OrgNamespace {
    root: Node,
    /// Primary ref back to its full path, for `add_ref` and `list`.
    paths: AHashMap<MetricRef, String>,
}

/// Glob-queryable index over every registered metric name.
///
/// Exposes [`MetricRef`] values, never definitions; callers resolve
/// refs through the identity table. Not internally synchronized; the
/// catalog wraps it in its own reader/writer lock.
#[derive(Debug, Default)]
pub struct NamespaceIndex {
    orgs: AHashMap<OrgId, OrgNamespace>,
}

impl NamespaceIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry ref for `(org, name)`, creating the path if needed.
    ///
    /// `fresh` is the ref the caller just obtained from the identity
    /// table; it is installed only when the path is new. When another
    /// definition already claimed the path, its ref is returned instead
    /// and `fresh` keeps addressing its own arena slot: the fan-in is
    /// tracked by the reference count, not by re-pointing the entry.
    pub fn get_or_add(&mut self, org: OrgId, name: &MetricName, fresh: MetricRef) -> MetricRef {
        let ns = self.orgs.entry(org).or_default();
        let mut node = &mut ns.root;
        for seg in name.segments() {
            node = node.children.entry(seg.to_string()).or_default();
        }
        match &node.entry {
            Some(entry) => entry.primary,
            None => {
                node.entry = Some(PathEntry {
                    primary: fresh,
                    count: 0,
                });
                ns.paths.insert(fresh, name.as_str().to_string());
                fresh
            },
        }
    }

    /// Increments the usage count for the path `r` was obtained for.
    ///
    /// Paired 1:1 with each logical registration. Unknown refs are
    /// ignored; the count exists for a future prune pass, nothing
    /// load-bearing reads it.
    pub fn add_ref(&mut self, org: OrgId, r: MetricRef) {
        let Some(ns) = self.orgs.get_mut(&org) else {
            return;
        };
        let Some(path) = ns.paths.get(&r) else {
            return;
        };
        let mut node = &mut ns.root;
        for seg in path.split(NAME_DELIMITER) {
            match node.children.get_mut(seg) {
                Some(child) => node = child,
                None => return,
            }
        }
        if let Some(entry) = &mut node.entry {
            entry.count += 1;
        }
    }

    /// Evaluates a glob pattern against one organization's namespace.
    ///
    /// Returns `(path, ref)` pairs in lexical path order. An organization
    /// with no entries yields an empty result, never an error.
    pub fn match_pattern(&self, org: OrgId, pattern: &Pattern) -> Vec<(String, MetricRef)> {
        let Some(ns) = self.orgs.get(&org) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut trail: SmallVec<[&str; 8]> = SmallVec::new();
        Self::descend(&ns.root, pattern.segments(), &mut trail, &mut out);
        out
    }

    fn descend<'a>(
        node: &'a Node,
        segments: &'a [Segment],
        trail: &mut SmallVec<[&'a str; 8]>,
        out: &mut Vec<(String, MetricRef)>,
    ) {
        let Some((head, rest)) = segments.split_first() else {
            // Pattern exhausted: emit only if this exact path is registered.
            if let Some(entry) = &node.entry {
                out.push((trail.join("."), entry.primary));
            }
            return;
        };
        match head {
            Segment::Literal(lit) => {
                if let Some(child) = node.children.get(lit.as_str()) {
                    trail.push(lit.as_str());
                    Self::descend(child, rest, trail, out);
                    trail.pop();
                }
            },
            Segment::Any => {
                for (seg, child) in &node.children {
                    trail.push(seg.as_str());
                    Self::descend(child, rest, trail, out);
                    trail.pop();
                }
            },
        }
    }

    /// Every registered ref for an organization, unordered.
    pub fn list(&self, org: OrgId) -> Vec<MetricRef> {
        self.orgs
            .get(&org)
            .map(|ns| ns.paths.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of registered paths for an organization.
    pub fn path_count(&self, org: OrgId) -> usize {
        self.orgs.get(&org).map_or(0, |ns| ns.paths.len())
    }

    /// Usage count for a path entry, if `r` is a primary ref.
    pub fn ref_count(&self, org: OrgId, r: MetricRef) -> Option<u32> {
        let ns = self.orgs.get(&org)?;
        let path = ns.paths.get(&r)?;
        let mut node = &ns.root;
        for seg in path.split(NAME_DELIMITER) {
            node = node.children.get(seg)?;
        }
        node.entry.as_ref().map(|e| e.count)
    }
}
