//! The metric-definition catalog.
//!
//! [`MetricCatalog`] ties the index layer to the external store: it
//! backfills both index structures at startup, lets the ingest adapter
//! register and refresh definitions, and serves the query layer's
//! pattern lookups.
//!
//! Locking discipline: the identity table and the namespace index each
//! sit behind their own reader/writer lock. Readers run concurrently;
//! writers are exclusive per structure; nothing holds a lock across
//! store I/O. Decisions that span both structures are composed from
//! these primitives instead of a single wide lock; see
//! [`IngestAdapter`] for the race this trades away.

pub mod ingest;
pub mod sync;

pub use ingest::{IngestAdapter, IngestOutcome};
pub use sync::SyncGateway;

use crate::core::{
    CatalogConfig, MetricDefinition, MetricKey, MetricRef, OrgId, Result,
};
use crate::index::{IdentityTable, NamespaceIndex, Pattern};
use crate::store::MetadataStore;
use crate::telemetry::MetricsSink;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Definition cache plus glob-queryable namespace, eventually
/// consistent with an external metadata store.
pub struct MetricCatalog {
    identity: RwLock<IdentityTable>,
    namespace: RwLock<NamespaceIndex>,
    gateway: SyncGateway,
    staleness_window: Duration,
}

impl MetricCatalog {
    /// Creates an empty catalog over a store.
    ///
    /// Call [`backfill`](Self::backfill) before serving queries if the
    /// store may already hold definitions from a previous run or from
    /// other index replicas.
    pub fn new(
        store: Arc<dyn MetadataStore>,
        sink: Arc<dyn MetricsSink>,
        config: &CatalogConfig,
    ) -> Self {
        Self {
            identity: RwLock::new(IdentityTable::new()),
            namespace: RwLock::new(NamespaceIndex::new()),
            gateway: SyncGateway::new(store, sink),
            staleness_window: config.staleness_window,
        }
    }

    /// The configured staleness window.
    pub fn staleness_window(&self) -> Duration {
        self.staleness_window
    }

    /// Drains the store scan and registers everything it returns.
    ///
    /// Pages are fetched outside the locks and applied under them
    /// afterwards. The first fetch error aborts the scan: a partial
    /// backfill is acceptable because ingest re-discovers any metric
    /// that still reports. Returns the number of definitions loaded.
    pub async fn backfill(&self) -> usize {
        let mut cursor = String::new();
        let mut total = 0usize;
        loop {
            let page = match self.gateway.fetch_page(&cursor).await {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, "backfill aborted; ingest discovery will fill the gap");
                    break;
                },
            };
            for def in page.definitions {
                self.register(def);
                total += 1;
            }
            if page.next_cursor.is_empty() {
                break;
            }
            cursor = page.next_cursor;
        }
        debug!(total, "backfilled metric definitions");
        total
    }

    /// Registers a definition in both index structures.
    ///
    /// Two short exclusive sections, one per structure. No write-back:
    /// callers that need one (the ingest adapter) persist first.
    pub(crate) fn register(&self, def: MetricDefinition) -> MetricRef {
        let org = def.org_id;
        let name = def.name.clone();
        let fresh = self.identity.write().assign(def);
        {
            let mut namespace = self.namespace.write();
            let primary = namespace.get_or_add(org, &name, fresh);
            namespace.add_ref(org, primary);
        }
        fresh
    }

    /// Overwrites the definition at `r` with a refreshed snapshot.
    pub(crate) fn refresh(&self, r: MetricRef, def: MetricDefinition) {
        self.identity.write().replace(r, def);
    }

    /// Looks up the ref assigned to a stable key.
    pub(crate) fn resolve_key(&self, key: &MetricKey) -> Option<MetricRef> {
        self.identity.read().resolve(key)
    }

    /// Last-update timestamp of the definition at `r`.
    pub(crate) fn last_update(&self, r: MetricRef) -> Option<u64> {
        self.identity.read().get(r).map(|def| def.last_update)
    }

    /// Queues an asynchronous best-effort store write.
    pub(crate) fn persist(&self, def: MetricDefinition) {
        self.gateway.persist(def);
    }

    /// Resolves a glob pattern to the matching definitions.
    ///
    /// Results are in lexical path order. An invalid pattern is
    /// rejected without touching the index; an organization with no
    /// entries yields an empty result.
    pub fn find(&self, org: OrgId, pattern: &str) -> Result<Vec<MetricDefinition>> {
        let pattern = Pattern::parse(pattern)?;
        let hits = self.namespace.read().match_pattern(org, &pattern);
        let identity = self.identity.read();
        Ok(hits
            .into_iter()
            .filter_map(|(_, r)| identity.get(r).cloned())
            .collect())
    }

    /// Looks up the latest definition for a stable key.
    pub fn get_by_key(&self, key: &MetricKey) -> Option<MetricDefinition> {
        let identity = self.identity.read();
        identity.resolve(key).and_then(|r| identity.get(r).cloned())
    }

    /// Looks up a definition by ref.
    pub fn get_by_ref(&self, r: MetricRef) -> Option<MetricDefinition> {
        self.identity.read().get(r).cloned()
    }

    /// Every definition registered under an organization, unordered.
    pub fn list(&self, org: OrgId) -> Vec<MetricDefinition> {
        let refs = self.namespace.read().list(org);
        let identity = self.identity.read();
        refs.into_iter()
            .filter_map(|r| identity.get(r).cloned())
            .collect()
    }

    /// Number of definitions in the identity arena.
    pub fn len(&self) -> usize {
        self.identity.read().len()
    }

    /// True when nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.identity.read().is_empty()
    }
}
