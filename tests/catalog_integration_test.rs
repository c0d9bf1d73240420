//! Integration tests for the catalog: backfill, ingest state machine,
//! pattern queries, and restart round-trips.

use metridex::catalog::{IngestAdapter, IngestOutcome, MetricCatalog};
use metridex::core::{
    CatalogConfig, DataPoint, MetricDefinition, MetricKey, MetricName, MetridexError, OrgId,
    Result,
};
use metridex::store::{MemoryStore, MetadataStore, StorePage};
use metridex::telemetry::{MetricsSink, WriteBackStats};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const ORG: OrgId = OrgId::new(1);

fn point(key: &str, name: &str, time: u64) -> DataPoint {
    DataPoint {
        key: MetricKey::new(key.to_string()).unwrap(),
        org_id: ORG,
        name: MetricName::new(name.to_string()).unwrap(),
        time,
        value: 1.5,
        interval: 10,
        unit: "ms".to_string(),
        mtype: "gauge".to_string(),
        tags: vec!["dc=ams1".to_string()],
    }
}

fn catalog_over(store: Arc<dyn MetadataStore>) -> (Arc<MetricCatalog>, Arc<WriteBackStats>) {
    let stats = Arc::new(WriteBackStats::new());
    let catalog = Arc::new(MetricCatalog::new(
        store,
        Arc::clone(&stats) as Arc<dyn MetricsSink>,
        &CatalogConfig::default(),
    ));
    (catalog, stats)
}

async fn wait_for(mut done: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached within 1s");
}

/// Store that serves a fixed script of pages, for exact page-shape tests.
struct ScriptedStore {
    pages: Vec<StorePage>,
}

impl ScriptedStore {
    fn new(shapes: &[&[MetricDefinition]]) -> Self {
        let last = shapes.len().saturating_sub(1);
        let pages = shapes
            .iter()
            .enumerate()
            .map(|(i, defs)| StorePage {
                documents: defs
                    .iter()
                    .map(|d| serde_json::to_value(d).unwrap())
                    .collect(),
                next_cursor: if i == last {
                    String::new()
                } else {
                    format!("page-{}", i + 1)
                },
            })
            .collect();
        Self { pages }
    }
}

#[async_trait::async_trait]
impl MetadataStore for ScriptedStore {
    async fn fetch_page(&self, cursor: &str) -> Result<StorePage> {
        let idx = if cursor.is_empty() {
            0
        } else {
            cursor
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| MetridexError::store(format!("bad cursor {:?}", cursor)))?
        };
        self.pages
            .get(idx)
            .cloned()
            .ok_or_else(|| MetridexError::store(format!("cursor past end: {:?}", cursor)))
    }

    async fn write_definition(&self, _def: &MetricDefinition) -> Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_backfill_three_pages() {
    let defs: Vec<MetricDefinition> = [
        ("k0", "a.b.c"),
        ("k1", "a.x.c"),
        ("k2", "a.b.b.c"),
        ("k3", "servers.web1.cpu"),
        ("k4", "servers.web2.cpu"),
    ]
    .iter()
    .map(|(k, n)| MetricDefinition::from_point(&point(k, n, 100)))
    .collect();

    // Pages of size 2, 3, 0, with an empty cursor terminating the scan.
    let store = Arc::new(ScriptedStore::new(&[&defs[0..2], &defs[2..5], &[]]));
    let (catalog, _stats) = catalog_over(store);

    let loaded = catalog.backfill().await;
    assert_eq!(loaded, 5);
    assert_eq!(catalog.len(), 5);

    // Every definition is reachable by key and by exact-path match.
    for def in &defs {
        let by_key = catalog.get_by_key(&def.key).unwrap();
        assert_eq!(&by_key, def);
        let found = catalog.find(ORG, def.name.as_str()).unwrap();
        assert_eq!(found, vec![def.clone()]);
    }
}

#[tokio::test]
async fn test_backfill_aborts_on_fetch_error_but_keeps_partial_state() {
    let store = Arc::new(MemoryStore::new(2));
    for i in 0..6 {
        let def = MetricDefinition::from_point(&point(&format!("k{}", i), "a.b", 100));
        store.write_definition(&def).await.unwrap();
    }
    // First page succeeds, the second fetch fails.
    store.set_fail_after_pages(1);

    let (catalog, _stats) = catalog_over(store);
    let loaded = catalog.backfill().await;
    assert_eq!(loaded, 2);

    // The catalog still serves what it has, and ingest keeps working.
    let adapter = IngestAdapter::new(Arc::clone(&catalog));
    assert_eq!(
        adapter.record(&point("fresh-key", "d.e", 200)).unwrap(),
        IngestOutcome::Registered
    );
    assert_eq!(catalog.len(), 3);
}

#[tokio::test]
async fn test_backfill_skips_malformed_documents() {
    let store = Arc::new(MemoryStore::new(10));
    let good = MetricDefinition::from_point(&point("k1", "a.b", 100));
    store.write_definition(&good).await.unwrap();
    store.poison("k0", serde_json::json!({"not": "a definition"}));

    let (catalog, stats) = catalog_over(store);
    let loaded = catalog.backfill().await;
    assert_eq!(loaded, 1);
    assert_eq!(stats.skipped(), 1);
    assert_eq!(catalog.get_by_key(&good.key).unwrap(), good);
}

#[tokio::test]
async fn test_backfill_does_not_write_back() {
    let store = Arc::new(MemoryStore::new(10));
    let def = MetricDefinition::from_point(&point("k1", "a.b", 100));
    store.write_definition(&def).await.unwrap();
    let writes_before = store.writes();

    let (catalog, stats) = catalog_over(Arc::clone(&store) as Arc<dyn MetadataStore>);
    catalog.backfill().await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert_eq!(store.writes(), writes_before);
    assert_eq!(stats.ok(), 0);
}

#[tokio::test]
async fn test_ingest_state_machine() {
    let store = Arc::new(MemoryStore::new(10));
    let (catalog, stats) = catalog_over(Arc::clone(&store) as Arc<dyn MetadataStore>);
    let adapter = IngestAdapter::new(Arc::clone(&catalog));
    let window = catalog.staleness_window().as_secs();

    // Unknown key registers and persists.
    let outcome = adapter.record(&point("k1", "a.b.c", 100_000)).unwrap();
    assert_eq!(outcome, IngestOutcome::Registered);
    wait_for(|| stats.ok() == 1).await;

    // A second point within the window is a no-op: no rebuild, no write.
    let outcome = adapter
        .record(&point("k1", "a.b.c", 100_000 + window))
        .unwrap();
    assert_eq!(outcome, IngestOutcome::Fresh);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(stats.ok(), 1);

    // Past the window the snapshot is rebuilt and re-persisted.
    let stale_time = 100_000 + window + 1;
    let outcome = adapter.record(&point("k1", "a.b.c", stale_time)).unwrap();
    assert_eq!(outcome, IngestOutcome::Refreshed);
    wait_for(|| stats.ok() == 2).await;

    let def = catalog
        .get_by_key(&MetricKey::new("k1".to_string()).unwrap())
        .unwrap();
    assert_eq!(def.last_update, stale_time);
    // Refresh replaced in place: still one definition, one path.
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.find(ORG, "a.b.c").unwrap().len(), 1);
}

#[tokio::test]
async fn test_ingest_rejects_malformed_points() {
    let store = Arc::new(MemoryStore::new(10));
    let (catalog, _stats) = catalog_over(store);
    let adapter = IngestAdapter::new(Arc::clone(&catalog));

    let mut bad = point("k1", "a.b", 100);
    bad.key = serde_json::from_value(serde_json::json!("")).unwrap();
    assert!(adapter.record(&bad).is_err());
    assert!(catalog.is_empty());
}

#[tokio::test]
async fn test_ingest_survives_store_outage() {
    let store = Arc::new(MemoryStore::new(10));
    store.set_fail_writes(true);
    let (catalog, stats) = catalog_over(Arc::clone(&store) as Arc<dyn MetadataStore>);
    let adapter = IngestAdapter::new(Arc::clone(&catalog));

    // Write-back fails, the catalog registers anyway.
    assert_eq!(
        adapter.record(&point("k1", "a.b.c", 100)).unwrap(),
        IngestOutcome::Registered
    );
    wait_for(|| stats.failed() == 1).await;
    assert_eq!(catalog.find(ORG, "a.b.c").unwrap().len(), 1);
    assert_eq!(stats.ok(), 0);
}

#[tokio::test]
async fn test_find_glob_semantics() {
    let store = Arc::new(MemoryStore::new(10));
    let (catalog, _stats) = catalog_over(store);
    let adapter = IngestAdapter::new(Arc::clone(&catalog));

    for (key, name) in [
        ("k0", "a.b.c"),
        ("k1", "a.x.c"),
        ("k2", "a.b.b.c"),
        ("k3", "a.c"),
        ("k4", "a.b.d"),
    ] {
        adapter.record(&point(key, name, 100)).unwrap();
    }

    // `*` matches exactly one segment; results come back in path order.
    let hits = catalog.find(ORG, "a.*.c").unwrap();
    let names: Vec<&str> = hits.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a.b.c", "a.x.c"]);

    // No wildcard: exact lookup.
    let hits = catalog.find(ORG, "a.b.b.c").unwrap();
    assert_eq!(hits.len(), 1);

    // Unknown org: empty, not an error.
    assert!(catalog.find(OrgId::new(42), "a.*.c").unwrap().is_empty());

    // Invalid glob: rejected, index untouched.
    assert!(matches!(
        catalog.find(ORG, "a.{b,c}.d"),
        Err(MetridexError::InvalidPattern(_))
    ));
    assert_eq!(catalog.len(), 5);
}

#[tokio::test]
async fn test_list_returns_whole_namespace() {
    let store = Arc::new(MemoryStore::new(10));
    let (catalog, _stats) = catalog_over(store);
    let adapter = IngestAdapter::new(Arc::clone(&catalog));

    adapter.record(&point("k0", "a.b", 100)).unwrap();
    adapter.record(&point("k1", "c.d", 100)).unwrap();
    adapter.record(&point("k2", "c.d.e", 100)).unwrap();

    let mut names: Vec<String> = catalog
        .list(ORG)
        .into_iter()
        .map(|d| d.name.as_str().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["a.b", "c.d", "c.d.e"]);
    assert!(catalog.list(OrgId::new(42)).is_empty());
}

#[tokio::test]
async fn test_persist_then_backfill_round_trip() {
    let store = Arc::new(MemoryStore::new(2));
    let (catalog, stats) = catalog_over(Arc::clone(&store) as Arc<dyn MetadataStore>);
    let adapter = IngestAdapter::new(Arc::clone(&catalog));

    for (key, name) in [
        ("k0", "servers.web1.cpu"),
        ("k1", "servers.web2.cpu"),
        ("k2", "servers.web1.mem"),
    ] {
        adapter.record(&point(key, name, 500)).unwrap();
    }
    wait_for(|| stats.ok() == 3).await;

    // Simulate a restart: a new catalog over the same durable store.
    let (restarted, _stats2) = catalog_over(Arc::clone(&store) as Arc<dyn MetadataStore>);
    let loaded = restarted.backfill().await;
    assert_eq!(loaded, 3);

    for key in ["k0", "k1", "k2"] {
        let key = MetricKey::new(key.to_string()).unwrap();
        let before = catalog.get_by_key(&key).unwrap();
        let after = restarted.get_by_key(&key).unwrap();
        assert_eq!(after, before);
    }
    let hits = restarted.find(ORG, "servers.*.cpu").unwrap();
    assert_eq!(hits.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ingest_of_same_new_key_converges() {
    let store = Arc::new(MemoryStore::new(10));
    let (catalog, _stats) = catalog_over(store);
    let adapter = Arc::new(IngestAdapter::new(Arc::clone(&catalog)));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let adapter = Arc::clone(&adapter);
        handles.push(tokio::spawn(async move {
            adapter.record(&point("hot-key", "a.b.c", 100)).unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // Duplicate arena slots are tolerated, but lookups agree on one
    // winner and the namespace holds a single path.
    let key = MetricKey::new("hot-key".to_string()).unwrap();
    let first = catalog.get_by_key(&key).unwrap();
    for _ in 0..10 {
        assert_eq!(catalog.get_by_key(&key).unwrap(), first);
    }
    assert_eq!(catalog.find(ORG, "a.b.c").unwrap().len(), 1);
    assert_eq!(catalog.find(ORG, "a.*.c").unwrap().len(), 1);
}

#[tokio::test]
async fn test_channel_driven_ingest_loop() {
    let store = Arc::new(MemoryStore::new(10));
    let (catalog, _stats) = catalog_over(store);
    let adapter = Arc::new(IngestAdapter::new(Arc::clone(&catalog)));

    let (tx, rx) = tokio::sync::mpsc::channel(64);
    let worker = {
        let adapter = Arc::clone(&adapter);
        tokio::spawn(async move { adapter.run(rx).await })
    };

    for i in 0..20 {
        tx.send(point(&format!("k{}", i), &format!("a.b.m{}", i), 100))
            .await
            .unwrap();
    }
    drop(tx);
    worker.await.unwrap();

    assert_eq!(catalog.len(), 20);
    assert_eq!(adapter.error_count(), 0);
    assert_eq!(catalog.find(ORG, "a.b.*").unwrap().len(), 20);
}
