//! Daily snapshot persistence.
//!
//! Snapshots are append-only: once a historical day is stored it is never
//! refetched or rewritten. Today's snapshot is never cached, since it may
//! still be partial. The RocksDB store keys by ISO date in a dedicated
//! column family, values bincode-encoded.

use chrono::NaiveDate;
use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;

use ember_core::error::{SnapshotError, StoreError};
use ember_core::types::NetworkSnapshot;
use ember_core::EmberError;

use crate::ports::SnapshotSource;

const CF_SNAPSHOTS: &str = "snapshots";

/// Keyed storage of per-day snapshots.
pub trait SnapshotStore: Send + Sync {
    fn get(&self, date: NaiveDate) -> Result<Option<NetworkSnapshot>, StoreError>;
    fn put(&self, date: NaiveDate, snapshot: &NetworkSnapshot) -> Result<(), StoreError>;
}

/// RocksDB-backed snapshot store.
pub struct RocksSnapshotStore {
    db: DB,
}

impl RocksSnapshotStore {
    /// Open or create the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let descriptors = vec![ColumnFamilyDescriptor::new(CF_SNAPSHOTS, Options::default())];
        let db = DB::open_cf_descriptors(&db_opts, path, descriptors)
            .map_err(|e| StoreError::Open(e.to_string()))?;
        Ok(Self { db })
    }

    fn cf(&self) -> Result<&rocksdb::ColumnFamily, StoreError> {
        self.db
            .cf_handle(CF_SNAPSHOTS)
            .ok_or_else(|| StoreError::Open(format!("missing column family {CF_SNAPSHOTS}")))
    }

    fn key(date: NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }
}

impl SnapshotStore for RocksSnapshotStore {
    fn get(&self, date: NaiveDate) -> Result<Option<NetworkSnapshot>, StoreError> {
        let Some(bytes) = self
            .db
            .get_cf(self.cf()?, Self::key(date))
            .map_err(|e| StoreError::Read(e.to_string()))?
        else {
            return Ok(None);
        };
        let (snapshot, _) =
            bincode::decode_from_slice(&bytes, bincode::config::standard())
                .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Some(snapshot))
    }

    fn put(&self, date: NaiveDate, snapshot: &NetworkSnapshot) -> Result<(), StoreError> {
        let bytes = bincode::encode_to_vec(snapshot, bincode::config::standard())
            .map_err(|e| StoreError::Write(e.to_string()))?;
        self.db
            .put_cf(self.cf()?, Self::key(date), bytes)
            .map_err(|e| StoreError::Write(e.to_string()))
    }
}

/// In-memory store for tests and dry runs.
#[derive(Default)]
pub struct MemorySnapshotStore {
    map: Mutex<BTreeMap<NaiveDate, NetworkSnapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn get(&self, date: NaiveDate) -> Result<Option<NetworkSnapshot>, StoreError> {
        let map = self
            .map
            .lock()
            .map_err(|e| StoreError::Read(e.to_string()))?;
        Ok(map.get(&date).cloned())
    }

    fn put(&self, date: NaiveDate, snapshot: &NetworkSnapshot) -> Result<(), StoreError> {
        let mut map = self
            .map
            .lock()
            .map_err(|e| StoreError::Write(e.to_string()))?;
        map.insert(date, snapshot.clone());
        Ok(())
    }
}

/// Memoizing fetch: disk first for settled history, source otherwise.
///
/// Historical days are persisted after the first successful fetch and
/// served from the store on every later run. Today is always fetched live
/// and never persisted.
pub struct CachingSnapshotProvider<S, T> {
    source: S,
    store: T,
}

impl<S: SnapshotSource, T: SnapshotStore> CachingSnapshotProvider<S, T> {
    pub fn new(source: S, store: T) -> Self {
        Self { source, store }
    }

    /// The snapshot for `date`, if available. `today` separates immutable
    /// history (cacheable) from the still-moving current day.
    pub async fn day(
        &self,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<Option<NetworkSnapshot>, EmberError> {
        let historical = date < today;
        if historical {
            if let Some(snapshot) = self.store.get(date).map_err(SnapshotError::Store)? {
                return Ok(Some(snapshot));
            }
        }

        let fetched = self.source.fetch(date).await?;
        if historical {
            if let Some(snapshot) = &fetched {
                self.store.put(date, snapshot).map_err(SnapshotError::Store)?;
            }
        }
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ember_core::types::{Node, NodeStatus};
    use ember_core::Address;
    use std::collections::BTreeMap as Map;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn snapshot(tag: u8) -> NetworkSnapshot {
        NetworkSnapshot {
            nodes: vec![Node {
                hash: format!("n{tag}"),
                owner: Address::parse(&format!("0x{:040x}", tag as u64)).unwrap(),
                reward: None,
                status: NodeStatus::Active,
                score_ppb: 900_000_000,
                stakers: Map::new(),
                resource_nodes: vec![],
            }],
            resource_nodes: vec![],
        }
    }

    /// Source that counts fetches and serves a fixed map.
    struct CountingSource {
        days: Map<NaiveDate, NetworkSnapshot>,
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        async fn fetch(&self, date: NaiveDate) -> Result<Option<NetworkSnapshot>, EmberError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.days.get(&date).cloned())
        }
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemorySnapshotStore::new();
        assert!(store.get(date(1)).unwrap().is_none());
        store.put(date(1), &snapshot(1)).unwrap();
        assert_eq!(store.get(date(1)).unwrap().unwrap(), snapshot(1));
    }

    #[test]
    fn rocks_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = RocksSnapshotStore::open(dir.path()).unwrap();
        assert!(store.get(date(1)).unwrap().is_none());
        store.put(date(1), &snapshot(7)).unwrap();
        assert_eq!(store.get(date(1)).unwrap().unwrap(), snapshot(7));
    }

    #[test]
    fn rocks_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = RocksSnapshotStore::open(dir.path()).unwrap();
            store.put(date(2), &snapshot(2)).unwrap();
        }
        let store = RocksSnapshotStore::open(dir.path()).unwrap();
        assert_eq!(store.get(date(2)).unwrap().unwrap(), snapshot(2));
    }

    #[tokio::test]
    async fn provider_caches_historical_days() {
        let source = CountingSource {
            days: Map::from([(date(1), snapshot(1))]),
            fetches: AtomicUsize::new(0),
        };
        let provider = CachingSnapshotProvider::new(source, MemorySnapshotStore::new());

        let today = date(5);
        let first = provider.day(date(1), today).await.unwrap();
        let second = provider.day(date(1), today).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.source.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_never_caches_today() {
        let source = CountingSource {
            days: Map::from([(date(5), snapshot(5))]),
            fetches: AtomicUsize::new(0),
        };
        let provider = CachingSnapshotProvider::new(source, MemorySnapshotStore::new());

        let today = date(5);
        provider.day(today, today).await.unwrap();
        provider.day(today, today).await.unwrap();
        assert_eq!(provider.source.fetches.load(Ordering::SeqCst), 2);
        assert!(provider.store.is_empty());
    }

    #[tokio::test]
    async fn provider_reports_missing_day() {
        let source = CountingSource { days: Map::new(), fetches: AtomicUsize::new(0) };
        let provider = CachingSnapshotProvider::new(source, MemorySnapshotStore::new());
        let got = provider.day(date(1), date(5)).await.unwrap();
        assert!(got.is_none());
    }
}
