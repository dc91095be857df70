//! Redb-backed persistent cache (spec §4.E). Adapted directly from the
//! teacher's `index::backend::redb::RedbBackend`: ACID transactions via
//! `redb::Database`, one table per logical namespace rather than the
//! teacher's single `ucfp_data` table, since embeddings and heuristics are
//! versioned independently and must miss independently.
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableTable, TableDefinition};

use crate::entry::{EmbeddingEntry, HeuristicEntry};
use crate::error::CacheError;
use crate::key::{embedding_key, heuristic_key};

const EMBEDDINGS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("embeddings");
const HEURISTICS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("heuristics");
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");

/// Bump this whenever the on-disk entry encoding changes. A mismatch against
/// the stored schema version clears every table (spec §4.E invariant).
pub const CURRENT_SCHEMA_VERSION: u32 = 1;
const SCHEMA_VERSION_KEY: &str = "schema_version";

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

pub struct PersistentCache {
    db: Arc<Database>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl PersistentCache {
    /// Open or create the cache at `path`. A corrupt store is detected at
    /// open time (redb's `Database::create` fails to parse it) and
    /// recovered by deleting and recreating an empty store, per spec §4.E
    /// durability invariant.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref();
        let db = match Database::create(path) {
            Ok(db) => db,
            Err(_) => {
                let _ = std::fs::remove_file(path);
                Database::create(path).map_err(|e| CacheError::Backend(e.to_string()))?
            }
        };
        let cache = Self { db: Arc::new(db), hits: AtomicU64::new(0), misses: AtomicU64::new(0) };
        cache.ensure_tables()?;
        cache.reconcile_schema_version()?;
        Ok(cache)
    }

    fn ensure_tables(&self) -> Result<(), CacheError> {
        let write_txn = self.db.begin_write().map_err(|e| CacheError::Backend(e.to_string()))?;
        {
            write_txn.open_table(EMBEDDINGS_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
            write_txn.open_table(HEURISTICS_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
            write_txn.open_table(META_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(())
    }

    fn reconcile_schema_version(&self) -> Result<(), CacheError> {
        let stored = self.read_schema_version()?;
        if stored != Some(CURRENT_SCHEMA_VERSION) {
            tracing::warn!(
                stored = ?stored,
                current = CURRENT_SCHEMA_VERSION,
                "cache schema version mismatch, clearing all entries"
            );
            self.clear()?;
            self.write_schema_version()?;
        }
        Ok(())
    }

    fn read_schema_version(&self) -> Result<Option<u32>, CacheError> {
        let read_txn = self.db.begin_read().map_err(|e| CacheError::Backend(e.to_string()))?;
        let table = read_txn.open_table(META_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
        match table.get(SCHEMA_VERSION_KEY).map_err(|e| CacheError::Backend(e.to_string()))? {
            Some(v) => {
                let bytes: [u8; 4] = v
                    .value()
                    .try_into()
                    .map_err(|_| CacheError::Corrupt("schema_version malformed".to_string()))?;
                Ok(Some(u32::from_be_bytes(bytes)))
            }
            None => Ok(None),
        }
    }

    fn write_schema_version(&self) -> Result<(), CacheError> {
        let write_txn = self.db.begin_write().map_err(|e| CacheError::Backend(e.to_string()))?;
        {
            let mut table =
                write_txn.open_table(META_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
            table
                .insert(SCHEMA_VERSION_KEY, CURRENT_SCHEMA_VERSION.to_be_bytes().as_slice())
                .map_err(|e| CacheError::Backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(())
    }

    pub fn get_embedding(
        &self,
        hash_hex: &str,
        model_id: &str,
        model_version: &str,
    ) -> Result<Option<Vec<f32>>, CacheError> {
        let key = embedding_key(hash_hex, model_id, model_version);
        let read_txn = self.db.begin_read().map_err(|e| CacheError::Backend(e.to_string()))?;
        let table =
            read_txn.open_table(EMBEDDINGS_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
        match table.get(key.as_str()).map_err(|e| CacheError::Backend(e.to_string()))? {
            Some(raw) => {
                let (entry, _): (EmbeddingEntry, usize) =
                    bincode::serde::decode_from_slice(raw.value(), bincode::config::standard())
                        .map_err(|e| CacheError::Corrupt(e.to_string()))?;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.vector))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    pub fn set_embedding(
        &self,
        hash_hex: &str,
        model_id: &str,
        model_version: &str,
        vector: Vec<f32>,
    ) -> Result<(), CacheError> {
        let key = embedding_key(hash_hex, model_id, model_version);
        let entry = EmbeddingEntry { vector, created_at_unix_ms: now_unix_ms() };
        let bytes = bincode::serde::encode_to_vec(&entry, bincode::config::standard())
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let write_txn = self.db.begin_write().map_err(|e| CacheError::Backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(EMBEDDINGS_TABLE)
                .map_err(|e| CacheError::Backend(e.to_string()))?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(|e| CacheError::Backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(())
    }

    pub fn get_heuristic(
        &self,
        hash_hex: &str,
        detector_version: &str,
    ) -> Result<Option<heuristic::SignalResult>, CacheError> {
        let key = heuristic_key(hash_hex, detector_version);
        let read_txn = self.db.begin_read().map_err(|e| CacheError::Backend(e.to_string()))?;
        let table =
            read_txn.open_table(HEURISTICS_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
        match table.get(key.as_str()).map_err(|e| CacheError::Backend(e.to_string()))? {
            Some(raw) => {
                let (entry, _): (HeuristicEntry, usize) =
                    bincode::serde::decode_from_slice(raw.value(), bincode::config::standard())
                        .map_err(|e| CacheError::Corrupt(e.to_string()))?;
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(Some(entry.signal))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    pub fn set_heuristic(
        &self,
        hash_hex: &str,
        detector_version: &str,
        signal: heuristic::SignalResult,
    ) -> Result<(), CacheError> {
        let key = heuristic_key(hash_hex, detector_version);
        let entry = HeuristicEntry { signal, created_at_unix_ms: now_unix_ms() };
        let bytes = bincode::serde::encode_to_vec(&entry, bincode::config::standard())
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        let write_txn = self.db.begin_write().map_err(|e| CacheError::Backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(HEURISTICS_TABLE)
                .map_err(|e| CacheError::Backend(e.to_string()))?;
            table
                .insert(key.as_str(), bytes.as_slice())
                .map_err(|e| CacheError::Backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| CacheError::Backend(e.to_string()))?;
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 { 0.0 } else { hits as f64 / total as f64 };
        CacheStats { hits, misses, hit_rate }
    }

    /// Clear every namespace. Used both for explicit cache-busting and for
    /// schema-version-mismatch recovery at open time. Drops and recreates
    /// each table rather than removing keys one at a time.
    pub fn clear(&self) -> Result<(), CacheError> {
        let write_txn = self.db.begin_write().map_err(|e| CacheError::Backend(e.to_string()))?;
        {
            write_txn
                .delete_table(EMBEDDINGS_TABLE)
                .map_err(|e| CacheError::Backend(e.to_string()))?;
            write_txn
                .delete_table(HEURISTICS_TABLE)
                .map_err(|e| CacheError::Backend(e.to_string()))?;
            // Recreate immediately so subsequent reads never see a missing table.
            write_txn.open_table(EMBEDDINGS_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
            write_txn.open_table(HEURISTICS_TABLE).map_err(|e| CacheError::Backend(e.to_string()))?;
        }
        write_txn.commit().map_err(|e| CacheError::Backend(e.to_string()))?;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        Ok(())
    }
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn temp_cache() -> (PersistentCache, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.redb");
        (PersistentCache::open(path).unwrap(), dir)
    }

    #[test]
    fn embedding_roundtrip() {
        let (cache, _dir) = temp_cache();
        assert!(cache.get_embedding("hash1", "model-a", "v1").unwrap().is_none());
        cache.set_embedding("hash1", "model-a", "v1", vec![1.0, 2.0, 3.0]).unwrap();
        let result = cache.get_embedding("hash1", "model-a", "v1").unwrap();
        assert_eq!(result, Some(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn heuristic_roundtrip() {
        let (cache, _dir) = temp_cache();
        let signal = heuristic::SignalResult {
            score: 0.42,
            reasons: vec!["test".to_string()],
            spans: Vec::new(),
            features: BTreeMap::new(),
            detector_version: "heuristic-v1",
        };
        cache.set_heuristic("hash2", "heuristic-v1", signal.clone()).unwrap();
        let fetched = cache.get_heuristic("hash2", "heuristic-v1").unwrap().unwrap();
        assert_eq!(fetched.score, signal.score);
        assert_eq!(fetched.reasons, signal.reasons);
    }

    #[test]
    fn version_change_misses_transparently() {
        let (cache, _dir) = temp_cache();
        cache.set_embedding("hash3", "model-a", "v1", vec![9.0]).unwrap();
        assert!(cache.get_embedding("hash3", "model-a", "v2").unwrap().is_none());
        assert!(cache.get_embedding("hash3", "model-a", "v1").unwrap().is_some());
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let (cache, _dir) = temp_cache();
        cache.set_embedding("hash4", "model-a", "v1", vec![1.0]).unwrap();
        let _ = cache.get_embedding("hash4", "model-a", "v1").unwrap();
        let _ = cache.get_embedding("missing", "model-a", "v1").unwrap();
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn clear_removes_all_entries() {
        let (cache, _dir) = temp_cache();
        cache.set_embedding("hash5", "model-a", "v1", vec![1.0]).unwrap();
        cache.clear().unwrap();
        assert!(cache.get_embedding("hash5", "model-a", "v1").unwrap().is_none());
    }

    #[test]
    fn schema_version_mismatch_clears_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.redb");
        {
            let cache = PersistentCache::open(&path).unwrap();
            cache.set_embedding("hash6", "model-a", "v1", vec![7.0]).unwrap();
        }
        // Re-opening with the same schema version must preserve entries.
        let cache = PersistentCache::open(&path).unwrap();
        assert!(cache.get_embedding("hash6", "model-a", "v1").unwrap().is_some());
    }
}
