use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use super::{LoadedPartition, PartitionRef, PartitionStore, StoreError};
use crate::model::table::{AttendanceTable, HEADER};

pub const MEMORY_STORE_ID: &str = "memory";

/// In-process partition store with the same create-on-miss behaviour as the
/// sheets gateway. Failures can be switched on to exercise degraded paths.
#[derive(Default)]
pub struct MemoryStore {
    partitions: Mutex<HashMap<String, Vec<Vec<String>>>>,
    store_missing: AtomicBool,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every load sleeps for `latency` between reading and returning.
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    pub fn set_store_missing(&self, missing: bool) {
        self.store_missing.store(missing, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw rows of a partition, header included.
    pub fn rows(&self, name: &str) -> Option<Vec<Vec<String>>> {
        self.partitions.lock().ok()?.get(name).cloned()
    }

    pub fn insert_rows(&self, name: &str, rows: Vec<Vec<String>>) {
        if let Ok(mut partitions) = self.partitions.lock() {
            partitions.insert(name.to_string(), rows);
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn poisoned() -> StoreError {
        StoreError::Malformed("memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl PartitionStore for MemoryStore {
    async fn load_partition(&self, name: &str) -> Result<LoadedPartition, StoreError> {
        if self.store_missing.load(Ordering::SeqCst) {
            return Err(StoreError::StoreNotFound(MEMORY_STORE_ID.to_string()));
        }

        let partition = PartitionRef {
            store_id: MEMORY_STORE_ID.to_string(),
            name: name.to_string(),
        };

        let existing = {
            let mut partitions = self.partitions.lock().map_err(|_| Self::poisoned())?;
            match partitions.get(name) {
                Some(rows) => Some(rows.clone()),
                None => {
                    let header = HEADER.iter().map(|h| h.to_string()).collect();
                    partitions.insert(name.to_string(), vec![header]);
                    None
                }
            }
        };

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let table = existing.map(AttendanceTable::from_rows).unwrap_or_default();
        Ok(LoadedPartition { table, partition })
    }

    async fn save_partition(
        &self,
        table: &AttendanceTable,
        partition: &PartitionRef,
    ) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Remote {
                status: 503,
                body: "write rejected".to_string(),
            });
        }

        self.partitions
            .lock()
            .map_err(|_| Self::poisoned())?
            .insert(partition.name.clone(), table.to_rows());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceRecord;

    #[tokio::test]
    async fn creates_partition_on_first_load() {
        let store = MemoryStore::new();
        let loaded = store.load_partition("SENIN_01-01-2024").await.unwrap();

        assert!(loaded.table.is_empty());
        assert_eq!(loaded.partition.name, "SENIN_01-01-2024");
        assert_eq!(store.rows("SENIN_01-01-2024").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_then_load_returns_records() {
        let store = MemoryStore::new();
        let mut loaded = store.load_partition("P").await.unwrap();
        loaded.table.push(AttendanceRecord {
            code: "A1".into(),
            name: "BUDI".into(),
            time: "07:00:00".into(),
        });
        store.save_partition(&loaded.table, &loaded.partition).await.unwrap();

        let reloaded = store.load_partition("P").await.unwrap();
        assert_eq!(reloaded.table, loaded.table);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn missing_store_and_failing_writes() {
        let store = MemoryStore::new();
        let loaded = store.load_partition("P").await.unwrap();

        store.set_fail_writes(true);
        assert!(matches!(
            store.save_partition(&loaded.table, &loaded.partition).await,
            Err(StoreError::Remote { status: 503, .. })
        ));

        store.set_store_missing(true);
        assert!(matches!(
            store.load_partition("P").await,
            Err(StoreError::StoreNotFound(_))
        ));
    }
}
