use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::gateway::PartitionStore;
use crate::model::attendance::{AttendanceRecord, RecentEntry};
use crate::model::scan::{ScanResult, ScanStatus};
use crate::partition::PartitionNamer;
use crate::utils::qr_payload;

pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Turns scan events into attendance rows in today's partition.
///
/// Scans against one partition are serialized through a per-partition lock
/// held across load, append and save, so two concurrent scans never
/// overwrite each other's rows.
pub struct AttendanceService {
    store: Arc<dyn PartitionStore>,
    namer: PartitionNamer,
    recent_limit: usize,
    locks: Cache<String, Arc<Mutex<()>>>,
}

impl AttendanceService {
    pub fn new(store: Arc<dyn PartitionStore>, namer: PartitionNamer, recent_limit: usize) -> Self {
        Self {
            store,
            namer,
            recent_limit,
            locks: Cache::builder()
                .time_to_idle(Duration::from_secs(24 * 60 * 60))
                .build(),
        }
    }

    pub fn store_connected(&self) -> bool {
        self.store.is_connected()
    }

    pub fn partition_name(&self) -> String {
        self.namer.partition_name()
    }

    async fn partition_lock(&self, name: &str) -> Arc<Mutex<()>> {
        self.locks
            .get_with(name.to_string(), async { Arc::new(Mutex::new(())) })
            .await
    }

    /// Records one scan in today's partition.
    pub async fn scan(&self, qr_data: &str) -> ScanResult {
        // Name and stamp come from one instant so a row never lands in the
        // neighbouring day's partition.
        let at = self.namer.now();
        let partition_name = self.namer.name_for(at);
        let now = self.namer.time_for(at);

        let lock = self.partition_lock(&partition_name).await;
        let _guard = lock.lock().await;

        let mut loaded = match self.store.load_partition(&partition_name).await {
            Ok(loaded) => loaded,
            Err(e) => {
                warn!(error = %e, partition = %partition_name, "Attendance store unavailable");
                return ScanResult::connection_error(now);
            }
        };

        let payload = match qr_payload::parse(qr_data) {
            Ok(payload) => payload,
            Err(e) => {
                info!(error = %e, "Rejected QR payload");
                return ScanResult::invalid_format(now);
            }
        };

        let registered_at = loaded
            .table
            .find_by_code(&payload.code)
            .map(|existing| existing.time.clone());

        let (status, time) = match registered_at {
            Some(first_time) => {
                debug!(code = %payload.code, time = %first_time, "Code already registered today");
                (ScanStatus::Registered, first_time)
            }
            None => {
                loaded.table.push(AttendanceRecord {
                    code: payload.code.clone(),
                    name: payload.name.clone(),
                    time: now.clone(),
                });

                let status = match self
                    .store
                    .save_partition(&loaded.table, &loaded.partition)
                    .await
                {
                    Ok(()) => ScanStatus::Success,
                    Err(_) => ScanStatus::PersistedWithWarning,
                };
                info!(code = %payload.code, partition = %partition_name, status = %status, "Attendance recorded");
                (status, now)
            }
        };

        ScanResult {
            nama: payload.name,
            kode: Some(payload.code),
            status,
            waktu: time,
            recent_attendance: Some(loaded.table.recent(self.recent_limit)),
        }
    }

    /// Most recent entries of today's partition. Empty when the store is
    /// unreachable.
    ///
    /// Loading may create the partition, so this takes the same lock as
    /// `scan`.
    pub async fn recent(&self) -> Vec<RecentEntry> {
        let partition_name = self.namer.partition_name();
        let lock = self.partition_lock(&partition_name).await;
        let _guard = lock.lock().await;

        match self.store.load_partition(&partition_name).await {
            Ok(loaded) => loaded.table.recent(self.recent_limit),
            Err(e) => {
                warn!(error = %e, partition = %partition_name, "Could not load recent attendance");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryStore;
    use crate::gateway::Disconnected;
    use crate::model::table::HEADER;
    use crate::partition::{FixedClock, WeekdayLocale};
    use chrono::NaiveDate;

    const PARTITION: &str = "JUMAT_24-10-2025";

    fn namer_at(h: u32, m: u32, s: u32) -> PartitionNamer {
        let at = NaiveDate::from_ymd_opt(2025, 10, 24)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap();
        PartitionNamer::new(Arc::new(FixedClock(at)), WeekdayLocale::Indonesian)
    }

    fn service(store: Arc<MemoryStore>, namer: PartitionNamer) -> AttendanceService {
        AttendanceService::new(store, namer, DEFAULT_RECENT_LIMIT)
    }

    #[tokio::test]
    async fn first_scan_succeeds_and_persists_row() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), namer_at(7, 15, 0));

        let result = svc.scan("A1_BUDI-SANTOSO").await;

        assert_eq!(result.status, ScanStatus::Success);
        assert_eq!(result.nama, "BUDI SANTOSO");
        assert_eq!(result.kode.as_deref(), Some("A1"));
        assert_eq!(result.waktu, "07:15:00");
        assert_eq!(
            store.rows(PARTITION).unwrap(),
            vec![
                HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>(),
                vec!["A1".to_string(), "BUDI SANTOSO".to_string(), "07:15:00".to_string()],
            ]
        );
    }

    #[tokio::test]
    async fn second_scan_returns_original_time() {
        let store = Arc::new(MemoryStore::new());
        service(store.clone(), namer_at(7, 15, 0)).scan("a1_budi-santoso").await;

        let later = service(store.clone(), namer_at(9, 0, 0));
        let result = later.scan("A1_BUDI-SANTOSO").await;

        assert_eq!(result.status, ScanStatus::Registered);
        assert_eq!(result.waktu, "07:15:00");
        assert_eq!(store.rows(PARTITION).unwrap().len(), 2);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn invalid_payload_does_not_touch_table() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone(), namer_at(7, 0, 0));

        let result = svc.scan("NOSEPARATORHERE").await;

        assert_eq!(result.status, ScanStatus::InvalidFormat);
        assert!(result.kode.is_none());
        assert!(result.recent_attendance.is_none());
        assert_eq!(store.save_count(), 0);
    }

    #[tokio::test]
    async fn connection_error_when_disconnected() {
        let svc = AttendanceService::new(Arc::new(Disconnected), namer_at(7, 0, 0), 10);

        let result = svc.scan("A1_BUDI").await;

        assert_eq!(result.status, ScanStatus::ConnectionError);
        assert_eq!(result.waktu, "07:00:00");
        assert!(svc.recent().await.is_empty());
        assert!(!svc.store_connected());
    }

    #[tokio::test]
    async fn missing_store_is_a_connection_error() {
        let store = Arc::new(MemoryStore::new());
        store.set_store_missing(true);

        let result = service(store, namer_at(7, 0, 0)).scan("A1_BUDI").await;
        assert_eq!(result.status, ScanStatus::ConnectionError);
    }

    #[tokio::test]
    async fn failed_write_is_reported_with_warning() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let svc = service(store.clone(), namer_at(8, 0, 0));

        let result = svc.scan("B2_SITI").await;

        assert_eq!(result.status, ScanStatus::PersistedWithWarning);
        assert_eq!(result.waktu, "08:00:00");
        assert_eq!(result.recent_attendance.unwrap().len(), 1);
        assert_eq!(store.rows(PARTITION).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn recent_is_capped_and_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let mut rows = vec![HEADER.iter().map(|h| h.to_string()).collect::<Vec<_>>()];
        for i in 0..12 {
            rows.push(vec![format!("C{i}"), format!("NAME {i}"), format!("07:{:02}:00", i)]);
        }
        store.insert_rows(PARTITION, rows);

        let recent = service(store, namer_at(9, 0, 0)).recent().await;

        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].time, "07:11:00");
        assert_eq!(recent[9].time, "07:02:00");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_scans_keep_every_row() {
        let store = Arc::new(MemoryStore::with_latency(Duration::from_millis(5)));
        let svc = Arc::new(service(store.clone(), namer_at(7, 0, 0)));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let svc = svc.clone();
                tokio::spawn(async move { svc.scan(&format!("K{i}_MEMBER-{i}")).await })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap().status, ScanStatus::Success);
        }

        assert_eq!(store.rows(PARTITION).unwrap().len(), 9);
    }

    /// Wraps a `MemoryStore` and records the highest number of loads that
    /// were in flight at the same time.
    struct OverlapStore {
        inner: MemoryStore,
        in_flight: std::sync::atomic::AtomicUsize,
        max_in_flight: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl PartitionStore for OverlapStore {
        async fn load_partition(
            &self,
            name: &str,
        ) -> Result<crate::gateway::LoadedPartition, crate::gateway::StoreError> {
            use std::sync::atomic::Ordering;

            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(current, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            let loaded = self.inner.load_partition(name).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            loaded
        }

        async fn save_partition(
            &self,
            table: &crate::model::table::AttendanceTable,
            partition: &crate::gateway::PartitionRef,
        ) -> Result<(), crate::gateway::StoreError> {
            self.inner.save_partition(table, partition).await
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn page_load_and_scan_never_load_the_partition_together() {
        let store = Arc::new(OverlapStore {
            inner: MemoryStore::new(),
            in_flight: Default::default(),
            max_in_flight: Default::default(),
        });
        let svc = Arc::new(AttendanceService::new(store.clone(), namer_at(7, 0, 0), 10));

        let scanning = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.scan("A1_BUDI").await })
        };
        let reading = {
            let svc = svc.clone();
            tokio::spawn(async move { svc.recent().await })
        };

        assert_eq!(scanning.await.unwrap().status, ScanStatus::Success);
        reading.await.unwrap();
        assert_eq!(store.max_in_flight.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    /// Hands out the queued instants in order, then repeats the last one.
    struct SteppingClock(std::sync::Mutex<Vec<chrono::NaiveDateTime>>);

    impl crate::partition::Clock for SteppingClock {
        fn now(&self) -> chrono::NaiveDateTime {
            let mut instants = self.0.lock().unwrap();
            if instants.len() > 1 {
                instants.remove(0)
            } else {
                instants[0]
            }
        }
    }

    #[tokio::test]
    async fn scan_at_midnight_stays_in_one_day() {
        let day = |d: u32, h: u32, m: u32, s: u32| {
            NaiveDate::from_ymd_opt(2025, 10, d)
                .unwrap()
                .and_hms_opt(h, m, s)
                .unwrap()
        };
        let clock = SteppingClock(std::sync::Mutex::new(vec![day(23, 23, 59, 59), day(24, 0, 0, 1)]));
        let store = Arc::new(MemoryStore::new());
        let svc = service(
            store.clone(),
            PartitionNamer::new(Arc::new(clock), WeekdayLocale::Indonesian),
        );

        let result = svc.scan("A1_BUDI").await;

        assert_eq!(result.waktu, "23:59:59");
        let rows = store.rows("KAMIS_23-10-2025").unwrap();
        assert_eq!(rows[1], vec!["A1".to_string(), "BUDI".to_string(), "23:59:59".to_string()]);
        assert!(store.rows(PARTITION).is_none());
    }
}
