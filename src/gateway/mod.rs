//! Persistence of daily attendance partitions.
//!
//! The service talks to a [`PartitionStore`]; production uses the Google
//! Sheets gateway, tests use [`memory::MemoryStore`].

pub mod credentials;
pub mod error;
pub mod memory;
pub mod sheets;

use async_trait::async_trait;

use crate::model::table::AttendanceTable;
pub use error::StoreError;

/// Where a loaded partition lives, so a later save targets the same sheet
/// even if the day rolled over in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionRef {
    pub store_id: String,
    pub name: String,
}

#[derive(Debug)]
pub struct LoadedPartition {
    pub table: AttendanceTable,
    pub partition: PartitionRef,
}

#[async_trait]
pub trait PartitionStore: Send + Sync {
    /// Opens the named partition, creating it with the header row when it
    /// does not exist yet. A freshly created partition yields an empty table.
    async fn load_partition(&self, name: &str) -> Result<LoadedPartition, StoreError>;

    /// Rewrites the whole partition, header included.
    async fn save_partition(
        &self,
        table: &AttendanceTable,
        partition: &PartitionRef,
    ) -> Result<(), StoreError>;

    fn is_connected(&self) -> bool {
        true
    }
}

/// Stand-in used when the process started without a working connection.
pub struct Disconnected;

#[async_trait]
impl PartitionStore for Disconnected {
    async fn load_partition(&self, _name: &str) -> Result<LoadedPartition, StoreError> {
        Err(StoreError::NotConnected)
    }

    async fn save_partition(
        &self,
        _table: &AttendanceTable,
        _partition: &PartitionRef,
    ) -> Result<(), StoreError> {
        Err(StoreError::NotConnected)
    }

    fn is_connected(&self) -> bool {
        false
    }
}
