use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row of a day's partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    #[serde(rename = "Kode")]
    pub code: String,
    #[serde(rename = "Nama")]
    pub name: String,
    /// Local time of day, `HH:MM:SS`.
    #[serde(rename = "Waktu")]
    pub time: String,
}

/// Projection of a record shown in the recent attendance list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecentEntry {
    #[serde(rename = "Nama")]
    #[schema(example = "BUDI SANTOSO")]
    pub name: String,
    #[serde(rename = "Waktu")]
    #[schema(example = "07:45:12")]
    pub time: String,
}

impl From<&AttendanceRecord> for RecentEntry {
    fn from(record: &AttendanceRecord) -> Self {
        Self {
            name: record.name.clone(),
            time: record.time.clone(),
        }
    }
}
