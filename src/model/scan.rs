use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

use super::attendance::RecentEntry;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    #[schema(example = "A1_BUDI-SANTOSO")]
    pub qr_data: Option<String>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStatus {
    /// New row appended and written back.
    Success,
    /// Code already present in today's partition.
    Registered,
    InvalidFormat,
    ConnectionError,
    /// New row appended but the write-back failed.
    PersistedWithWarning,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "nama": "BUDI SANTOSO",
        "kode": "A1",
        "status": "SUCCESS",
        "waktu": "07:45:12",
        "recent_attendance": [{ "Nama": "BUDI SANTOSO", "Waktu": "07:45:12" }]
    })
)]
pub struct ScanResult {
    pub nama: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kode: Option<String>,
    pub status: ScanStatus,
    pub waktu: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_attendance: Option<Vec<RecentEntry>>,
}

pub const CONNECTION_ERROR_NAME: &str = "Gagal Koneksi GSheets";
pub const INVALID_FORMAT_NAME: &str = "Format QR Tidak Valid";

impl ScanResult {
    pub fn connection_error(time: String) -> Self {
        Self {
            nama: CONNECTION_ERROR_NAME.to_string(),
            kode: None,
            status: ScanStatus::ConnectionError,
            waktu: time,
            recent_attendance: None,
        }
    }

    pub fn invalid_format(time: String) -> Self {
        Self {
            nama: INVALID_FORMAT_NAME.to_string(),
            kode: None,
            status: ScanStatus::InvalidFormat,
            waktu: time,
            recent_attendance: None,
        }
    }
}
