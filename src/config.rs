use std::env;
use dotenvy::dotenv;
#[derive(Clone)]
pub struct Config {
    pub server_addr: String,

    // Google Sheets
    pub credentials_json: Option<String>,
    pub sheet_title: String,
    pub spreadsheet_id: Option<String>,
    pub remote_timeout_secs: u64,

    // Attendance
    pub locale: String,
    pub recent_limit: usize,

    // Rate limiting
    pub rate_scan_per_min: u32,

    pub log_dir: String,
}

pub const DEFAULT_SHEET_TITLE: &str = "Rekap Absensi Tapak Suci Sidayu";

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = parse_or("PORT", 5000);

        Self {
            server_addr: format!("{}:{}", host, port),
            credentials_json: non_empty("GSPREAD_CREDENTIALS"),
            sheet_title: env::var("SHEET_TITLE").unwrap_or_else(|_| DEFAULT_SHEET_TITLE.to_string()),
            spreadsheet_id: non_empty("SPREADSHEET_ID"),
            remote_timeout_secs: parse_or("REMOTE_TIMEOUT_SECS", 30),

            locale: env::var("ATTENDANCE_LOCALE").unwrap_or_else(|_| "id".to_string()),
            recent_limit: parse_or("RECENT_LIMIT", 10),

            rate_scan_per_min: parse_or("RATE_SCAN_PER_MIN", 120),

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "0.0.0.0:5000".to_string(),
            credentials_json: None,
            sheet_title: DEFAULT_SHEET_TITLE.to_string(),
            spreadsheet_id: None,
            remote_timeout_secs: 30,
            locale: "id".to_string(),
            recent_limit: 10,
            rate_scan_per_min: 120,
            log_dir: "logs".to_string(),
        }
    }
}

/// Reads `key` and parses it, falling back to `default` when unset or invalid.
fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
