use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};

use super::credentials::ServiceAccountKey;
use super::{LoadedPartition, PartitionRef, PartitionStore, StoreError};
use crate::config::Config;
use crate::model::table::{AttendanceTable, HEADER};

pub const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DRIVE_FILES_API: &str = "https://www.googleapis.com/drive/v3/files";
const SCOPES: &str =
    "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive.readonly";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

const TOKEN_KEY: &str = "access_token";
/// Google issues tokens for an hour; refresh well before that.
const TOKEN_TTL: Duration = Duration::from_secs(50 * 60);

const NEW_SHEET_ROWS: u32 = 100;
const NEW_SHEET_COLS: u32 = 3;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Deserialize)]
struct SpreadsheetMeta {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
struct SheetProperties {
    title: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    major_dimension: Option<String>,
    #[serde(default)]
    values: Vec<Vec<String>>,
}

/// Base URLs of the Sheets and Drive APIs.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub sheets_api: String,
    pub drive_files_api: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            sheets_api: SHEETS_API.to_string(),
            drive_files_api: DRIVE_FILES_API.to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Same API paths served from another origin, e.g. `http://127.0.0.1:8080`.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            sheets_api: format!("{}/v4/spreadsheets", base),
            drive_files_api: format!("{}/drive/v3/files", base),
        }
    }
}

/// Google Sheets backed partition store. One spreadsheet (found by title)
/// holds one worksheet per day.
pub struct SheetsGateway {
    http: reqwest::Client,
    key: ServiceAccountKey,
    endpoints: GoogleEndpoints,
    title: String,
    spreadsheet_id: Option<String>,
    tokens: Cache<String, String>,
    ids: Cache<String, String>,
}

impl SheetsGateway {
    /// Parses the service-account blob and fetches a first access token so a
    /// broken setup is reported at startup.
    pub async fn connect(credentials_json: Option<&str>, config: &Config) -> Result<Self, StoreError> {
        let raw = credentials_json
            .ok_or_else(|| StoreError::Credentials("GSPREAD_CREDENTIALS is not set".to_string()))?;
        let key = ServiceAccountKey::from_json(raw)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.remote_timeout_secs))
            .build()?;

        let gateway = Self::new(
            http,
            key,
            GoogleEndpoints::default(),
            config.sheet_title.clone(),
            config.spreadsheet_id.clone(),
        );

        gateway.access_token().await?;
        info!(
            client_email = %gateway.key.client_email,
            sheet = %gateway.title,
            "Google Sheets session established"
        );

        Ok(gateway)
    }

    pub fn new(
        http: reqwest::Client,
        key: ServiceAccountKey,
        endpoints: GoogleEndpoints,
        title: String,
        spreadsheet_id: Option<String>,
    ) -> Self {
        Self {
            http,
            key,
            endpoints,
            title,
            spreadsheet_id,
            tokens: Cache::builder().max_capacity(1).time_to_live(TOKEN_TTL).build(),
            ids: Cache::builder().max_capacity(16).build(),
        }
    }

    async fn access_token(&self) -> Result<String, StoreError> {
        if let Some(token) = self.tokens.get(TOKEN_KEY).await {
            return Ok(token);
        }

        debug!("Requesting new access token");
        let assertion = self.key.assertion(SCOPES, chrono::Utc::now().timestamp())?;
        let resp = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let token: TokenResponse = parse_json(resp).await?;

        self.tokens
            .insert(TOKEN_KEY.to_string(), token.access_token.clone())
            .await;
        Ok(token.access_token)
    }

    /// Resolves the spreadsheet id, by configuration or by title through Drive.
    async fn open_store(&self, token: &str) -> Result<String, StoreError> {
        if let Some(id) = &self.spreadsheet_id {
            return Ok(id.clone());
        }
        if let Some(id) = self.ids.get(&self.title).await {
            return Ok(id);
        }

        let query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            self.title.replace('\\', "\\\\").replace('\'', "\\'"),
            SPREADSHEET_MIME
        );
        let resp = self
            .http
            .get(&self.endpoints.drive_files_api)
            .bearer_auth(token)
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "1"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;
        let list: DriveFileList = parse_json(resp).await?;

        let id = list
            .files
            .into_iter()
            .next()
            .map(|f| f.id)
            .ok_or_else(|| StoreError::StoreNotFound(self.title.clone()))?;

        self.ids.insert(self.title.clone(), id.clone()).await;
        Ok(id)
    }

    async fn sheet_exists(&self, token: &str, store_id: &str, name: &str) -> Result<bool, StoreError> {
        let resp = self
            .http
            .get(format!("{}/{}", self.endpoints.sheets_api, store_id))
            .bearer_auth(token)
            .query(&[("fields", "sheets.properties(sheetId,title)")])
            .send()
            .await?;
        let meta: SpreadsheetMeta = parse_json(resp).await?;

        Ok(meta.sheets.iter().any(|s| s.properties.title == name))
    }

    async fn add_sheet(&self, token: &str, store_id: &str, name: &str) -> Result<(), StoreError> {
        let body = json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": name,
                        "gridProperties": {
                            "rowCount": NEW_SHEET_ROWS,
                            "columnCount": NEW_SHEET_COLS
                        }
                    }
                }
            }]
        });

        let resp = self
            .http
            .post(format!("{}/{}:batchUpdate", self.endpoints.sheets_api, store_id))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        parse_json::<serde_json::Value>(resp).await?;
        Ok(())
    }

    async fn read_rows(&self, token: &str, store_id: &str, name: &str) -> Result<Vec<Vec<String>>, StoreError> {
        let resp = self
            .http
            .get(values_url(&self.endpoints.sheets_api, store_id, &a1_range(name, None))?)
            .bearer_auth(token)
            .send()
            .await?;
        let range: ValueRange = parse_json(resp).await?;
        Ok(range.values)
    }

    /// Writes `rows` starting at `A1`. RAW input keeps `HH:MM:SS` as text.
    async fn write_rows(
        &self,
        token: &str,
        store_id: &str,
        name: &str,
        rows: Vec<Vec<String>>,
    ) -> Result<(), StoreError> {
        let range = a1_range(name, Some("A1"));
        let body = ValueRange {
            range: Some(range.clone()),
            major_dimension: Some("ROWS".to_string()),
            values: rows,
        };

        let resp = self
            .http
            .put(values_url(&self.endpoints.sheets_api, store_id, &range)?)
            .bearer_auth(token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;
        parse_json::<serde_json::Value>(resp).await?;
        Ok(())
    }

    async fn write_partition(&self, table: &AttendanceTable, partition: &PartitionRef) -> Result<(), StoreError> {
        let token = self.access_token().await?;
        self.write_rows(&token, &partition.store_id, &partition.name, table.to_rows())
            .await
    }
}

#[async_trait]
impl PartitionStore for SheetsGateway {
    #[instrument(skip(self))]
    async fn load_partition(&self, name: &str) -> Result<LoadedPartition, StoreError> {
        let token = self.access_token().await?;
        let store_id = self.open_store(&token).await?;
        let partition = PartitionRef {
            store_id: store_id.clone(),
            name: name.to_string(),
        };

        if !self.sheet_exists(&token, &store_id, name).await? {
            self.add_sheet(&token, &store_id, name).await?;
            let header = vec![HEADER.iter().map(|h| h.to_string()).collect()];
            self.write_rows(&token, &store_id, name, header).await?;
            info!(worksheet = %name, "New worksheet created");

            return Ok(LoadedPartition {
                table: AttendanceTable::default(),
                partition,
            });
        }

        let rows = self.read_rows(&token, &store_id, name).await?;
        debug!(worksheet = %name, rows = rows.len(), "Worksheet loaded");

        Ok(LoadedPartition {
            table: AttendanceTable::from_rows(rows),
            partition,
        })
    }

    async fn save_partition(
        &self,
        table: &AttendanceTable,
        partition: &PartitionRef,
    ) -> Result<(), StoreError> {
        match self.write_partition(table, partition).await {
            Ok(()) => {
                info!(
                    sheet = %self.title,
                    worksheet = %partition.name,
                    rows = table.len(),
                    "Attendance saved to Google Sheets"
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, worksheet = %partition.name, "Failed to save attendance to Google Sheets");
                Err(e)
            }
        }
    }
}

async fn parse_json<T: DeserializeOwned>(resp: Response) -> Result<T, StoreError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(StoreError::Remote {
            status: status.as_u16(),
            body,
        });
    }

    Ok(resp.json::<T>().await?)
}

/// A1 notation for a worksheet, quoting the title (`'` is doubled).
fn a1_range(sheet: &str, cell: Option<&str>) -> String {
    let quoted = format!("'{}'", sheet.replace('\'', "''"));
    match cell {
        Some(cell) => format!("{}!{}", quoted, cell),
        None => quoted,
    }
}

fn values_url(sheets_api: &str, store_id: &str, range: &str) -> Result<Url, StoreError> {
    let mut url = Url::parse(sheets_api).map_err(|e| StoreError::Malformed(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| StoreError::Malformed("sheets api url cannot be a base".to_string()))?
        .push(store_id)
        .push("values")
        .push(range);
    Ok(url)
}
