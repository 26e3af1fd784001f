//! Google Sheets API v4 client.
//!
//! A thin wrapper over the REST endpoints the dashboard needs, using a
//! bearer access token minted outside this process.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{SpreadsheetBackend, Worksheet};
use crate::error::{DashboardError, Result};
use crate::table::CellValue;

/// Default API endpoint.
pub const DEFAULT_API_BASE: &str = "https://sheets.googleapis.com";

/// OAuth scopes the access token must carry.
pub const SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/spreadsheets",
    "https://www.googleapis.com/auth/drive",
];

/// Sheets API client bound to a single spreadsheet.
pub struct SheetsClient {
    client: Client,
    base_url: String,
    spreadsheet_id: String,
    access_token: String,
}

#[derive(Deserialize)]
struct SpreadsheetInfo {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SheetProperties {
    sheet_id: i64,
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AppendBody<'a> {
    major_dimension: &'static str,
    values: [&'a [CellValue]; 1],
}

#[derive(Deserialize)]
struct BatchUpdateResponse {
    #[serde(default)]
    replies: Vec<BatchReply>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchReply {
    add_sheet: Option<SheetEntry>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl SheetsClient {
    /// Client for `spreadsheet_id` against the public Google endpoint.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::Http` if the HTTP client cannot be built.
    pub fn new(spreadsheet_id: &str, access_token: &str) -> Result<Self> {
        Self::with_base_url(DEFAULT_API_BASE, spreadsheet_id, access_token)
    }

    /// Client against a custom endpoint, e.g. a local mock server.
    pub fn with_base_url(base_url: &str, spreadsheet_id: &str, access_token: &str) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            spreadsheet_id: spreadsheet_id.to_string(),
            access_token: access_token.to_string(),
        })
    }

    fn spreadsheet_url(&self) -> String {
        format!(
            "{}/v4/spreadsheets/{}",
            self.base_url,
            urlencoding::encode(&self.spreadsheet_id)
        )
    }

    fn values_url(&self, title: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(),
            urlencoding::encode(&a1_range(title))
        )
    }

    /// Turn a non-success response into `DashboardError::Api`.
    async fn check(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(parsed) => parsed.error.message,
            Err(_) if body.is_empty() => status.canonical_reason().unwrap_or("Unknown").to_string(),
            Err(_) => body,
        };

        Err(DashboardError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Quote a worksheet title as an A1 range covering the whole sheet.
///
/// # Examples
/// ```
/// use sheetboard::sheets_api::a1_range;
///
/// assert_eq!(a1_range("Cluster 6"), "'Cluster 6'");
/// assert_eq!(a1_range("Jan's"), "'Jan''s'");
/// ```
pub fn a1_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[async_trait]
impl SpreadsheetBackend for SheetsClient {
    async fn find_worksheet(&self, title: &str) -> Result<Option<Worksheet>> {
        log::debug!("Looking up worksheet '{}'", title);
        let response = self
            .client
            .get(self.spreadsheet_url())
            .query(&[("fields", "sheets.properties")])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let info: SpreadsheetInfo = Self::check(response).await?.json().await?;

        Ok(info
            .sheets
            .into_iter()
            .map(|s| s.properties)
            .find(|p| p.title == title)
            .map(|p| Worksheet {
                id: p.sheet_id,
                title: p.title,
            }))
    }

    async fn get_all_values(&self, worksheet: &Worksheet) -> Result<Vec<Vec<CellValue>>> {
        log::debug!("Reading all values of '{}'", worksheet.title);
        let response = self
            .client
            .get(self.values_url(&worksheet.title))
            .query(&[
                ("majorDimension", "ROWS"),
                ("valueRenderOption", "FORMATTED_VALUE"),
            ])
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        let range: ValueRange = Self::check(response).await?.json().await?;

        Ok(range
            .values
            .iter()
            .map(|row| row.iter().map(CellValue::from_json).collect())
            .collect())
    }

    async fn append_row(&self, worksheet: &Worksheet, row: &[CellValue]) -> Result<()> {
        log::debug!("Appending {} cells to '{}'", row.len(), worksheet.title);
        let url = format!("{}:append", self.values_url(&worksheet.title));
        let response = self
            .client
            .post(url)
            .query(&[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")])
            .bearer_auth(&self.access_token)
            .json(&AppendBody {
                major_dimension: "ROWS",
                values: [row],
            })
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }

    async fn add_worksheet(&self, title: &str, rows: u32, cols: u32) -> Result<Worksheet> {
        log::debug!("Adding worksheet '{}' ({}x{})", title, rows, cols);
        let body = serde_json::json!({
            "requests": [{
                "addSheet": {
                    "properties": {
                        "title": title,
                        "gridProperties": { "rowCount": rows, "columnCount": cols }
                    }
                }
            }]
        });

        let response = self
            .client
            .post(format!("{}:batchUpdate", self.spreadsheet_url()))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;

        let reply: BatchUpdateResponse = Self::check(response).await?.json().await?;

        reply
            .replies
            .into_iter()
            .find_map(|r| r.add_sheet)
            .map(|entry| Worksheet {
                id: entry.properties.sheet_id,
                title: entry.properties.title,
            })
            .ok_or_else(|| {
                DashboardError::MalformedResponse("batchUpdate reply has no addSheet".to_string())
            })
    }
}
