use super::SheetsOperations;
use super::types::{
    FileHandle, FileListResponse, SheetHandle, SpreadsheetResponse, ValueRangeResponse,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// Spreadsheet files returned per discovery call. Single page only; files
/// beyond the first page are not listed.
const DISCOVERY_PAGE_SIZE: u32 = 10;

/// Narrow range for previews: just the six columns the positional mapping
/// reads.
pub const PREVIEW_RANGE: &str = "A1:F";
/// Wide range for imports: explicit mappings may point anywhere in A..Z.
pub const IMPORT_RANGE: &str = "A1:Z";

/// Read-only Sheets/Drive client bound to one session's access token.
/// Constructed per request; holds no state beyond the token.
pub struct SheetsClient {
    client: Client,
    access_token: String,
}

impl SheetsClient {
    pub fn new(client: Client, access_token: String) -> Self {
        Self {
            client,
            access_token,
        }
    }
}

#[async_trait]
impl SheetsOperations for SheetsClient {
    #[instrument(name = "Listing spreadsheets", skip_all)]
    async fn list_spreadsheets(&self) -> Result<Vec<FileHandle>> {
        let url = format!("{}/files", DRIVE_API_BASE);
        let page_size = DISCOVERY_PAGE_SIZE.to_string();

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", "mimeType='application/vnd.google-apps.spreadsheet'"),
                ("fields", "files(id, name)"),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteApi {
                status,
                message: format!("Failed to list spreadsheets: {}", body),
            });
        }

        let files: FileListResponse = response.json().await?;

        Ok(files.files.into_iter().map(Into::into).collect())
    }

    #[instrument(name = "Listing sheet tabs", skip_all, fields(file_id))]
    async fn list_sheets(&self, file_id: &str) -> Result<Vec<SheetHandle>> {
        let url = format!("{}/spreadsheets/{}", SHEETS_API_BASE, file_id);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[("fields", "sheets.properties")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteApi {
                status,
                message: format!("Failed to list sheet tabs: {}", body),
            });
        }

        let spreadsheet: SpreadsheetResponse = response.json().await?;

        Ok(spreadsheet
            .sheets
            .into_iter()
            .map(|sheet| sheet.properties.into())
            .collect())
    }

    #[instrument(name = "Fetching range", skip_all, fields(file_id, range))]
    async fn fetch_range(
        &self,
        file_id: &str,
        sheet_name: Option<&str>,
        range: &str,
    ) -> Result<Vec<Vec<String>>> {
        let range_expr = qualified_range(sheet_name, range);
        let url = format!(
            "{}/spreadsheets/{}/values/{}",
            SHEETS_API_BASE,
            file_id,
            urlencoding::encode(&range_expr)
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::RemoteApi {
                status,
                message: format!("Failed to fetch range '{}': {}", range_expr, body),
            });
        }

        let values: ValueRangeResponse = response.json().await?;

        Ok(values
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }
}

/// Scope a range expression to a tab. Sheet names are quoted since they may
/// contain spaces.
fn qualified_range(sheet_name: Option<&str>, range: &str) -> String {
    match sheet_name {
        Some(name) if !name.is_empty() => format!("'{}'!{}", name, range),
        _ => range.to_string(),
    }
}

fn cell_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
