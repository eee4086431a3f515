mod auth;
mod client;
mod types;

pub use auth::GoogleAuth;
pub use client::{IMPORT_RANGE, PREVIEW_RANGE, SheetsClient};
pub use types::{FileHandle, SheetHandle};

use crate::error::Result;
use async_trait::async_trait;

/// Read-only spreadsheet provider operations, one session's credentials per
/// instance.
#[async_trait]
pub trait SheetsOperations {
    /// List spreadsheet files visible to the user. First page only.
    async fn list_spreadsheets(&self) -> Result<Vec<FileHandle>>;

    /// List every tab in a spreadsheet file.
    async fn list_sheets(&self, file_id: &str) -> Result<Vec<SheetHandle>>;

    /// Fetch a rectangular block of cell values, optionally scoped to a tab
    /// by name. Zero rows is a valid result, not an error.
    async fn fetch_range(
        &self,
        file_id: &str,
        sheet_name: Option<&str>,
        range: &str,
    ) -> Result<Vec<Vec<String>>>;
}
