use serde::{Deserialize, Serialize};

/// A discovered spreadsheet file. Transient: refetched on every discovery
/// call, never cached.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileHandle {
    pub id: String,
    pub name: String,
}

/// A single tab within a spreadsheet file.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SheetHandle {
    pub id: i64,
    pub name: String,
    pub index: i64,
}

// https://developers.google.com/drive/api/reference/rest/v3/files/list
#[derive(Debug, Deserialize)]
pub(super) struct FileListResponse {
    #[serde(default)]
    pub(super) files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DriveFile {
    pub(super) id: String,
    pub(super) name: String,
}

impl From<DriveFile> for FileHandle {
    fn from(file: DriveFile) -> Self {
        FileHandle {
            id: file.id,
            name: file.name,
        }
    }
}

// https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets/get
#[derive(Debug, Deserialize)]
pub(super) struct SpreadsheetResponse {
    #[serde(default)]
    pub(super) sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SheetEntry {
    pub(super) properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SheetProperties {
    pub(super) sheet_id: i64,
    pub(super) title: String,
    #[serde(default)]
    pub(super) index: i64,
}

impl From<SheetProperties> for SheetHandle {
    fn from(props: SheetProperties) -> Self {
        SheetHandle {
            id: props.sheet_id,
            name: props.title,
            index: props.index,
        }
    }
}

// https://developers.google.com/sheets/api/reference/rest/v4/spreadsheets.values/get
//
// Cells arrive as JSON values whose concrete type depends on the render
// option, so they are normalized to strings at the boundary.
#[derive(Debug, Deserialize)]
pub(super) struct ValueRangeResponse {
    #[serde(default)]
    pub(super) values: Vec<Vec<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_list_deserialization() {
        let payload = serde_json::json!({
            "kind": "drive#fileList",
            "files": [
                { "id": "file_1", "name": "Budget 2024" },
                { "id": "file_2", "name": "Household" },
            ],
        });

        let response: FileListResponse = serde_json::from_value(payload).unwrap();
        let files: Vec<FileHandle> = response.files.into_iter().map(Into::into).collect();

        assert_eq!(
            files,
            vec![
                FileHandle {
                    id: "file_1".to_string(),
                    name: "Budget 2024".to_string(),
                },
                FileHandle {
                    id: "file_2".to_string(),
                    name: "Household".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_spreadsheet_deserialization() {
        let payload = serde_json::json!({
            "sheets": [
                { "properties": { "sheetId": 0, "title": "Transactions", "index": 0 } },
                { "properties": { "sheetId": 913, "title": "Savings", "index": 1 } },
            ],
        });

        let response: SpreadsheetResponse = serde_json::from_value(payload).unwrap();
        let sheets: Vec<SheetHandle> = response
            .sheets
            .into_iter()
            .map(|s| s.properties.into())
            .collect();

        assert_eq!(sheets[1].id, 913);
        assert_eq!(sheets[1].name, "Savings");
        assert_eq!(sheets[1].index, 1);
    }

    #[test]
    fn test_empty_value_range_is_valid() {
        // A range with no data comes back without a `values` key at all.
        let payload = serde_json::json!({
            "range": "Sheet1!A1:F1000",
            "majorDimension": "ROWS",
        });

        let response: ValueRangeResponse = serde_json::from_value(payload).unwrap();
        assert!(response.values.is_empty());
    }
}
