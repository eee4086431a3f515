use crate::error::{AppError, Result};
use crate::google::{IMPORT_RANGE, PREVIEW_RANGE, SheetsOperations};
use crate::mapper::{self, ColumnMapping, MappingSummary};
use crate::models::TransactionRecord;
use crate::sink::ImportSink;

/// Rows shown back to the user before they commit to a mapping.
const PREVIEW_SAMPLE_ROWS: usize = 5;

#[derive(Debug)]
pub struct PreviewOutcome {
    pub headers: Vec<String>,
    pub sample: Vec<TransactionRecord>,
}

#[derive(Debug)]
pub struct ImportOutcome {
    pub count: usize,
    pub summary: MappingSummary,
}

/// Fetch the narrow preview range and map it with the positional default.
/// Only the sample is capped; the mapping pass covers every body row.
pub async fn preview<C: SheetsOperations>(
    client: &C,
    file_id: &str,
    sheet_name: Option<&str>,
) -> Result<PreviewOutcome> {
    let rows = client.fetch_range(file_id, sheet_name, PREVIEW_RANGE).await?;
    let (headers, body_rows) = split_header(rows);

    let batch = mapper::map_rows(&body_rows, &ColumnMapping::positional());

    let mut sample = batch.records;
    sample.truncate(PREVIEW_SAMPLE_ROWS);

    Ok(PreviewOutcome { headers, sample })
}

/// Fetch the wide import range, map every body row with the caller's
/// mapping, and hand the whole batch to the sink. All-or-nothing: the
/// response carries the income/expense summary but no per-row outcomes.
pub async fn import<C: SheetsOperations>(
    client: &C,
    sink: &dyn ImportSink,
    file_id: &str,
    sheet_name: Option<&str>,
    mapping: &ColumnMapping,
) -> Result<ImportOutcome> {
    if mapping.amount.is_none() {
        return Err(AppError::Validation(
            "Amount column mapping is required".to_string(),
        ));
    }

    let rows = client.fetch_range(file_id, sheet_name, IMPORT_RANGE).await?;
    let (_, body_rows) = split_header(rows);

    let batch = mapper::map_rows(&body_rows, mapping);
    let count = sink.save(&batch.records).await?;

    Ok(ImportOutcome {
        count,
        summary: batch.summary,
    })
}

/// First row is the header; everything after is data.
fn split_header(rows: Vec<Vec<String>>) -> (Vec<String>, Vec<Vec<String>>) {
    let mut rows = rows.into_iter();
    let headers = rows.next().unwrap_or_default();
    (headers, rows.collect())
}
