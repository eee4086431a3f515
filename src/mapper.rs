use crate::models::{TransactionRecord, TransactionType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

/// Association from logical record field to source column index. Import
/// requests carry explicit indices; previews use [`ColumnMapping::positional`].
/// An unmapped field yields an empty value, not an error.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ColumnMapping {
    pub date: Option<usize>,
    pub amount: Option<usize>,
    pub category: Option<usize>,
    pub source: Option<usize>,
    pub description: Option<usize>,
}

impl ColumnMapping {
    /// Default column layout: Date, Type, Amount, Category, Source,
    /// Description. Position 1 holds the sheet's own type column, which the
    /// mapper never reads; type always comes from the amount sign.
    pub fn positional() -> Self {
        ColumnMapping {
            date: Some(0),
            amount: Some(2),
            category: Some(3),
            source: Some(4),
            description: Some(5),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct MappingSummary {
    pub income: usize,
    pub expense: usize,
}

#[derive(Debug)]
pub struct MappedBatch {
    pub records: Vec<TransactionRecord>,
    pub summary: MappingSummary,
}

/// Map body rows to transaction records. Total: every input row produces
/// exactly one record, blank cells included. Amount cells that fail to parse
/// zero-fill rather than rejecting the row.
pub fn map_rows(rows: &[Vec<String>], mapping: &ColumnMapping) -> MappedBatch {
    let mut records = Vec::with_capacity(rows.len());
    let mut summary = MappingSummary::default();
    let mut zero_filled = 0usize;

    for row in rows {
        let amount_raw = match Decimal::from_str(cell(row, mapping.amount).trim()) {
            Ok(amount) => amount,
            Err(_) => {
                zero_filled += 1;
                Decimal::ZERO
            }
        };

        let type_ = TransactionType::from_amount(amount_raw);
        match type_ {
            TransactionType::Income => summary.income += 1,
            TransactionType::Expense => summary.expense += 1,
        }

        records.push(TransactionRecord {
            date: cell(row, mapping.date).to_string(),
            type_,
            amount: amount_raw.abs(),
            category: cell(row, mapping.category).to_string(),
            source: cell(row, mapping.source).to_string(),
            description: cell(row, mapping.description).to_string(),
        });
    }

    if zero_filled > 0 {
        warn!(rows = zero_filled, "Amount cells could not be parsed, zero-filled");
    }

    MappedBatch { records, summary }
}

/// Unmapped fields and indices past the end of a ragged row both read as
/// empty.
fn cell(row: &[String], index: Option<usize>) -> &str {
    index
        .and_then(|i| row.get(i))
        .map(String::as_str)
        .unwrap_or("")
}
