use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    /// Negative sheet values represent incoming funds. Zero counts as an
    /// expense.
    pub fn from_amount(amount: Decimal) -> Self {
        if amount < Decimal::ZERO {
            TransactionType::Income
        } else {
            TransactionType::Expense
        }
    }
}

/// A normalized transaction produced by the row mapper. The amount is always
/// non-negative; the sign of the source cell is consumed to produce `type_`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    pub date: String,
    #[serde(rename = "type")]
    pub type_: TransactionType,
    pub amount: Decimal,
    pub category: String,
    pub source: String,
    pub description: String,
}
