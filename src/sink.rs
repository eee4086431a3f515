use crate::error::Result;
use crate::models::TransactionRecord;
use async_trait::async_trait;
use tracing::info;

/// Persistence boundary for imported transactions. The service only depends
/// on this contract; real storage lives with whatever is wired in at
/// startup.
#[async_trait]
pub trait ImportSink: Send + Sync {
    /// Persist a batch of records, returning how many were accepted.
    async fn save(&self, records: &[TransactionRecord]) -> Result<usize>;
}

/// Stand-in sink that acknowledges every record.
pub struct LoggingSink;

#[async_trait]
impl ImportSink for LoggingSink {
    async fn save(&self, records: &[TransactionRecord]) -> Result<usize> {
        info!(count = records.len(), "Accepted imported transactions");
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionType;
    use crate::models::transaction::test_helpers::mock_record;
    use rust_decimal::prelude::dec;

    #[tokio::test]
    async fn test_logging_sink_accepts_full_batch() {
        let records = vec![
            mock_record(dec!(50.00), TransactionType::Income),
            mock_record(dec!(19.99), TransactionType::Expense),
        ];

        let count = LoggingSink.save(&records).await.unwrap();

        assert_eq!(count, 2);
    }
}
