use serde::{Deserialize, Serialize};

/// Per-document counters, present when statistics were requested.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextDocumentStatistics {
    /// Number of text elements in the document.
    pub character_count: u32,
    /// Number of billable transactions for the document.
    pub transaction_count: u32,
}

/// Aggregate counters for a batch of documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatistics {
    /// Number of documents submitted.
    pub document_count: u32,
    /// Number of documents the service accepted.
    pub valid_document_count: u32,
    /// Number of documents rejected as invalid.
    #[serde(rename = "erroneousDocumentCount", alias = "invalidDocumentCount")]
    pub invalid_document_count: u32,
    /// Number of billable transactions for the batch.
    pub transaction_count: u64,
}

impl BatchStatistics {
    /// Adds the counters of another batch to this one.
    ///
    /// Counters come from the service and saturate instead of overflowing.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            document_count: self.document_count.saturating_add(other.document_count),
            valid_document_count: self
                .valid_document_count
                .saturating_add(other.valid_document_count),
            invalid_document_count: self
                .invalid_document_count
                .saturating_add(other.invalid_document_count),
            transaction_count: self.transaction_count.saturating_add(other.transaction_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_statistics_wire_names() {
        let json = r#"{
            "documentCount": 3,
            "validDocumentCount": 2,
            "erroneousDocumentCount": 1,
            "transactionCount": 2
        }"#;

        let statistics: BatchStatistics = serde_json::from_str(json).expect("valid statistics");

        assert_eq!(
            statistics,
            BatchStatistics {
                document_count: 3,
                valid_document_count: 2,
                invalid_document_count: 1,
                transaction_count: 2,
            }
        );
    }

    #[test]
    fn test_batch_statistics_merge() {
        let first = BatchStatistics {
            document_count: 2,
            valid_document_count: 2,
            invalid_document_count: 0,
            transaction_count: 2,
        };
        let second = BatchStatistics {
            document_count: 1,
            valid_document_count: 0,
            invalid_document_count: 1,
            transaction_count: 0,
        };

        let total = first.merge(second);

        assert_eq!(total.document_count, 3);
        assert_eq!(total.valid_document_count, 2);
        assert_eq!(total.invalid_document_count, 1);
        assert_eq!(total.transaction_count, 2);
    }

    #[test]
    fn test_batch_statistics_merge_saturates() {
        let huge = BatchStatistics {
            document_count: u32::MAX,
            valid_document_count: u32::MAX,
            invalid_document_count: 1,
            transaction_count: u64::MAX,
        };

        let total = huge.merge(huge);

        assert_eq!(total.document_count, u32::MAX);
        assert_eq!(total.valid_document_count, u32::MAX);
        assert_eq!(total.invalid_document_count, 2);
        assert_eq!(total.transaction_count, u64::MAX);
    }
}
