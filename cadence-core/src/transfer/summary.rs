//! Aggregate accounting for a finished or aborted transfer.

use serde::{Deserialize, Serialize};

/// Per-collection tally of transferred and failed items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionOutcome {
    pub name: String,
    pub success_count: u64,
    pub fail_count: u64,
}

/// Running totals across an entire transfer.
///
/// Updated incrementally as collections complete, so an aborted transfer
/// still reports everything written before the abort. The invariant
/// `successful + failed == total_items` holds over items that reached a
/// terminal per-item outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferSummary {
    pub total_collections: u64,
    pub total_items: u64,
    pub successful: u64,
    pub failed: u64,
    pub collections: Vec<CollectionOutcome>,
}

impl TransferSummary {
    /// Folds one finished collection into the totals.
    pub fn record(&mut self, outcome: CollectionOutcome) {
        self.total_items += outcome.success_count + outcome.fail_count;
        self.successful += outcome.success_count;
        self.failed += outcome.fail_count;
        self.collections.push(outcome);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_keeps_totals_consistent() {
        let mut summary = TransferSummary {
            total_collections: 2,
            ..TransferSummary::default()
        };

        summary.record(CollectionOutcome {
            name: "Road Trip".to_string(),
            success_count: 8,
            fail_count: 2,
        });
        summary.record(CollectionOutcome {
            name: "Focus".to_string(),
            success_count: 5,
            fail_count: 0,
        });

        assert_eq!(summary.total_items, 15);
        assert_eq!(summary.successful, 13);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.successful + summary.failed, summary.total_items);
        assert_eq!(summary.collections.len(), 2);
    }
}
