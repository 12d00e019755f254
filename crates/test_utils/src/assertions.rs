//! Custom Test Assertions
//!
//! Assertion helpers for billing domain types that report more context than
//! a bare `assert_eq!`.

use domain_billing::{BatchResult, BillingBatch};

/// Asserts that every billing in a batch carries its three link rows
///
/// # Panics
///
/// Panics if the link vectors are not index-aligned with the billings, or if
/// `expect_ids` is set and any link row still lacks a billing id
pub fn assert_batch_aligned(batch: &BillingBatch, expect_ids: bool) {
    let n = batch.billings.len();
    assert_eq!(batch.resident_links.len(), n, "resident links not aligned with billings");
    assert_eq!(batch.status_links.len(), n, "status links not aligned with billings");
    assert_eq!(batch.category_links.len(), n, "category links not aligned with billings");

    for i in 0..n {
        let ids = (
            batch.resident_links[i].billing_id,
            batch.status_links[i].billing_id,
            batch.category_links[i].billing_id,
        );
        assert!(
            ids.0 == ids.1 && ids.1 == ids.2,
            "link rows at index {} point at different billings: {:?}",
            i,
            ids
        );
        assert_eq!(
            ids.0.is_some(),
            expect_ids,
            "link rows at index {} have billing id {:?}",
            i,
            ids.0
        );
    }
}

/// Asserts the counters of a batch result
///
/// # Panics
///
/// Panics if any counter differs, printing the recorded errors
pub fn assert_batch_counts(result: &BatchResult, total_residents: usize, success: usize, failure: usize) {
    assert_eq!(
        (result.total_residents, result.success_count, result.failure_count),
        (total_residents, success, failure),
        "unexpected batch counters (residents, success, failure); errors: {:?}",
        result.errors
    );
}

/// Asserts that a batch result reports a failure mentioning `needle`
pub fn assert_batch_failed_with(result: &BatchResult, needle: &str) {
    assert!(result.failure_count > 0, "expected a failed batch, got {:?}", result);
    assert!(
        result.errors.iter().any(|e| e.contains(needle)),
        "no batch error mentions {:?}: {:?}",
        needle,
        result.errors
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_kernel::{ActorId, CategoryId, StatusId};
    use domain_billing::BillingRecordFactory;

    use crate::builders::ResidentBuilder;
    use crate::fixtures::{DefinitionFixtures, PeriodFixtures};

    #[test]
    fn test_factory_output_is_aligned() {
        let factory = BillingRecordFactory::new(StatusId::new(1), CategoryId::new(1));
        let batch = factory
            .build(
                &[DefinitionFixtures::monthly_ipl()],
                &ResidentBuilder::many(1, 3),
                PeriodFixtures::may_2025(),
                ActorId::new(1),
                Utc::now(),
            )
            .unwrap();

        assert_batch_aligned(&batch, false);
    }
}
