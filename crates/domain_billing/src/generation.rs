//! Batch generation
//!
//! Orchestrates one generation run: pick the definitions, pick the cohort,
//! build the batch, persist it atomically, and summarize the outcome.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::{ActorId, BillingPeriod, DefinitionId, ResidentId};

use crate::billing::{BillingDefinition, DefinitionKind, Resident};
use crate::defaults::BillingDefaults;
use crate::error::BillingError;
use crate::factory::BillingRecordFactory;
use crate::ports::{BillingStore, DefinitionRepository, ResidentDirectory};

/// Role held by billable residents
pub const DEFAULT_RESIDENT_ROLE: &str = "penghuni";

/// Which definitions a run bills
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "definition_id", rename_all = "snake_case")]
pub enum BatchKind {
    /// Every active monthly definition
    Monthly,
    /// One custom definition
    Custom(DefinitionId),
}

/// Input of one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateBatchRequest {
    pub kind: BatchKind,
    /// Explicit cohort; `None` bills every eligible resident not yet billed
    pub resident_ids: Option<Vec<ResidentId>>,
    pub period: BillingPeriod,
}

/// Summary of one generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub total_residents: usize,
    pub total_billings: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub errors: Vec<String>,
}

impl BatchResult {
    fn committed(residents: usize, billings: usize) -> Self {
        Self {
            total_residents: residents,
            total_billings: billings,
            success_count: billings,
            ..Self::default()
        }
    }

    fn failed(residents: usize, billings: usize, error: String) -> Self {
        Self {
            total_residents: residents,
            total_billings: billings,
            failure_count: billings,
            errors: vec![error],
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure_count == 0 && self.errors.is_empty()
    }
}

/// Generates and persists billing batches
pub struct BatchGenerator {
    residents: Arc<dyn ResidentDirectory>,
    definitions: Arc<dyn DefinitionRepository>,
    store: Arc<dyn BillingStore>,
    factory: BillingRecordFactory,
    resident_role: String,
}

impl BatchGenerator {
    pub fn new(
        residents: Arc<dyn ResidentDirectory>,
        definitions: Arc<dyn DefinitionRepository>,
        store: Arc<dyn BillingStore>,
        defaults: &BillingDefaults,
    ) -> Self {
        Self {
            residents,
            definitions,
            store,
            factory: BillingRecordFactory::new(defaults.unpaid_status, defaults.default_category),
            resident_role: DEFAULT_RESIDENT_ROLE.to_string(),
        }
    }

    pub fn with_resident_role(mut self, role: impl Into<String>) -> Self {
        self.resident_role = role.into();
        self
    }

    /// Runs one generation
    ///
    /// Persistence failures do not surface as `Err`: they are reported in the
    /// returned summary with every billing of the batch counted as failed.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no active monthly definition, or unknown custom definition
    /// * `Validation` - explicit empty cohort, or a monthly definition requested as custom
    #[instrument(skip(self, request), fields(kind = ?request.kind, period = %request.period, actor = %actor))]
    pub async fn generate_batch(
        &self,
        request: GenerateBatchRequest,
        actor: ActorId,
    ) -> Result<BatchResult, BillingError> {
        let definitions = self.load_definitions(request.kind).await?;
        let residents = self.load_cohort(request.resident_ids.as_deref(), request.period).await?;

        if residents.is_empty() {
            info!("No eligible residents, nothing to bill");
            return Ok(BatchResult::default());
        }

        let batch = self
            .factory
            .build(&definitions, &residents, request.period, actor, Utc::now())?;
        let resident_count = residents.len();
        let billing_count = batch.len();

        if batch.is_empty() {
            info!(residents = resident_count, "No published definitions, nothing to bill");
            return Ok(BatchResult {
                total_residents: resident_count,
                ..BatchResult::default()
            });
        }

        debug!(residents = resident_count, billings = billing_count, "Persisting billing batch");
        match self.store.persist_batch(batch).await {
            Ok(ids) => {
                info!(residents = resident_count, billings = ids.len(), "Billing batch committed");
                Ok(BatchResult::committed(resident_count, billing_count))
            }
            Err(e) => {
                warn!(error = %e, billings = billing_count, "Billing batch rolled back");
                Ok(BatchResult::failed(resident_count, billing_count, e.to_string()))
            }
        }
    }

    async fn load_definitions(&self, kind: BatchKind) -> Result<Vec<BillingDefinition>, BillingError> {
        match kind {
            BatchKind::Monthly => {
                let definitions = self.definitions.active_monthly_definitions().await?;
                if definitions.is_empty() {
                    return Err(BillingError::not_found(
                        DefinitionId::entity(),
                        "active monthly definition",
                    ));
                }
                Ok(definitions)
            }
            BatchKind::Custom(id) => {
                let definition = self.definitions.definition_by_id(id).await?;
                if definition.kind == DefinitionKind::Monthly {
                    return Err(BillingError::validation(format!(
                        "definition {id} is a monthly definition, not a custom one"
                    )));
                }
                Ok(vec![definition])
            }
        }
    }

    async fn load_cohort(
        &self,
        explicit: Option<&[ResidentId]>,
        period: BillingPeriod,
    ) -> Result<Vec<Resident>, BillingError> {
        match explicit {
            Some([]) => Err(BillingError::validation("explicit resident cohort is empty")),
            Some(ids) => {
                let residents = self.residents.residents_by_ids(ids).await?;
                if residents.len() < ids.len() {
                    debug!(
                        requested = ids.len(),
                        found = residents.len(),
                        "Skipping residents without a profile"
                    );
                }
                Ok(residents)
            }
            None => Ok(self
                .residents
                .residents_with_role_unbilled(&self.resident_role, period)
                .await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mock::{MockBillingStore, MockDefinitionRepository, MockResidentDirectory};
    use core_kernel::{CategoryId, StatusId};
    use rust_decimal_macros::dec;

    fn defaults() -> BillingDefaults {
        BillingDefaults {
            unpaid_status: StatusId::new(2),
            paid_status: StatusId::new(6),
            default_category: CategoryId::new(1),
        }
    }

    fn resident(id: i64) -> Resident {
        Resident {
            id: ResidentId::new(id),
            username: format!("warga{id}"),
            email: None,
            full_name: None,
            phone: None,
        }
    }

    fn definition(id: i64, kind: DefinitionKind, published: bool) -> BillingDefinition {
        BillingDefinition {
            id: DefinitionId::new(id),
            name: format!("Iuran {id}"),
            kind,
            unit_amount: dec!(150000),
            note: None,
            is_active: true,
            published_at: published.then(Utc::now),
        }
    }

    fn period() -> BillingPeriod {
        BillingPeriod::new(5, 2025).unwrap()
    }

    async fn generator(
        residents: Vec<Resident>,
        definitions: Vec<BillingDefinition>,
    ) -> (BatchGenerator, Arc<MockBillingStore>) {
        let store = Arc::new(MockBillingStore::new());
        let generator = BatchGenerator::new(
            Arc::new(MockResidentDirectory::with_residents(DEFAULT_RESIDENT_ROLE, residents).await),
            Arc::new(MockDefinitionRepository::with_definitions(definitions).await),
            store.clone(),
            &defaults(),
        );
        (generator, store)
    }

    fn monthly(resident_ids: Option<Vec<ResidentId>>) -> GenerateBatchRequest {
        GenerateBatchRequest {
            kind: BatchKind::Monthly,
            resident_ids,
            period: period(),
        }
    }

    #[tokio::test]
    async fn test_fan_out_is_residents_times_definitions() {
        let (generator, store) = generator(
            vec![resident(1), resident(2), resident(3)],
            vec![
                definition(10, DefinitionKind::Monthly, true),
                definition(11, DefinitionKind::Monthly, true),
            ],
        )
        .await;

        let result = generator.generate_batch(monthly(None), ActorId::new(1)).await.unwrap();

        assert_eq!(result, BatchResult::committed(3, 6));
        assert_eq!(store.billing_count().await, 6);
        assert_eq!(store.link_counts().await, (6, 6, 6));
    }

    #[tokio::test]
    async fn test_empty_cohort_returns_zero_summary_without_writes() {
        let (generator, store) =
            generator(vec![], vec![definition(10, DefinitionKind::Monthly, true)]).await;

        let result = generator.generate_batch(monthly(None), ActorId::new(1)).await.unwrap();

        assert_eq!(result, BatchResult::default());
        assert_eq!(store.persist_calls().await, 0);
    }

    #[tokio::test]
    async fn test_forced_link_failure_leaves_no_rows() {
        let (generator, store) = generator(
            vec![resident(1), resident(2)],
            vec![definition(10, DefinitionKind::Monthly, true)],
        )
        .await;
        store.fail_link_inserts(true).await;

        let result = generator.generate_batch(monthly(None), ActorId::new(1)).await.unwrap();

        assert_eq!(result.success_count, 0);
        assert_eq!(result.failure_count, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(store.billing_count().await, 0);
        assert_eq!(store.link_counts().await, (0, 0, 0));
    }

    #[tokio::test]
    async fn test_explicit_cohort_skips_unknown_residents() {
        let (generator, store) = generator(
            vec![resident(1), resident(2)],
            vec![definition(10, DefinitionKind::Monthly, true)],
        )
        .await;

        let request = monthly(Some(vec![ResidentId::new(2), ResidentId::new(99)]));
        let result = generator.generate_batch(request, ActorId::new(1)).await.unwrap();

        assert_eq!(result.total_residents, 1);
        assert_eq!(store.billing_count().await, 1);
    }

    #[tokio::test]
    async fn test_explicit_empty_cohort_is_rejected() {
        let (generator, _) =
            generator(vec![resident(1)], vec![definition(10, DefinitionKind::Monthly, true)]).await;

        let err = generator
            .generate_batch(monthly(Some(vec![])), ActorId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_monthly_without_definitions_is_not_found() {
        let (generator, _) = generator(vec![resident(1)], vec![]).await;

        let err = generator.generate_batch(monthly(None), ActorId::new(1)).await.unwrap_err();
        assert!(matches!(err, BillingError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_unpublished_custom_definition_bills_nothing() {
        let (generator, store) =
            generator(vec![resident(1), resident(2)], vec![definition(20, DefinitionKind::Custom, false)]).await;

        let request = GenerateBatchRequest {
            kind: BatchKind::Custom(DefinitionId::new(20)),
            resident_ids: None,
            period: period(),
        };
        let result = generator.generate_batch(request, ActorId::new(1)).await.unwrap();

        assert_eq!(result.total_residents, 2);
        assert_eq!(result.total_billings, 0);
        assert_eq!(store.persist_calls().await, 0);
    }

    #[tokio::test]
    async fn test_custom_request_for_monthly_definition_is_rejected() {
        let (generator, _) =
            generator(vec![resident(1)], vec![definition(10, DefinitionKind::Monthly, true)]).await;

        let request = GenerateBatchRequest {
            kind: BatchKind::Custom(DefinitionId::new(10)),
            resident_ids: None,
            period: period(),
        };
        let err = generator.generate_batch(request, ActorId::new(1)).await.unwrap_err();
        assert!(matches!(err, BillingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_already_billed_residents_are_skipped() {
        let directory = Arc::new(
            MockResidentDirectory::with_residents(DEFAULT_RESIDENT_ROLE, vec![resident(1), resident(2)]).await,
        );
        directory.mark_billed(ResidentId::new(1), period()).await;
        let store = Arc::new(MockBillingStore::new());
        let generator = BatchGenerator::new(
            directory,
            Arc::new(
                MockDefinitionRepository::with_definitions(vec![definition(10, DefinitionKind::Monthly, true)])
                    .await,
            ),
            store.clone(),
            &defaults(),
        );

        let result = generator.generate_batch(monthly(None), ActorId::new(1)).await.unwrap();
        assert_eq!(result.total_residents, 1);
        assert_eq!(store.billing_count().await, 1);
    }
}
