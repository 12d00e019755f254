//! Billing Domain Ports
//!
//! Collaborators the billing services depend on. PostgreSQL adapters live in
//! `infra_db`; the hosted invoice adapter lives in [`crate::adapters`].
//!
//! ```text
//! ┌──────────────────────┐      ┌────────────────────────┐
//! │   BatchGenerator     │─────▶│ ResidentDirectory      │
//! │                      │─────▶│ DefinitionRepository   │
//! │                      │─────▶│ BillingStore           │
//! ├──────────────────────┤      ├────────────────────────┤
//! │  PaymentLinkIssuer   │─────▶│ PricingConfigRepository│
//! │                      │─────▶│ PaymentGateway         │
//! ├──────────────────────┤      ├────────────────────────┤
//! │  PaymentReconciler   │─────▶│ BillingStore           │
//! ├──────────────────────┤      ├────────────────────────┤
//! │  BillingScheduler    │─────▶│ AuditLog               │
//! └──────────────────────┘      └────────────────────────┘
//! ```

use async_trait::async_trait;

use core_kernel::{
    BillingId, BillingPeriod, DefinitionId, DomainPort, HealthCheckable, PortError, ResidentId,
    StatusId,
};

use crate::audit::AuditLogEntry;
use crate::billing::{Billing, BillingDefinition, Resident};
use crate::factory::BillingBatch;
use crate::fee::PaymentPricingConfig;
use crate::invoice::{InvoiceRequest, IssuedInvoice};

/// Lookup of billable residents
#[async_trait]
pub trait ResidentDirectory: DomainPort {
    /// All residents holding the given role
    async fn residents_with_role(&self, role: &str) -> Result<Vec<Resident>, PortError>;

    /// Residents holding the role that have no billing for the period yet
    async fn residents_with_role_unbilled(
        &self,
        role: &str,
        period: BillingPeriod,
    ) -> Result<Vec<Resident>, PortError>;

    /// Residents among `ids` that exist and have a profile
    ///
    /// Unknown ids are skipped, not reported.
    async fn residents_by_ids(&self, ids: &[ResidentId]) -> Result<Vec<Resident>, PortError>;
}

/// Read access to billing definitions
#[async_trait]
pub trait DefinitionRepository: DomainPort {
    /// Active, published monthly definitions
    async fn active_monthly_definitions(&self) -> Result<Vec<BillingDefinition>, PortError>;

    /// A single definition
    ///
    /// # Errors
    ///
    /// `PortError::NotFound` if no definition has this id
    async fn definition_by_id(&self, id: DefinitionId) -> Result<BillingDefinition, PortError>;
}

/// Read access to the payment pricing configuration
#[async_trait]
pub trait PricingConfigRepository: DomainPort {
    /// The most recently published configuration, if any
    async fn active_pricing_config(&self) -> Result<Option<PaymentPricingConfig>, PortError>;
}

/// Lookup of billing status reference rows, used at startup
#[async_trait]
pub trait StatusDirectory: DomainPort {
    /// First published status with exactly this name
    async fn status_by_name(&self, name: &str) -> Result<Option<StatusId>, PortError>;

    /// First published status of any name
    async fn first_published_status(&self) -> Result<Option<StatusId>, PortError>;
}

/// Transactional storage of billings and their links
#[async_trait]
pub trait BillingStore: DomainPort + HealthCheckable {
    /// Persists a batch in a single transaction
    ///
    /// Billings are inserted first, the generated ids are backfilled into the
    /// link rows, then the three link sets are inserted. Any failure rolls the
    /// whole batch back.
    ///
    /// # Returns
    ///
    /// The generated billing ids, index-aligned with `batch.billings`
    async fn persist_batch(&self, batch: BillingBatch) -> Result<Vec<BillingId>, PortError>;

    /// Billings among `ids` that exist, in no particular order
    async fn billings_by_ids(&self, ids: &[BillingId]) -> Result<Vec<Billing>, PortError>;

    /// Points the status link of every billing in `ids` at `paid_status`
    ///
    /// One update per id inside a single transaction.
    ///
    /// # Returns
    ///
    /// Rows touched per id, index-aligned with `ids`
    async fn mark_paid(&self, ids: &[BillingId], paid_status: StatusId) -> Result<Vec<u64>, PortError>;
}

/// Append-only scheduler audit trail
#[async_trait]
pub trait AuditLog: DomainPort {
    async fn append(&self, entry: AuditLogEntry) -> Result<(), PortError>;
}

/// External hosted-invoice provider
#[async_trait]
pub trait PaymentGateway: DomainPort + HealthCheckable {
    /// Creates a hosted invoice and returns its checkout link
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<IssuedInvoice, PortError>;
}

/// In-memory implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap, HashSet};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{CategoryId, HealthCheckResult};

    use crate::billing::DefinitionKind;

    fn healthy(adapter_id: &str) -> HealthCheckResult {
        HealthCheckResult {
            message: Some("Mock adapter always healthy".to_string()),
            ..HealthCheckResult::healthy(adapter_id, 0)
        }
    }

    /// Residents keyed by id, with role membership and billed periods
    #[derive(Debug, Default)]
    pub struct MockResidentDirectory {
        residents: Arc<RwLock<BTreeMap<ResidentId, (Resident, Vec<String>)>>>,
        billed: Arc<RwLock<HashSet<(ResidentId, BillingPeriod)>>>,
    }

    impl MockResidentDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with residents holding `role`
        pub async fn with_residents(role: &str, residents: Vec<Resident>) -> Self {
            let directory = Self::new();
            for resident in residents {
                directory.add(resident, &[role]).await;
            }
            directory
        }

        pub async fn add(&self, resident: Resident, roles: &[&str]) {
            let roles = roles.iter().map(|r| r.to_string()).collect();
            self.residents.write().await.insert(resident.id, (resident, roles));
        }

        /// Marks a resident as already billed for a period
        pub async fn mark_billed(&self, id: ResidentId, period: BillingPeriod) {
            self.billed.write().await.insert((id, period));
        }
    }

    impl DomainPort for MockResidentDirectory {}

    #[async_trait]
    impl ResidentDirectory for MockResidentDirectory {
        async fn residents_with_role(&self, role: &str) -> Result<Vec<Resident>, PortError> {
            let residents = self.residents.read().await;
            Ok(residents
                .values()
                .filter(|(_, roles)| roles.iter().any(|r| r == role))
                .map(|(resident, _)| resident.clone())
                .collect())
        }

        async fn residents_with_role_unbilled(
            &self,
            role: &str,
            period: BillingPeriod,
        ) -> Result<Vec<Resident>, PortError> {
            let billed = self.billed.read().await;
            Ok(self
                .residents_with_role(role)
                .await?
                .into_iter()
                .filter(|r| !billed.contains(&(r.id, period)))
                .collect())
        }

        async fn residents_by_ids(&self, ids: &[ResidentId]) -> Result<Vec<Resident>, PortError> {
            let residents = self.residents.read().await;
            Ok(ids
                .iter()
                .filter_map(|id| residents.get(id).map(|(r, _)| r.clone()))
                .collect())
        }
    }

    /// Definitions keyed by id
    #[derive(Debug, Default)]
    pub struct MockDefinitionRepository {
        definitions: Arc<RwLock<BTreeMap<DefinitionId, BillingDefinition>>>,
    }

    impl MockDefinitionRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn with_definitions(definitions: Vec<BillingDefinition>) -> Self {
            let repo = Self::new();
            {
                let mut map = repo.definitions.write().await;
                for definition in definitions {
                    map.insert(definition.id, definition);
                }
            }
            repo
        }
    }

    impl DomainPort for MockDefinitionRepository {}

    #[async_trait]
    impl DefinitionRepository for MockDefinitionRepository {
        async fn active_monthly_definitions(&self) -> Result<Vec<BillingDefinition>, PortError> {
            Ok(self
                .definitions
                .read()
                .await
                .values()
                .filter(|d| d.kind == DefinitionKind::Monthly && d.is_active && d.is_published())
                .cloned()
                .collect())
        }

        async fn definition_by_id(&self, id: DefinitionId) -> Result<BillingDefinition, PortError> {
            self.definitions
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found(DefinitionId::entity(), id))
        }
    }

    /// Holds at most one pricing configuration
    #[derive(Debug, Default)]
    pub struct MockPricingConfigRepository {
        config: Arc<RwLock<Option<PaymentPricingConfig>>>,
    }

    impl MockPricingConfigRepository {
        pub fn new(config: Option<PaymentPricingConfig>) -> Self {
            Self {
                config: Arc::new(RwLock::new(config)),
            }
        }
    }

    impl DomainPort for MockPricingConfigRepository {}

    #[async_trait]
    impl PricingConfigRepository for MockPricingConfigRepository {
        async fn active_pricing_config(&self) -> Result<Option<PaymentPricingConfig>, PortError> {
            Ok(self.config.read().await.clone())
        }
    }

    /// Status rows in publication order
    #[derive(Debug, Default)]
    pub struct MockStatusDirectory {
        statuses: Vec<(StatusId, String)>,
    }

    impl MockStatusDirectory {
        pub fn new(statuses: Vec<(StatusId, &str)>) -> Self {
            Self {
                statuses: statuses.into_iter().map(|(id, name)| (id, name.to_string())).collect(),
            }
        }
    }

    impl DomainPort for MockStatusDirectory {}

    #[async_trait]
    impl StatusDirectory for MockStatusDirectory {
        async fn status_by_name(&self, name: &str) -> Result<Option<StatusId>, PortError> {
            Ok(self.statuses.iter().find(|(_, n)| n == name).map(|(id, _)| *id))
        }

        async fn first_published_status(&self) -> Result<Option<StatusId>, PortError> {
            Ok(self.statuses.first().map(|(id, _)| *id))
        }
    }

    #[derive(Debug, Default)]
    struct StoreState {
        next_id: i64,
        billings: BTreeMap<BillingId, Billing>,
        resident_links: Vec<(BillingId, ResidentId)>,
        status_links: HashMap<BillingId, StatusId>,
        category_links: Vec<(BillingId, CategoryId)>,
        fail_link_insert: bool,
        fail_status_update: bool,
        persist_calls: usize,
    }

    /// Billing storage with all-or-nothing batch semantics
    ///
    /// Failures can be injected after the billing insert (before any link is
    /// written) and during status updates.
    #[derive(Debug)]
    pub struct MockBillingStore {
        state: Arc<RwLock<StoreState>>,
    }

    impl Default for MockBillingStore {
        fn default() -> Self {
            Self {
                state: Arc::new(RwLock::new(StoreState {
                    next_id: 1,
                    ..StoreState::default()
                })),
            }
        }
    }

    impl MockBillingStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seeds an already persisted billing with its status
        pub async fn insert_billing(&self, billing: Billing, status: StatusId) {
            let mut state = self.state.write().await;
            state.next_id = state.next_id.max(billing.id.value() + 1);
            state.status_links.insert(billing.id, status);
            state.billings.insert(billing.id, billing);
        }

        /// Makes the next batch fail after its billings are inserted
        pub async fn fail_link_inserts(&self, fail: bool) {
            self.state.write().await.fail_link_insert = fail;
        }

        /// Makes status updates fail
        pub async fn fail_status_updates(&self, fail: bool) {
            self.state.write().await.fail_status_update = fail;
        }

        pub async fn billing_count(&self) -> usize {
            self.state.read().await.billings.len()
        }

        /// Row counts of the resident, status, and category link sets
        pub async fn link_counts(&self) -> (usize, usize, usize) {
            let state = self.state.read().await;
            (
                state.resident_links.len(),
                state.status_links.len(),
                state.category_links.len(),
            )
        }

        pub async fn status_of(&self, id: BillingId) -> Option<StatusId> {
            self.state.read().await.status_links.get(&id).copied()
        }

        pub async fn persist_calls(&self) -> usize {
            self.state.read().await.persist_calls
        }
    }

    impl DomainPort for MockBillingStore {}

    #[async_trait]
    impl HealthCheckable for MockBillingStore {
        async fn health_check(&self) -> HealthCheckResult {
            healthy("mock-billing-store")
        }
    }

    #[async_trait]
    impl BillingStore for MockBillingStore {
        async fn persist_batch(&self, mut batch: BillingBatch) -> Result<Vec<BillingId>, PortError> {
            let mut state = self.state.write().await;
            state.persist_calls += 1;

            // Stage everything, commit only if every step succeeds.
            let first = state.next_id;
            let ids: Vec<BillingId> = (0..batch.len() as i64).map(|i| BillingId::new(first + i)).collect();
            let staged: Vec<Billing> = batch
                .billings
                .iter()
                .zip(&ids)
                .map(|(new, id)| Billing {
                    id: *id,
                    document_id: Some(new.document_id.clone()),
                    name: new.name.clone(),
                    note: new.note.clone(),
                    period: new.period,
                    amount: new.amount,
                    created_at: new.created_at,
                    updated_at: new.created_at,
                    published_at: new.published_at,
                    created_by: Some(new.created_by),
                    updated_by: Some(new.updated_by),
                })
                .collect();

            batch
                .attach_ids(&ids)
                .map_err(|e| PortError::internal(e.to_string()))?;

            if state.fail_link_insert {
                return Err(PortError::internal("injected failure inserting billing links"));
            }

            let link_id = |billing_id: Option<BillingId>| {
                billing_id.ok_or_else(|| PortError::internal("link row without billing id"))
            };
            let mut resident_links = Vec::with_capacity(ids.len());
            let mut status_links = Vec::with_capacity(ids.len());
            let mut category_links = Vec::with_capacity(ids.len());
            for i in 0..ids.len() {
                resident_links.push((link_id(batch.resident_links[i].billing_id)?, batch.resident_links[i].target));
                status_links.push((link_id(batch.status_links[i].billing_id)?, batch.status_links[i].target));
                category_links.push((link_id(batch.category_links[i].billing_id)?, batch.category_links[i].target));
            }

            state.next_id = first + ids.len() as i64;
            for billing in staged {
                state.billings.insert(billing.id, billing);
            }
            state.resident_links.extend(resident_links);
            state.status_links.extend(status_links);
            state.category_links.extend(category_links);
            Ok(ids)
        }

        async fn billings_by_ids(&self, ids: &[BillingId]) -> Result<Vec<Billing>, PortError> {
            let state = self.state.read().await;
            Ok(ids.iter().filter_map(|id| state.billings.get(id).cloned()).collect())
        }

        async fn mark_paid(&self, ids: &[BillingId], paid_status: StatusId) -> Result<Vec<u64>, PortError> {
            let mut state = self.state.write().await;
            if state.fail_status_update {
                return Err(PortError::connection("injected failure updating status links"));
            }

            let touched = ids
                .iter()
                .map(|id| match state.status_links.get_mut(id) {
                    Some(status) => {
                        *status = paid_status;
                        1
                    }
                    None => 0,
                })
                .collect();
            Ok(touched)
        }
    }

    /// Collects audit entries in memory
    #[derive(Debug, Default)]
    pub struct MockAuditLog {
        entries: Arc<RwLock<Vec<AuditLogEntry>>>,
        fail: bool,
    }

    impl MockAuditLog {
        pub fn new() -> Self {
            Self::default()
        }

        /// An audit log whose every append fails
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub async fn entries(&self) -> Vec<AuditLogEntry> {
            self.entries.read().await.clone()
        }
    }

    impl DomainPort for MockAuditLog {}

    #[async_trait]
    impl AuditLog for MockAuditLog {
        async fn append(&self, entry: AuditLogEntry) -> Result<(), PortError> {
            if self.fail {
                return Err(PortError::connection("audit log unavailable"));
            }
            self.entries.write().await.push(entry);
            Ok(())
        }
    }

    /// Records invoice requests and answers with a canned result
    #[derive(Debug)]
    pub struct MockPaymentGateway {
        requests: Arc<RwLock<Vec<InvoiceRequest>>>,
        failure: Option<(Option<u16>, String)>,
    }

    impl MockPaymentGateway {
        pub fn new() -> Self {
            Self {
                requests: Arc::new(RwLock::new(Vec::new())),
                failure: None,
            }
        }

        /// A gateway answering every request with an upstream error
        pub fn failing(status: Option<u16>, message: &str) -> Self {
            Self {
                failure: Some((status, message.to_string())),
                ..Self::new()
            }
        }

        pub async fn requests(&self) -> Vec<InvoiceRequest> {
            self.requests.read().await.clone()
        }
    }

    impl Default for MockPaymentGateway {
        fn default() -> Self {
            Self::new()
        }
    }

    impl DomainPort for MockPaymentGateway {}

    #[async_trait]
    impl HealthCheckable for MockPaymentGateway {
        async fn health_check(&self) -> HealthCheckResult {
            healthy("mock-payment-gateway")
        }
    }

    #[async_trait]
    impl PaymentGateway for MockPaymentGateway {
        async fn create_invoice(&self, request: InvoiceRequest) -> Result<IssuedInvoice, PortError> {
            let mut requests = self.requests.write().await;
            requests.push(request.clone());
            if let Some((status, message)) = &self.failure {
                return Err(PortError::upstream(*status, message.clone()));
            }

            let sequence = requests.len();
            Ok(IssuedInvoice {
                id: format!("inv-{sequence}"),
                transaction_id: Some(format!("trx-{sequence}")),
                link: format!("https://pay.example.test/invoices/inv-{sequence}"),
                expires_at: Some(request.expires_at),
            })
        }
    }
}
