//! Billing record factory
//!
//! Builds the in-memory rows for one generation run: a billing plus its
//! resident, status, and category links for every (resident, definition)
//! pair. All four rows are pushed together so a batch can never hold a
//! billing without its links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ActorId, BillingId, BillingPeriod, CategoryId, DocumentId, ResidentId, StatusId};

use crate::billing::{BillingDefinition, NewBilling, Resident};
use crate::error::BillingError;

/// A link row whose billing id is filled in after the billing is inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRow<T> {
    pub billing_id: Option<BillingId>,
    pub target: T,
}

impl<T> LinkRow<T> {
    fn pending(target: T) -> Self {
        Self {
            billing_id: None,
            target,
        }
    }
}

/// Parallel billing and link rows produced by one generation run
///
/// Index `i` of every vector belongs to the same billing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingBatch {
    pub billings: Vec<NewBilling>,
    pub resident_links: Vec<LinkRow<ResidentId>>,
    pub status_links: Vec<LinkRow<StatusId>>,
    pub category_links: Vec<LinkRow<CategoryId>>,
}

impl BillingBatch {
    pub fn len(&self) -> usize {
        self.billings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.billings.is_empty()
    }

    fn push(&mut self, billing: NewBilling, resident: ResidentId, status: StatusId, category: CategoryId) {
        self.billings.push(billing);
        self.resident_links.push(LinkRow::pending(resident));
        self.status_links.push(LinkRow::pending(status));
        self.category_links.push(LinkRow::pending(category));
    }

    /// Backfills the link rows with the ids generated for the billings
    ///
    /// `ids[i]` must be the id assigned to `billings[i]`.
    pub fn attach_ids(&mut self, ids: &[BillingId]) -> Result<(), BillingError> {
        if ids.len() != self.billings.len() {
            return Err(BillingError::Persistence(format!(
                "expected {} generated billing ids, got {}",
                self.billings.len(),
                ids.len()
            )));
        }

        for (i, id) in ids.iter().enumerate() {
            self.resident_links[i].billing_id = Some(*id);
            self.status_links[i].billing_id = Some(*id);
            self.category_links[i].billing_id = Some(*id);
        }
        Ok(())
    }
}

/// Builds billing batches against fixed default status and category rows
#[derive(Debug, Clone, Copy)]
pub struct BillingRecordFactory {
    status: StatusId,
    category: CategoryId,
}

impl BillingRecordFactory {
    pub fn new(status: StatusId, category: CategoryId) -> Self {
        Self { status, category }
    }

    /// Builds one billing per resident per published definition
    ///
    /// Unpublished definitions are skipped. An empty cohort yields an empty
    /// batch.
    ///
    /// # Arguments
    ///
    /// * `definitions` - Templates to bill
    /// * `residents` - Cohort being billed
    /// * `period` - Billed month
    /// * `actor` - Recorded as creator and updater
    /// * `now` - Creation and publication timestamp
    pub fn build(
        &self,
        definitions: &[BillingDefinition],
        residents: &[Resident],
        period: BillingPeriod,
        actor: ActorId,
        now: DateTime<Utc>,
    ) -> Result<BillingBatch, BillingError> {
        let published: Vec<_> = definitions
            .iter()
            .filter(|d| d.is_published())
            .map(|d| d.billed_amount().map(|amount| (d, amount)))
            .collect::<Result<_, _>>()?;

        let mut batch = BillingBatch::default();
        for resident in residents {
            for (definition, amount) in &published {
                let billing = NewBilling {
                    document_id: DocumentId::generate(definition.kind.document_prefix()),
                    name: definition.name.clone(),
                    note: definition.note.clone(),
                    period,
                    amount: *amount,
                    created_at: now,
                    published_at: Some(now),
                    created_by: actor,
                    updated_by: actor,
                };
                batch.push(billing, resident.id, self.status, self.category);
            }
        }
        Ok(batch)
    }
}
