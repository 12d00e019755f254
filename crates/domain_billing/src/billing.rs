//! Billing records and the templates they are generated from

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{
    ActorId, BillingId, BillingPeriod, DefinitionId, DocumentId, Money, MoneyError, ResidentId,
};

/// Cadence of a billing definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionKind {
    /// Charged to every resident each month (IPL dues)
    Monthly,
    /// Ad hoc charge raised by an administrator
    Custom,
}

impl DefinitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Monthly => "monthly",
            DefinitionKind::Custom => "custom",
        }
    }

    /// Prefix for document ids of billings generated from this kind
    pub fn document_prefix(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DefinitionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(DefinitionKind::Monthly),
            "custom" => Ok(DefinitionKind::Custom),
            other => Err(format!("unknown billing definition kind: {other}")),
        }
    }
}

/// Template describing a fee amount and cadence
///
/// Definitions are read-only from the billing subsystem's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingDefinition {
    /// Row identifier
    pub id: DefinitionId,
    /// Name copied onto each billing
    pub name: String,
    /// Monthly or custom
    pub kind: DefinitionKind,
    /// Amount per resident, as configured
    pub unit_amount: Decimal,
    /// Free-text note copied onto each billing
    pub note: Option<String>,
    /// Whether the definition takes part in monthly runs
    pub is_active: bool,
    /// Publication timestamp; unpublished definitions are drafts
    pub published_at: Option<DateTime<Utc>>,
}

impl BillingDefinition {
    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    /// Amount charged per billing, in whole currency units
    pub fn billed_amount(&self) -> Result<Money, MoneyError> {
        Money::from_decimal(self.unit_amount)
    }
}

/// A resident eligible for billing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
}

/// A billing built by the factory but not yet persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBilling {
    pub document_id: DocumentId,
    pub name: String,
    pub note: Option<String>,
    pub period: BillingPeriod,
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: ActorId,
    pub updated_by: ActorId,
}

/// A persisted billing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Billing {
    /// Database-generated identifier
    pub id: BillingId,
    /// Document id, absent on rows imported from older systems
    pub document_id: Option<DocumentId>,
    /// Name copied from the definition
    pub name: String,
    /// Note copied from the definition
    pub note: Option<String>,
    /// Billed month
    pub period: BillingPeriod,
    /// Amount due, excluding service fees
    pub amount: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
    pub created_by: Option<ActorId>,
    pub updated_by: Option<ActorId>,
}

impl Billing {
    /// Text shown for this billing on a hosted invoice
    pub fn line_item_description(&self) -> String {
        format!("{} {}", self.name, self.period)
    }
}
