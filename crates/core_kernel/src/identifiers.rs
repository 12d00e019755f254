//! Strongly-typed identifiers for billing entities
//!
//! Rows in the estate database are keyed by sequential integers. Wrapping
//! them in newtypes keeps a resident id from being passed where a billing id
//! is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($name:ident, $entity:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw database key
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw database key
            pub const fn value(&self) -> i64 {
                self.0
            }

            /// Entity name used in error messages
            pub fn entity() -> &'static str {
                $entity
            }
        }

        // Bare number: correlation text and SQL parameters rely on it.
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> i64 {
                id.0
            }
        }
    };
}

define_id!(BillingId, "Billing");
define_id!(ResidentId, "Resident");
define_id!(DefinitionId, "BillingDefinition");
define_id!(StatusId, "Status");
define_id!(CategoryId, "TransactionCategory");
define_id!(PricingConfigId, "PaymentPricingConfig");

// Accounts performing writes. Scheduled runs use a configured system actor.
define_id!(ActorId, "Actor");

/// Human-readable identifier attached to a billing at creation time
///
/// Formatted as `<kind>-<uuid>`, e.g. `monthly-1b4e28ba-2fa1-11d2-883f-0016d3cca427`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generates a fresh document id with the given kind prefix
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}-{}", prefix, Uuid::new_v4()))
    }

    /// Wraps an existing stored document id
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the kind prefix (text before the first `-`)
    pub fn prefix(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<DocumentId> for String {
    fn from(id: DocumentId) -> String {
        id.0
    }
}
