//! Tests for strongly-typed identifiers

use core_kernel::{BillingId, DocumentId, ResidentId, StatusId};
use proptest::prelude::*;

#[test]
fn test_ids_serialize_as_bare_numbers() {
    let json = serde_json::to_string(&BillingId::new(67)).unwrap();
    assert_eq!(json, "67");

    let back: BillingId = serde_json::from_str("1372").unwrap();
    assert_eq!(back, BillingId::new(1372));
}

#[test]
fn test_entity_names() {
    assert_eq!(BillingId::entity(), "Billing");
    assert_eq!(ResidentId::entity(), "Resident");
    assert_eq!(StatusId::entity(), "Status");
}

#[test]
fn test_document_id_serde_is_transparent() {
    let id = DocumentId::from_string("custom-abc");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"custom-abc\"");
    assert_eq!(id.prefix(), "custom");
}

proptest! {
    #[test]
    fn prop_display_parse_roundtrip(raw in 1i64..i64::MAX) {
        let id = BillingId::new(raw);
        let parsed: BillingId = id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, id);
    }
}
