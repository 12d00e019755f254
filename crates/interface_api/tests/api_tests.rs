//! HTTP API tests against in-memory ports

use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

use core_kernel::HealthCheckable;
use domain_billing::ports::mock::{
    MockBillingStore, MockDefinitionRepository, MockPaymentGateway, MockPricingConfigRepository,
    MockResidentDirectory,
};
use domain_billing::{
    BatchGenerator, DescriptionCodec, IssuerSettings, PaymentLinkIssuer, PaymentReconciler,
    DEFAULT_RESIDENT_ROLE,
};
use interface_api::auth::{create_token, permissions};
use interface_api::config::ApiConfig;
use interface_api::{create_router, AppState, BillingServices};
use test_utils::{
    BillingBuilder, DefaultsFixtures, DefinitionFixtures, PricingFixtures, ResidentFixtures,
};

const SECRET: &str = "api-test-secret";

struct Harness {
    server: TestServer,
    store: Arc<MockBillingStore>,
}

async fn harness_with_gateway(gateway: MockPaymentGateway) -> Harness {
    let defaults = DefaultsFixtures::defaults();
    let store = Arc::new(MockBillingStore::new());
    let gateway = Arc::new(gateway);
    let codec = Arc::new(DescriptionCodec);

    let residents = Arc::new(
        MockResidentDirectory::with_residents(
            DEFAULT_RESIDENT_ROLE,
            vec![ResidentFixtures::budi(), ResidentFixtures::sari()],
        )
        .await,
    );
    let definitions = Arc::new(
        MockDefinitionRepository::with_definitions(vec![
            DefinitionFixtures::monthly_ipl(),
            DefinitionFixtures::custom_road_repair(),
        ])
        .await,
    );

    let services = BillingServices {
        generator: Arc::new(BatchGenerator::new(residents, definitions, store.clone(), &defaults)),
        issuer: PaymentLinkIssuer::new(
            store.clone(),
            Arc::new(MockPricingConfigRepository::new(Some(PricingFixtures::tiered()))),
            gateway.clone(),
            codec.clone(),
            IssuerSettings::default(),
        ),
        reconciler: PaymentReconciler::new(store.clone(), codec, defaults.paid_status),
        health_checks: vec![
            store.clone() as Arc<dyn HealthCheckable>,
            gateway as Arc<dyn HealthCheckable>,
        ],
    };

    let config = ApiConfig {
        jwt_secret: SECRET.to_string(),
        ..ApiConfig::default()
    };

    let server = TestServer::new(create_router(AppState::new(services, config))).unwrap();
    Harness { server, store }
}

async fn harness() -> Harness {
    harness_with_gateway(MockPaymentGateway::new()).await
}

fn bearer(roles: &[&str]) -> HeaderValue {
    let roles = roles.iter().map(|r| r.to_string()).collect();
    let token = create_token("7", roles, SECRET, 300).unwrap();
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

fn writer() -> HeaderValue {
    bearer(&[permissions::BILLING_WRITE])
}

#[tokio::test]
async fn test_health_endpoints_are_public() {
    let Harness { server, .. } = harness().await;

    server.get("/health").await.assert_status_ok();
    server.get("/health/live").await.assert_status_ok();

    let ready = server.get("/health/ready").await;
    ready.assert_status_ok();
    let body: Value = ready.json();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["adapters"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_billing_routes_require_a_token() {
    let Harness { server, .. } = harness().await;

    let response = server
        .post("/api/v1/billings/bulk-monthly")
        .json(&json!({ "month": 5, "year": 2025 }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_bulk_monthly_needs_write_permission() {
    let Harness { server, .. } = harness().await;

    server
        .post("/api/v1/billings/bulk-monthly")
        .add_header(AUTHORIZATION, bearer(&["billing:read"]))
        .json(&json!({ "month": 5, "year": 2025 }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_monthly_rejects_out_of_range_month() {
    let Harness { server, store } = harness().await;

    let response = server
        .post("/api/v1/billings/bulk-monthly")
        .add_header(AUTHORIZATION, writer())
        .json(&json!({ "month": 13, "year": 2025 }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"][0].as_str().unwrap().starts_with("month"));
    assert_eq!(store.billing_count().await, 0);
}

#[tokio::test]
async fn test_bulk_monthly_bills_every_unbilled_resident() {
    let Harness { server, store } = harness().await;

    let response = server
        .post("/api/v1/billings/bulk-monthly")
        .add_header(AUTHORIZATION, writer())
        .json(&json!({ "month": 5, "year": 2025 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["month"], 5);
    assert_eq!(body["year"], 2025);
    assert_eq!(body["total_residents"], 2);
    assert_eq!(body["success_count"], 2);
    assert_eq!(body["failure_count"], 0);
    assert_eq!(store.billing_count().await, 2);
}

#[tokio::test]
async fn test_bulk_monthly_with_empty_user_ids_bills_everyone() {
    let Harness { server, store } = harness().await;

    let response = server
        .post("/api/v1/billings/bulk-monthly")
        .add_header(AUTHORIZATION, writer())
        .json(&json!({ "user_ids": [], "month": 5, "year": 2025 }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["total_residents"], 2);
    assert_eq!(body["success_count"], 2);
    assert_eq!(store.billing_count().await, 2);
}

#[tokio::test]
async fn test_bulk_custom_with_unknown_definition_is_not_found() {
    let Harness { server, .. } = harness().await;

    server
        .post("/api/v1/billings/bulk-custom")
        .add_header(AUTHORIZATION, writer())
        .json(&json!({ "billing_settings_id": 404, "month": 5, "year": 2025 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_link_then_webhook_marks_billing_paid() {
    let Harness { server, store } = harness().await;
    store
        .insert_billing(BillingBuilder::new(21).build(), DefaultsFixtures::UNPAID)
        .await;

    let link = server
        .post("/api/v1/payments/billing/21/link")
        .add_header(AUTHORIZATION, writer())
        .await;
    link.assert_status_ok();
    let link: Value = link.json();
    assert_eq!(link["billing_ids"], json!([21]));
    assert!(link["payment_url"].as_str().unwrap().starts_with("https://pay.example.test/"));
    let total = link["amount"].as_i64().unwrap();
    let fee = link["fee"].as_i64().unwrap();
    assert_eq!(total, 150_000 + fee);

    let description = link["description"].as_str().unwrap().to_string();
    let webhook = server
        .post("/api/v1/billings/confirm-payment")
        .json(&json!({
            "event": "payment.received",
            "data": { "id": "inv-1", "status": "SUCCESS", "description": description }
        }))
        .await;

    webhook.assert_status_ok();
    let body: Value = webhook.json();
    assert_eq!(body["confirmed_ids"], json!([21]));
    assert_eq!(body["unmatched_ids"], json!([]));
    assert_eq!(
        store.status_of(core_kernel::BillingId::new(21)).await,
        Some(DefaultsFixtures::PAID)
    );
}

#[tokio::test]
async fn test_webhook_reports_unknown_billings_as_unmatched() {
    let Harness { server, .. } = harness().await;

    let response = server
        .post("/api/v1/billings/confirm-payment")
        .json(&json!({ "data": { "description": "9001 (DocumentID: N/A)" } }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["confirmed_ids"], json!([]));
    assert_eq!(body["unmatched_ids"], json!([9001]));
}

#[tokio::test]
async fn test_webhook_with_malformed_description_is_bad_request() {
    let Harness { server, .. } = harness().await;

    server
        .post("/api/v1/billings/confirm-payment")
        .json(&json!({ "data": { "description": "12,abc (DocumentID: N/A)" } }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_payment_link_for_unknown_billing_is_not_found() {
    let Harness { server, .. } = harness().await;

    server
        .post("/api/v1/payments/billing/999/link")
        .add_header(AUTHORIZATION, writer())
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payment_link_with_non_numeric_id_is_json_bad_request() {
    let Harness { server, .. } = harness().await;

    let response = server
        .post("/api/v1/payments/billing/abc/link")
        .add_header(AUTHORIZATION, writer())
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "bad_request");
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_payment_link_requires_billing_ids() {
    let Harness { server, .. } = harness().await;

    server
        .post("/api/v1/payments/billing/link")
        .add_header(AUTHORIZATION, writer())
        .json(&json!({ "billing_ids": [] }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_gateway_failure_is_bad_gateway() {
    let Harness { server, store } =
        harness_with_gateway(MockPaymentGateway::failing(Some(503), "maintenance")).await;
    store
        .insert_billing(BillingBuilder::new(5).build(), DefaultsFixtures::UNPAID)
        .await;

    let response = server
        .post("/api/v1/payments/billing/link")
        .add_header(AUTHORIZATION, writer())
        .json(&json!({ "billing_ids": [5] }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(store.status_of(core_kernel::BillingId::new(5)).await, Some(DefaultsFixtures::UNPAID));
}

#[tokio::test]
async fn test_confirm_single_marks_billing_paid() {
    let Harness { server, store } = harness().await;
    store
        .insert_billing(BillingBuilder::new(3).build(), DefaultsFixtures::UNPAID)
        .await;

    let response = server
        .post("/api/v1/billings/confirm-single")
        .add_header(AUTHORIZATION, writer())
        .json(&json!({ "billing_id": 3 }))
        .await;

    response.assert_status_ok();
    assert_eq!(store.status_of(core_kernel::BillingId::new(3)).await, Some(DefaultsFixtures::PAID));

    server
        .post("/api/v1/billings/confirm-single")
        .add_header(AUTHORIZATION, writer())
        .json(&json!({ "billing_id": 77 }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
