//! HTTP API Layer
//!
//! This crate provides the REST API for estate billing using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: billing generation, payment links, the provider webhook
//! - **Middleware**: authentication and request logging
//! - **DTOs**: request/response bodies with `validator` rules
//! - **Error Handling**: consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let app = create_router(AppState::new(services, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use core_kernel::HealthCheckable;
use domain_billing::{BatchGenerator, PaymentLinkIssuer, PaymentReconciler};

use crate::config::ApiConfig;
use crate::handlers::{billing, health, payment, webhook};
use crate::middleware::{auth_middleware, request_log_middleware};

/// Domain services behind the handlers
pub struct BillingServices {
    pub generator: Arc<BatchGenerator>,
    pub issuer: PaymentLinkIssuer,
    pub reconciler: PaymentReconciler,
    /// Adapters probed by the readiness check
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<BillingServices>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(services: BillingServices, config: ApiConfig) -> Self {
        Self {
            services: Arc::new(services),
            config: Arc::new(config),
        }
    }
}

/// Creates the main API router
///
/// Health probes and the provider webhook are public; everything else
/// needs a bearer token.
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check));

    let webhook_routes = Router::new()
        .route("/billings/confirm-payment", post(webhook::confirm_payment))
        .layer(axum_middleware::from_fn(request_log_middleware));

    let protected_routes = Router::new()
        .route("/billings/bulk-monthly", post(billing::bulk_monthly))
        .route("/billings/bulk-custom", post(billing::bulk_custom))
        .route("/billings/confirm-single", post(billing::confirm_single))
        .route("/payments/billing/link", post(payment::link_for_billings))
        .route("/payments/billing/:id/link", post(payment::link_for_billing))
        .layer(axum_middleware::from_fn(request_log_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let cors = cors_layer(&state.config);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", webhook_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins()
        .into_iter()
        .filter_map(|origin| match HeaderValue::from_str(&origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
