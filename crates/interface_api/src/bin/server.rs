//! Estate Billing - API Server Binary
//!
//! Starts the HTTP API and, unless disabled, the monthly billing scheduler.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin estate-billing-api
//!
//! # Run with environment variables
//! API_DATABASE_URL=postgres://... API_GATEWAY_API_KEY=... cargo run --bin estate-billing-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` / `API_PORT` - Listen address (default: 0.0.0.0:8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_GATEWAY_BASE_URL` / `API_GATEWAY_API_KEY` - Hosted invoice provider
//! * `API_SCHEDULER_ENABLED` / `API_SCHEDULER_CRON` - Monthly billing run
//! * `RUST_LOG` - Log filter (default: `interface_api=debug,tower_http=debug`)
//! * `LOG_FORMAT` - `json` for JSON log lines

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::HealthCheckable;
use domain_billing::adapters::mayar::MayarInvoiceAdapter;
use domain_billing::{
    BatchGenerator, BillingDefaults, BillingScheduler, DescriptionCodec, PaymentLinkIssuer,
    PaymentReconciler,
};
use infra_db::adapters::{
    PostgresAuditLog, PostgresBillingStore, PostgresReferenceData, PostgresResidentDirectory,
};
use infra_db::{create_pool, run_migrations};
use interface_api::{config::ApiConfig, create_router, AppState, BillingServices};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    init_tracing();

    let config = ApiConfig::from_env().context("failed to load configuration")?;

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting Estate Billing API Server"
    );

    let pool = create_pool(config.database_config())
        .await
        .context("failed to connect to database")?;
    run_migrations(&pool).await.context("failed to run migrations")?;

    let store = Arc::new(PostgresBillingStore::new(pool.clone()));
    let reference = Arc::new(PostgresReferenceData::new(pool.clone()));
    let residents = Arc::new(PostgresResidentDirectory::new(pool.clone()));
    let audit = Arc::new(PostgresAuditLog::new(pool.clone()));

    let defaults = BillingDefaults::resolve(reference.as_ref(), &config.defaults_settings())
        .await
        .context("failed to resolve billing statuses")?;
    tracing::info!(
        unpaid = %defaults.unpaid_status,
        paid = %defaults.paid_status,
        category = %defaults.default_category,
        "Billing defaults resolved"
    );

    let mayar = config.mayar_config();
    if !mayar.is_configured() {
        tracing::warn!("Invoice provider API key is not set; payment links will fail");
    }
    let gateway = Arc::new(MayarInvoiceAdapter::new(mayar).context("failed to build invoice client")?);
    let codec = Arc::new(DescriptionCodec);

    let generator = Arc::new(
        BatchGenerator::new(residents, reference.clone(), store.clone(), &defaults)
            .with_resident_role(config.resident_role.clone()),
    );

    let services = BillingServices {
        generator: generator.clone(),
        issuer: PaymentLinkIssuer::new(
            store.clone(),
            reference,
            gateway.clone(),
            codec.clone(),
            config.issuer_settings(),
        ),
        reconciler: PaymentReconciler::new(store.clone(), codec, defaults.paid_status),
        health_checks: vec![
            store as Arc<dyn HealthCheckable>,
            gateway as Arc<dyn HealthCheckable>,
        ],
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler_task = if config.scheduler_enabled {
        let settings = config
            .scheduler_settings()
            .context("invalid scheduler timezone")?;
        let scheduler = BillingScheduler::new(generator, audit, &settings)?;
        tracing::info!(cron = %settings.cron_expression, timezone = settings.timezone.tz().name(), "Scheduler enabled");
        Some(Arc::new(scheduler).spawn(shutdown_rx))
    } else {
        tracing::info!("Scheduler disabled");
        None
    };

    let addr: SocketAddr = config.server_addr().parse().context("invalid listen address")?;
    let app = create_router(AppState::new(services, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Some(task) = scheduler_task {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Scheduler task ended abnormally");
        }
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Installs the tracing subscriber; `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("interface_api=debug,tower_http=debug"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
