//! API configuration
//!
//! Every key can be set through an `API_`-prefixed environment variable,
//! e.g. `API_GATEWAY_API_KEY` or `API_SCHEDULER_CRON`. Unset keys keep their
//! defaults.

use std::time::Duration;

use serde::Deserialize;

use core_kernel::{ActorId, CategoryId, StatusId, Timezone};
use domain_billing::adapters::mayar::{MayarConfig, DEFAULT_BASE_URL};
use domain_billing::{
    DefaultsSettings, IssuerSettings, PayerContact, SchedulerSettings, DEFAULT_CRON_EXPRESSION,
    DEFAULT_RESIDENT_ROLE,
};
use infra_db::DatabaseConfig;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    pub database_max_connections: u32,
    /// Server-side limit on any single SQL statement
    pub database_statement_timeout_secs: u64,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Comma-separated allowed origins, or `*`
    pub cors_allowed_origins: String,

    // Hosted invoice provider
    pub gateway_base_url: String,
    pub gateway_api_key: String,
    pub gateway_timeout_secs: u64,
    pub payment_redirect_url: Option<String>,

    // Payer shown on invoices when the pricing configuration has none
    pub payer_name: Option<String>,
    pub payer_email: Option<String>,
    pub payer_phone: Option<String>,

    pub invoice_validity_days: i64,
    pub fee_label: String,

    // Reference rows resolved at startup
    pub resident_role: String,
    pub unpaid_status_id: Option<i64>,
    pub unpaid_status_name: String,
    pub paid_status_id: Option<i64>,
    pub paid_status_name: String,
    pub default_category_id: i64,

    // Monthly scheduler
    pub scheduler_enabled: bool,
    pub scheduler_cron: String,
    pub scheduler_timezone: String,
    pub scheduler_actor_id: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let defaults = DefaultsSettings::default();
        let issuer = IssuerSettings::default();

        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: "postgres://localhost/estate".to_string(),
            database_max_connections: 10,
            database_statement_timeout_secs: 30,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            cors_allowed_origins: "*".to_string(),
            gateway_base_url: DEFAULT_BASE_URL.to_string(),
            gateway_api_key: String::new(),
            gateway_timeout_secs: 30,
            payment_redirect_url: None,
            payer_name: None,
            payer_email: None,
            payer_phone: None,
            invoice_validity_days: issuer.invoice_validity_days,
            fee_label: issuer.fee_label,
            resident_role: DEFAULT_RESIDENT_ROLE.to_string(),
            unpaid_status_id: None,
            unpaid_status_name: defaults.unpaid_status_name,
            paid_status_id: None,
            paid_status_name: defaults.paid_status_name,
            default_category_id: defaults.default_category_id.value(),
            scheduler_enabled: true,
            scheduler_cron: DEFAULT_CRON_EXPRESSION.to_string(),
            scheduler_timezone: "Asia/Jakarta".to_string(),
            scheduler_actor_id: 1,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Allowed CORS origins; empty means any origin
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty() && *origin != "*")
            .map(str::to_string)
            .collect()
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.database_max_connections)
            .statement_timeout(Duration::from_secs(self.database_statement_timeout_secs))
    }

    pub fn mayar_config(&self) -> MayarConfig {
        MayarConfig::new(self.gateway_base_url.clone(), self.gateway_api_key.clone())
            .with_timeout(Duration::from_secs(self.gateway_timeout_secs))
    }

    pub fn issuer_settings(&self) -> IssuerSettings {
        IssuerSettings {
            invoice_validity_days: self.invoice_validity_days,
            fallback_contact: PayerContact {
                name: self.payer_name.clone(),
                email: self.payer_email.clone(),
                phone: self.payer_phone.clone(),
            },
            redirect_url: self.payment_redirect_url.clone(),
            fee_label: self.fee_label.clone(),
        }
    }

    pub fn defaults_settings(&self) -> DefaultsSettings {
        DefaultsSettings {
            unpaid_status_id: self.unpaid_status_id.map(StatusId::new),
            unpaid_status_name: self.unpaid_status_name.clone(),
            paid_status_id: self.paid_status_id.map(StatusId::new),
            paid_status_name: self.paid_status_name.clone(),
            default_category_id: CategoryId::new(self.default_category_id),
        }
    }

    /// Scheduler settings
    ///
    /// # Errors
    ///
    /// Returns the timezone parse error if `scheduler_timezone` is not an
    /// IANA zone name
    pub fn scheduler_settings(&self) -> Result<SchedulerSettings, core_kernel::PeriodError> {
        Ok(SchedulerSettings {
            cron_expression: self.scheduler_cron.clone(),
            timezone: self.scheduler_timezone.parse::<Timezone>()?,
            actor: ActorId::new(self.scheduler_actor_id),
        })
    }
}
