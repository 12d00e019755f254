//! Mayar hosted invoice adapter
//!
//! Implements [`PaymentGateway`] against Mayar's headless invoice API:
//! `POST {base_url}/invoice/create` with bearer authentication. The response
//! wraps the invoice in a `{statusCode, messages, data}` envelope.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use core_kernel::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};

use crate::invoice::{InvoiceRequest, IssuedInvoice};
use crate::ports::PaymentGateway;

pub const DEFAULT_BASE_URL: &str = "https://api.mayar.id/hl/v1";

/// Connection settings for the Mayar API
#[derive(Debug)]
pub struct MayarConfig {
    pub base_url: String,
    pub api_key: Secret<String>,
    /// Bound on each outbound call
    pub timeout: Duration,
}

impl MayarConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: Secret::new(api_key.into()),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.expose_secret().is_empty()
    }
}

/// Request body for invoice creation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateInvoiceBody<'a> {
    name: &'a str,
    email: &'a str,
    mobile: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_url: Option<&'a str>,
    description: &'a str,
    expired_at: String,
    items: Vec<InvoiceItemBody<'a>>,
}

#[derive(Debug, Serialize)]
struct InvoiceItemBody<'a> {
    quantity: u32,
    rate: i64,
    description: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    status_code: Option<u16>,
    messages: Option<String>,
    data: Option<InvoiceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InvoiceData {
    id: String,
    transaction_id: Option<String>,
    link: String,
    expired_at: Option<Expiry>,
}

/// Mayar reports expiry as epoch milliseconds; ISO strings are accepted too
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Expiry {
    Millis(i64),
    Text(String),
}

impl Expiry {
    fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiry::Millis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Expiry::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// Mayar client implementing the payment gateway port
pub struct MayarInvoiceAdapter {
    client: Client,
    config: MayarConfig,
}

impl MayarInvoiceAdapter {
    pub fn new(config: MayarConfig) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn map_send_error(&self, error: reqwest::Error) -> PortError {
        if error.is_timeout() {
            PortError::Timeout {
                operation: "create_invoice".to_string(),
                duration_ms: self.config.timeout.as_millis() as u64,
            }
        } else if error.is_connect() {
            PortError::Connection {
                message: format!("cannot reach payment provider: {error}"),
                source: Some(Box::new(error)),
            }
        } else {
            PortError::upstream(error.status().map(|s| s.as_u16()), error.to_string())
        }
    }
}

impl DomainPort for MayarInvoiceAdapter {}

#[async_trait]
impl HealthCheckable for MayarInvoiceAdapter {
    // No outbound probe: the provider has no free health endpoint.
    async fn health_check(&self) -> HealthCheckResult {
        if self.config.is_configured() {
            HealthCheckResult::healthy("mayar-invoice", 0)
        } else {
            HealthCheckResult {
                status: AdapterHealth::Degraded,
                message: Some("Mayar API key or base URL not configured".to_string()),
                ..HealthCheckResult::healthy("mayar-invoice", 0)
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for MayarInvoiceAdapter {
    #[instrument(skip(self, request), fields(items = request.items.len()))]
    async fn create_invoice(&self, request: InvoiceRequest) -> Result<IssuedInvoice, PortError> {
        if !self.config.is_configured() {
            return Err(PortError::internal("Mayar credentials not configured"));
        }

        let body = CreateInvoiceBody {
            name: &request.payer.name,
            email: &request.payer.email,
            mobile: &request.payer.mobile,
            redirect_url: request.redirect_url.as_deref(),
            description: &request.description,
            expired_at: request.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            items: request
                .items
                .iter()
                .map(|item| InvoiceItemBody {
                    quantity: item.quantity,
                    rate: item.rate.amount(),
                    description: &item.description,
                })
                .collect(),
        };

        let url = format!("{}/invoice/create", self.config.base_url.trim_end_matches('/'));
        let started = Instant::now();

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.config.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| self.map_send_error(e))?;
        debug!(
            status = %status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            body = %text,
            "Mayar invoice/create response"
        );

        if !status.is_success() {
            warn!(status = %status, "Mayar rejected invoice creation");
            return Err(PortError::upstream(Some(status.as_u16()), text));
        }

        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|e| PortError::upstream(Some(status.as_u16()), format!("malformed response: {e}")))?;

        if let Some(code) = envelope.status_code.filter(|c| !(200..300).contains(c)) {
            return Err(PortError::upstream(
                Some(code),
                envelope.messages.unwrap_or_else(|| "invoice creation failed".to_string()),
            ));
        }

        let data = envelope
            .data
            .ok_or_else(|| PortError::upstream(Some(status.as_u16()), "response has no invoice data"))?;

        info!(invoice_id = %data.id, "Mayar invoice created");
        Ok(IssuedInvoice {
            expires_at: data.expired_at.as_ref().and_then(Expiry::to_datetime),
            id: data.id,
            transaction_id: data.transaction_id,
            link: data.link,
        })
    }
}
