//! Monthly billing scheduler
//!
//! Fires on a cron schedule evaluated in the estate's timezone and bills every
//! eligible resident for the month the fire time falls in. Each run leaves an
//! audit trail of `START`, `RUNNING`, then `SUCCESS` or `FAILED`, all sharing
//! one document id. A failed run is logged and the next fire proceeds as
//! usual.

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use cron::Schedule;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use core_kernel::{ActorId, BillingPeriod, Timezone};

use crate::audit::{AuditLogEntry, SchedulerState, MONTHLY_BILLING_JOB};
use crate::error::BillingError;
use crate::generation::{BatchGenerator, BatchKind, BatchResult, GenerateBatchRequest};
use crate::ports::AuditLog;

/// Midnight at the start of every month (seconds field first)
pub const DEFAULT_CRON_EXPRESSION: &str = "0 0 0 1 * *";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerSettings {
    pub cron_expression: String,
    pub timezone: Timezone,
    /// Recorded as creator of scheduled billings and audit entries
    pub actor: ActorId,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            cron_expression: DEFAULT_CRON_EXPRESSION.to_string(),
            timezone: Timezone::default(),
            actor: ActorId::new(1),
        }
    }
}

/// Result of one scheduled run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub document_id: String,
    pub period: BillingPeriod,
    pub state: SchedulerState,
    pub result: Option<BatchResult>,
}

pub struct BillingScheduler {
    generator: Arc<BatchGenerator>,
    audit: Arc<dyn AuditLog>,
    schedule: Schedule,
    timezone: Timezone,
    actor: ActorId,
}

impl BillingScheduler {
    /// Creates a scheduler
    ///
    /// # Errors
    ///
    /// `Configuration` if the cron expression does not parse
    pub fn new(
        generator: Arc<BatchGenerator>,
        audit: Arc<dyn AuditLog>,
        settings: &SchedulerSettings,
    ) -> Result<Self, BillingError> {
        let schedule = Schedule::from_str(&settings.cron_expression).map_err(|e| {
            BillingError::configuration(format!(
                "invalid cron expression {:?}: {e}",
                settings.cron_expression
            ))
        })?;

        Ok(Self {
            generator,
            audit,
            schedule,
            timezone: settings.timezone,
            actor: settings.actor,
        })
    }

    /// Next fire time strictly after `after`
    pub fn next_fire_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local = self.timezone.to_local(after);
        self.schedule
            .after(&local)
            .next()
            .map(|fire| fire.with_timezone(&Utc))
    }

    /// Runs one monthly generation for the period containing `now`
    ///
    /// Never fails; the outcome is in the report and the audit trail.
    pub async fn run_once(&self, now: DateTime<Utc>) -> RunReport {
        let document_id = Uuid::new_v4().to_string();
        let period = BillingPeriod::containing(now, self.timezone);

        self.record(&document_id, SchedulerState::Start, "Monthly billing run started".to_string())
            .await;
        self.record(
            &document_id,
            SchedulerState::Running,
            format!(
                "Creating monthly billings for month {} year {}",
                period.month(),
                period.year()
            ),
        )
        .await;

        let request = GenerateBatchRequest {
            kind: BatchKind::Monthly,
            resident_ids: None,
            period,
        };

        let (state, result) = match self.generator.generate_batch(request, self.actor).await {
            Ok(result) if result.is_success() => {
                let summary = serde_json::to_string(&result).unwrap_or_default();
                self.record(
                    &document_id,
                    SchedulerState::Success,
                    format!("Monthly billings created successfully: {summary}"),
                )
                .await;
                info!(%period, billings = result.success_count, "Scheduled billing run succeeded");
                (SchedulerState::Success, Some(result))
            }
            Ok(result) => {
                let cause = result.errors.first().cloned().unwrap_or_default();
                self.record(
                    &document_id,
                    SchedulerState::Failed,
                    format!("Failed to create monthly billings: {cause}"),
                )
                .await;
                error!(%period, error = %cause, "Scheduled billing run rolled back");
                (SchedulerState::Failed, Some(result))
            }
            Err(e) => {
                self.record(
                    &document_id,
                    SchedulerState::Failed,
                    format!("Failed to create monthly billings: {e}"),
                )
                .await;
                error!(%period, error = %e, "Scheduled billing run failed");
                (SchedulerState::Failed, None)
            }
        };

        RunReport {
            document_id,
            period,
            state,
            result,
        }
    }

    async fn record(&self, document_id: &str, state: SchedulerState, message: String) {
        let entry = AuditLogEntry {
            document_id: document_id.to_string(),
            scheduler_code: MONTHLY_BILLING_JOB.to_string(),
            message,
            state,
            created_at: Utc::now(),
            actor: self.actor,
        };
        if let Err(e) = self.audit.append(entry).await {
            warn!(%state, error = %e, "Failed to write scheduler audit entry");
        }
    }

    /// Runs the scheduler until `shutdown` flips to true or its sender is dropped
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(timezone = %self.timezone.tz().name(), "Billing scheduler started");
            loop {
                let now = Utc::now();
                let Some(next) = self.next_fire_after(now) else {
                    warn!("Cron schedule has no upcoming fire time, stopping scheduler");
                    break;
                };
                let wait = (next - now).to_std().unwrap_or_default();
                info!(next_fire = %next, "Waiting for next billing run");

                tokio::select! {
                    _ = tokio::time::sleep(wait) => {
                        self.run_once(next).await;
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Billing scheduler stopping");
                            break;
                        }
                    }
                }
            }
        })
    }
}
