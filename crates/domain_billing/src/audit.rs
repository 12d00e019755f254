//! Scheduler audit trail entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::ActorId;

/// Scheduler code recorded for monthly generation runs
pub const MONTHLY_BILLING_JOB: &str = "MONTHLY_BILLING_CREATION";

/// Run state recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SchedulerState {
    Start,
    Running,
    Success,
    Failed,
}

impl SchedulerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulerState::Start => "START",
            SchedulerState::Running => "RUNNING",
            SchedulerState::Success => "SUCCESS",
            SchedulerState::Failed => "FAILED",
        }
    }
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One append-only audit row
///
/// All entries written during a single run share the same `document_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub document_id: String,
    pub scheduler_code: String,
    pub message: String,
    pub state: SchedulerState,
    pub created_at: DateTime<Utc>,
    pub actor: ActorId,
}
