//! Audit trail for admin actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SubmitterId;

/// Kinds of audited actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    OverrideSelection,
    DeleteOutage,
    RemoveSubmission,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OverrideSelection => "override_selection",
            Self::DeleteOutage => "delete_outage",
            Self::RemoveSubmission => "remove_submission",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "override_selection" => Some(Self::OverrideSelection),
            "delete_outage" => Some(Self::DeleteOutage),
            "remove_submission" => Some(Self::RemoveSubmission),
            _ => None,
        }
    }
}

/// One audit log row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub at: DateTime<Utc>,
    pub actor_id: SubmitterId,
    pub action: AuditAction,
    /// What was acted on (date, outage id, album id)
    pub subject: String,
    pub detail: Option<String>,
    /// Correlation id handed back to the admin for follow-up
    pub correlation_id: Uuid,
}

impl AuditEntry {
    pub fn new(
        actor_id: SubmitterId,
        action: AuditAction,
        subject: impl Into<String>,
        detail: Option<String>,
        correlation_id: Uuid,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            at: Utc::now(),
            actor_id,
            action,
            subject: subject.into(),
            detail,
            correlation_id,
        }
    }
}
