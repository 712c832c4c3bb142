//! Daily selection model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AlbumId, SubmitterId};

/// The persisted Album of the Day for one calendar date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySelection {
    pub date: NaiveDate,
    pub submission_id: AlbumId,
    pub submitter_id: SubmitterId,
    /// True when an admin replaced the drawn pick
    pub manually_selected: bool,
    /// Shown publicly when `manually_selected` is set
    pub admin_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DailySelection {
    pub fn drawn(date: NaiveDate, submission_id: AlbumId, submitter_id: SubmitterId) -> Self {
        Self {
            date,
            submission_id,
            submitter_id,
            manually_selected: false,
            admin_message: None,
            created_at: Utc::now(),
        }
    }

    pub fn manual(
        date: NaiveDate,
        submission_id: AlbumId,
        submitter_id: SubmitterId,
        admin_message: Option<String>,
    ) -> Self {
        Self {
            date,
            submission_id,
            submitter_id,
            manually_selected: true,
            admin_message,
            created_at: Utc::now(),
        }
    }

    pub fn state(&self) -> SelectionState {
        if self.manually_selected {
            SelectionState::Overridden
        } else {
            SelectionState::Scheduled
        }
    }
}

/// Lifecycle of a date's selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionState {
    Unscheduled,
    Scheduled,
    Overridden,
}

impl SelectionState {
    pub fn of(selection: Option<&DailySelection>) -> Self {
        selection.map_or(SelectionState::Unscheduled, DailySelection::state)
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, SelectionState::Unscheduled)
    }
}
