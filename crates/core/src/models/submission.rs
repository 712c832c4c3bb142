//! Pool submission model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{AlbumId, SubmitterId};

/// A candidate album in the pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: AlbumId,
    pub submitter_id: SubmitterId,
    /// Hidden from public listings; still eligible for selection
    pub hidden: bool,
    pub submission_date: DateTime<Utc>,
    pub last_selected_date: Option<NaiveDate>,
    pub times_selected: u32,
}

impl Submission {
    pub fn new(id: AlbumId, submitter_id: SubmitterId, hidden: bool) -> Self {
        Self {
            id,
            submitter_id,
            hidden,
            submission_date: Utc::now(),
            last_selected_date: None,
            times_selected: 0,
        }
    }

    pub fn with_submission_date(mut self, at: DateTime<Utc>) -> Self {
        self.submission_date = at;
        self
    }

    pub fn is_never_selected(&self) -> bool {
        self.last_selected_date.is_none()
    }
}
