//! Consistent read of everything the evaluator needs for one date

use chrono::NaiveDate;

use crate::models::{DailySelection, Outage, Submission};

/// Pool state as of one read transaction
#[derive(Debug, Clone, Default)]
pub struct PoolSnapshot {
    /// All submissions, hidden ones included
    pub submissions: Vec<Submission>,
    /// Outages covering the snapshot date
    pub outages: Vec<Outage>,
    /// Selections from the lookback start through the snapshot date, ascending
    pub recent_selections: Vec<DailySelection>,
}

impl PoolSnapshot {
    /// The selection already made for `date`, if it is inside the lookback
    pub fn selection_on(&self, date: NaiveDate) -> Option<&DailySelection> {
        self.recent_selections.iter().find(|s| s.date == date)
    }
}
