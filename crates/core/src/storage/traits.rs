//! Storage repository traits
//!
//! These traits define the storage interface, allowing for different
//! implementations (SQLite, mock, future network backend).

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{AlbumId, DailySelection, Outage, OutageId, Submission, SubmitterId};

/// Pool store operations
pub trait PoolRepository {
    /// Add a submission
    fn create_submission(&self, submission: &Submission) -> Result<()>;

    /// Find submission by album id
    fn find_submission(&self, id: &AlbumId) -> Result<Option<Submission>>;

    /// List the pool, optionally including hidden submissions
    fn list_submissions(&self, include_hidden: bool) -> Result<Vec<Submission>>;

    /// List one submitter's submissions
    fn list_submissions_for(&self, submitter_id: &SubmitterId) -> Result<Vec<Submission>>;

    /// Remove a submission
    fn delete_submission(&self, id: &AlbumId) -> Result<bool>;
}

/// Outage ledger persistence
pub trait OutageRepository {
    /// Persist an already-validated outage
    fn create_outage(&self, outage: &Outage) -> Result<()>;

    /// Find outage by id
    fn find_outage(&self, id: OutageId) -> Result<Option<Outage>>;

    /// A submitter's outages by start date
    fn list_outages_for(&self, submitter_id: &SubmitterId) -> Result<Vec<Outage>>;

    /// Every outage by start date
    fn list_all_outages(&self) -> Result<Vec<Outage>>;

    /// Outages whose window includes `date`
    fn list_outages_covering(&self, date: NaiveDate) -> Result<Vec<Outage>>;

    /// Delete an outage
    fn delete_outage(&self, id: OutageId) -> Result<bool>;
}

/// Read access to persisted selections
pub trait SelectionRepository {
    /// Selection for a date, if one was made
    fn find_selection(&self, date: NaiveDate) -> Result<Option<DailySelection>>;

    /// Selections in `[from, to]`, ascending
    fn list_selections(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailySelection>>;

    /// How many dates a submission was picked for
    fn count_selections_for(&self, submission_id: &AlbumId) -> Result<u64>;
}
