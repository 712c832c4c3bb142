//! SQLite storage layer for the scheduler

mod audit;
mod migrations;
mod outages;
mod parse;
mod selections;
mod settings;
mod snapshot;
mod submissions;
mod traits;

use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;
use tracing::{debug, instrument};

use crate::boundary::shift_days;
use crate::error::Result;
use crate::models::{AlbumId, AuditEntry, DailySelection, Outage, OutageId, Submission, SubmitterId};

pub use audit::AuditStore;
pub use outages::OutageStore;
pub use parse::{format_date, DATE_FORMAT};
pub use selections::SelectionStore;
pub use settings::{SettingsStore, SEED_SECRET_KEY};
pub use snapshot::PoolSnapshot;
pub use submissions::SubmissionStore;
pub use traits::{OutageRepository, PoolRepository, SelectionRepository};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initialize database schema via migrations
    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)?;
        Ok(())
    }

    /// Get current schema version
    pub fn schema_version(&self) -> u32 {
        self.conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap_or(0)
    }

    /// Get submission store
    pub fn submissions(&self) -> SubmissionStore<'_> {
        SubmissionStore::new(&self.conn)
    }

    /// Get outage store
    pub fn outages(&self) -> OutageStore<'_> {
        OutageStore::new(&self.conn)
    }

    /// Get daily selection store
    pub fn selections(&self) -> SelectionStore<'_> {
        SelectionStore::new(&self.conn)
    }

    /// Get audit log store
    pub fn audit(&self) -> AuditStore<'_> {
        AuditStore::new(&self.conn)
    }

    /// Get settings store
    pub fn settings(&self) -> SettingsStore<'_> {
        SettingsStore::new(&self.conn)
    }

    /// Read the pool state for `date` in a single transaction.
    ///
    /// `lookback_days` bounds how far back selection history is loaded.
    #[instrument(skip(self))]
    pub fn snapshot(&self, date: NaiveDate, lookback_days: u32) -> Result<PoolSnapshot> {
        let tx = self.conn.unchecked_transaction()?;
        let from = shift_days(date, -i64::from(lookback_days));

        let snapshot = PoolSnapshot {
            submissions: SubmissionStore::new(&tx).list(true)?,
            outages: OutageStore::new(&tx).list_covering(date)?,
            recent_selections: SelectionStore::new(&tx).list_range(from, date)?,
        };
        tx.commit()?;

        debug!(
            submissions = snapshot.submissions.len(),
            outages = snapshot.outages.len(),
            recent = snapshot.recent_selections.len(),
            "Loaded pool snapshot"
        );
        Ok(snapshot)
    }

    /// Persist a drawn selection unless the date already has one.
    ///
    /// Returns whichever row is stored for the date afterwards. Bookkeeping
    /// on the submission is only touched when this call inserted the row.
    #[instrument(skip(self, selection), fields(date = %selection.date, album_id = %selection.submission_id))]
    pub fn record_drawn_selection(&self, selection: &DailySelection) -> Result<DailySelection> {
        let tx = self.conn.unchecked_transaction()?;
        let selections = SelectionStore::new(&tx);

        let stored = if selections.insert_if_absent(selection)? {
            SubmissionStore::new(&tx).record_selection(&selection.submission_id, selection.date)?;
            selection.clone()
        } else {
            debug!("Date already selected, returning stored row");
            selections.find_by_date(selection.date)?.ok_or_else(|| {
                crate::Error::NotFound(format!("selection for {}", selection.date))
            })?
        };

        tx.commit()?;
        Ok(stored)
    }

    /// Overwrite a date's selection and append the audit entry atomically.
    ///
    /// Returns the row that was replaced, if any.
    #[instrument(skip(self, selection, audit), fields(date = %selection.date, album_id = %selection.submission_id))]
    pub fn replace_selection(
        &self,
        selection: &DailySelection,
        audit: &AuditEntry,
    ) -> Result<Option<DailySelection>> {
        let tx = self.conn.unchecked_transaction()?;
        let selections = SelectionStore::new(&tx);
        let submissions = SubmissionStore::new(&tx);

        let previous = selections.find_by_date(selection.date)?;
        selections.upsert(selection)?;

        match &previous {
            Some(prev) if prev.submission_id == selection.submission_id => {}
            Some(prev) => {
                submissions.record_selection(&selection.submission_id, selection.date)?;
                submissions.refresh_last_selected(&prev.submission_id)?;
            }
            None => {
                submissions.record_selection(&selection.submission_id, selection.date)?;
            }
        }

        AuditStore::new(&tx).append(audit)?;
        tx.commit()?;
        Ok(previous)
    }

    /// Delete an outage, appending an audit entry in the same transaction
    pub fn delete_outage_audited(&self, id: OutageId, audit: Option<&AuditEntry>) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted = OutageStore::new(&tx).delete(id)?;
        if deleted {
            if let Some(entry) = audit {
                AuditStore::new(&tx).append(entry)?;
            }
        }
        tx.commit()?;
        Ok(deleted)
    }

    /// Remove a submission, appending an audit entry in the same transaction
    pub fn delete_submission_audited(&self, id: &AlbumId, audit: &AuditEntry) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted = SubmissionStore::new(&tx).delete(id)?;
        if deleted {
            AuditStore::new(&tx).append(audit)?;
        }
        tx.commit()?;
        Ok(deleted)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl PoolRepository for Database {
    fn create_submission(&self, submission: &Submission) -> Result<()> {
        self.submissions().create(submission)
    }

    fn find_submission(&self, id: &AlbumId) -> Result<Option<Submission>> {
        self.submissions().find_by_id(id)
    }

    fn list_submissions(&self, include_hidden: bool) -> Result<Vec<Submission>> {
        self.submissions().list(include_hidden)
    }

    fn list_submissions_for(&self, submitter_id: &SubmitterId) -> Result<Vec<Submission>> {
        self.submissions().list_for_submitter(submitter_id)
    }

    fn delete_submission(&self, id: &AlbumId) -> Result<bool> {
        self.submissions().delete(id)
    }
}

impl OutageRepository for Database {
    fn create_outage(&self, outage: &Outage) -> Result<()> {
        self.outages().create(outage)
    }

    fn find_outage(&self, id: OutageId) -> Result<Option<Outage>> {
        self.outages().find_by_id(id)
    }

    fn list_outages_for(&self, submitter_id: &SubmitterId) -> Result<Vec<Outage>> {
        self.outages().list_for_submitter(submitter_id)
    }

    fn list_all_outages(&self) -> Result<Vec<Outage>> {
        self.outages().list_all()
    }

    fn list_outages_covering(&self, date: NaiveDate) -> Result<Vec<Outage>> {
        self.outages().list_covering(date)
    }

    fn delete_outage(&self, id: OutageId) -> Result<bool> {
        self.outages().delete(id)
    }
}

impl SelectionRepository for Database {
    fn find_selection(&self, date: NaiveDate) -> Result<Option<DailySelection>> {
        self.selections().find_by_date(date)
    }

    fn list_selections(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailySelection>> {
        self.selections().list_range(from, to)
    }

    fn count_selections_for(&self, submission_id: &AlbumId) -> Result<u64> {
        self.selections().count_for_submission(submission_id)
    }
}
