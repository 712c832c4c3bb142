//! Pool store: submission storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{format_date, parse_date_opt, parse_datetime, OptionalExt};
use crate::error::Result;
use crate::models::{AlbumId, Submission, SubmitterId};
use chrono::NaiveDate;

const SUBMISSION_COLUMNS: &str =
    "id, submitter_id, hidden, submission_date, last_selected_date, times_selected";

fn submission_from_row(row: &Row<'_>) -> rusqlite::Result<Submission> {
    Ok(Submission {
        id: AlbumId(row.get(0)?),
        submitter_id: SubmitterId(row.get(1)?),
        hidden: row.get::<_, i32>(2)? != 0,
        submission_date: parse_datetime(&row.get::<_, String>(3)?)?,
        last_selected_date: parse_date_opt(row.get::<_, Option<String>>(4)?)?,
        times_selected: row.get(5)?,
    })
}

pub struct SubmissionStore<'a> {
    conn: &'a Connection,
}

impl<'a> SubmissionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Add a submission to the pool
    #[instrument(skip(self, submission), fields(album_id = %submission.id, submitter_id = %submission.submitter_id))]
    pub fn create(&self, submission: &Submission) -> Result<()> {
        self.conn.execute(
            "INSERT INTO submissions (id, submitter_id, hidden, submission_date, last_selected_date, times_selected)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                submission.id.as_str(),
                submission.submitter_id.as_str(),
                submission.hidden as i32,
                submission.submission_date.to_rfc3339(),
                submission.last_selected_date.map(format_date),
                submission.times_selected,
            ],
        )?;
        Ok(())
    }

    /// Find submission by album id
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: &AlbumId) -> Result<Option<Submission>> {
        let sql = format!("SELECT {} FROM submissions WHERE id = ?1", SUBMISSION_COLUMNS);
        let submission = self
            .conn
            .query_row(&sql, params![id.as_str()], submission_from_row)
            .optional()?;
        Ok(submission)
    }

    /// List the pool, oldest first
    pub fn list(&self, include_hidden: bool) -> Result<Vec<Submission>> {
        let sql = format!(
            "SELECT {} FROM submissions WHERE hidden = 0 OR ?1 ORDER BY submission_date, id",
            SUBMISSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let submissions = stmt
            .query_map(params![include_hidden], submission_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(submissions)
    }

    /// List one submitter's albums, oldest first (hidden included)
    pub fn list_for_submitter(&self, submitter_id: &SubmitterId) -> Result<Vec<Submission>> {
        let sql = format!(
            "SELECT {} FROM submissions WHERE submitter_id = ?1 ORDER BY submission_date, id",
            SUBMISSION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let submissions = stmt
            .query_map(params![submitter_id.as_str()], submission_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(submissions)
    }

    /// Remove a submission; returns whether a row was deleted
    #[instrument(skip(self))]
    pub fn delete(&self, id: &AlbumId) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM submissions WHERE id = ?1", params![id.as_str()])?;
        Ok(count > 0)
    }

    /// Bookkeeping when a submission becomes Album of the Day
    pub fn record_selection(&self, id: &AlbumId, date: NaiveDate) -> Result<()> {
        let date = format_date(date);
        self.conn.execute(
            "UPDATE submissions
             SET times_selected = times_selected + 1,
                 last_selected_date = CASE
                     WHEN last_selected_date IS NULL OR last_selected_date < ?2 THEN ?2
                     ELSE last_selected_date
                 END
             WHERE id = ?1",
            params![id.as_str(), date],
        )?;
        Ok(())
    }

    /// Recompute `last_selected_date` from selection history.
    ///
    /// `times_selected` is never decremented.
    pub fn refresh_last_selected(&self, id: &AlbumId) -> Result<()> {
        self.conn.execute(
            "UPDATE submissions
             SET last_selected_date = (
                 SELECT MAX(date) FROM daily_selections WHERE submission_id = ?1
             )
             WHERE id = ?1",
            params![id.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use chrono::{TimeZone, Utc};

    fn sub(id: &str, submitter: &str, hidden: bool, day: u32) -> Submission {
        Submission::new(id.into(), submitter.into(), hidden)
            .with_submission_date(Utc.with_ymd_and_hms(2025, 1, day, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let s = sub("album-1", "alice", false, 1);
        db.submissions().create(&s).unwrap();

        let found = db.submissions().find_by_id(&"album-1".into()).unwrap().unwrap();
        assert_eq!(found, s);
        assert!(db.submissions().find_by_id(&"missing".into()).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_album_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.submissions().create(&sub("album-1", "alice", false, 1)).unwrap();
        assert!(db.submissions().create(&sub("album-1", "bob", false, 2)).is_err());
    }

    #[test]
    fn test_list_filters_hidden() {
        let db = Database::open_in_memory().unwrap();
        db.submissions().create(&sub("b", "bob", true, 2)).unwrap();
        db.submissions().create(&sub("a", "alice", false, 1)).unwrap();

        let public = db.submissions().list(false).unwrap();
        assert_eq!(public.len(), 1);
        assert_eq!(public[0].id.as_str(), "a");

        let all = db.submissions().list(true).unwrap();
        let ids: Vec<_> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_record_selection_keeps_latest_date() {
        let db = Database::open_in_memory().unwrap();
        db.submissions().create(&sub("a", "alice", false, 1)).unwrap();
        let later = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();

        db.submissions().record_selection(&"a".into(), later).unwrap();
        db.submissions().record_selection(&"a".into(), earlier).unwrap();

        let s = db.submissions().find_by_id(&"a".into()).unwrap().unwrap();
        assert_eq!(s.times_selected, 2);
        assert_eq!(s.last_selected_date, Some(later));
    }
}
