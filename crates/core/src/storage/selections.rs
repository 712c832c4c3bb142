//! Daily selection storage operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{format_date, parse_date, parse_datetime, OptionalExt};
use crate::error::Result;
use crate::models::{AlbumId, DailySelection, SubmitterId};

const SELECTION_COLUMNS: &str =
    "date, submission_id, submitter_id, manually_selected, admin_message, created_at";

fn selection_from_row(row: &Row<'_>) -> rusqlite::Result<DailySelection> {
    Ok(DailySelection {
        date: parse_date(&row.get::<_, String>(0)?)?,
        submission_id: AlbumId(row.get(1)?),
        submitter_id: SubmitterId(row.get(2)?),
        manually_selected: row.get::<_, i32>(3)? != 0,
        admin_message: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

pub struct SelectionStore<'a> {
    conn: &'a Connection,
}

impl<'a> SelectionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Find the selection for a date
    #[instrument(skip(self))]
    pub fn find_by_date(&self, date: NaiveDate) -> Result<Option<DailySelection>> {
        let sql = format!(
            "SELECT {} FROM daily_selections WHERE date = ?1",
            SELECTION_COLUMNS
        );
        let selection = self
            .conn
            .query_row(&sql, params![format_date(date)], selection_from_row)
            .optional()?;
        Ok(selection)
    }

    /// Insert unless the date already has a row.
    ///
    /// Returns false when another writer got there first.
    pub fn insert_if_absent(&self, selection: &DailySelection) -> Result<bool> {
        let count = self.conn.execute(
            "INSERT INTO daily_selections (date, submission_id, submitter_id, manually_selected, admin_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(date) DO NOTHING",
            params![
                format_date(selection.date),
                selection.submission_id.as_str(),
                selection.submitter_id.as_str(),
                selection.manually_selected as i32,
                selection.admin_message,
                selection.created_at.to_rfc3339(),
            ],
        )?;
        Ok(count > 0)
    }

    /// Insert or overwrite the row for the selection's date
    pub fn upsert(&self, selection: &DailySelection) -> Result<()> {
        self.conn.execute(
            "INSERT INTO daily_selections (date, submission_id, submitter_id, manually_selected, admin_message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(date) DO UPDATE SET
                submission_id = ?2,
                submitter_id = ?3,
                manually_selected = ?4,
                admin_message = ?5,
                created_at = ?6",
            params![
                format_date(selection.date),
                selection.submission_id.as_str(),
                selection.submitter_id.as_str(),
                selection.manually_selected as i32,
                selection.admin_message,
                selection.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Selections in `[from, to]`, ascending
    pub fn list_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailySelection>> {
        let sql = format!(
            "SELECT {} FROM daily_selections WHERE date >= ?1 AND date <= ?2 ORDER BY date",
            SELECTION_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let selections = stmt
            .query_map(
                params![format_date(from), format_date(to)],
                selection_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(selections)
    }

    /// Number of dates a submission has been picked for
    pub fn count_for_submission(&self, submission_id: &AlbumId) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM daily_selections WHERE submission_id = ?1",
            params![submission_id.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
