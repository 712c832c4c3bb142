//! Outage storage operations

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::instrument;

use super::parse::{format_date, parse_date, parse_datetime, parse_outage_id, OptionalExt};
use crate::error::Result;
use crate::models::{Outage, OutageId, SubmitterId};

const OUTAGE_COLUMNS: &str =
    "id, submitter_id, start_date, end_date, reason, imposed_by_admin, created_by, created_at";

fn outage_from_row(row: &Row<'_>) -> rusqlite::Result<Outage> {
    Ok(Outage {
        id: parse_outage_id(&row.get::<_, String>(0)?)?,
        submitter_id: SubmitterId(row.get(1)?),
        start_date: parse_date(&row.get::<_, String>(2)?)?,
        end_date: parse_date(&row.get::<_, String>(3)?)?,
        reason: row.get(4)?,
        imposed_by_admin: row.get::<_, i32>(5)? != 0,
        created_by: SubmitterId(row.get(6)?),
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
    })
}

pub struct OutageStore<'a> {
    conn: &'a Connection,
}

impl<'a> OutageStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Persist an outage (validation happens in the ledger)
    #[instrument(skip(self, outage), fields(outage_id = %outage.id, submitter_id = %outage.submitter_id))]
    pub fn create(&self, outage: &Outage) -> Result<()> {
        self.conn.execute(
            "INSERT INTO outages (id, submitter_id, start_date, end_date, reason, imposed_by_admin, created_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                outage.id.to_string(),
                outage.submitter_id.as_str(),
                format_date(outage.start_date),
                format_date(outage.end_date),
                outage.reason,
                outage.imposed_by_admin as i32,
                outage.created_by.as_str(),
                outage.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find outage by id
    pub fn find_by_id(&self, id: OutageId) -> Result<Option<Outage>> {
        let sql = format!("SELECT {} FROM outages WHERE id = ?1", OUTAGE_COLUMNS);
        let outage = self
            .conn
            .query_row(&sql, params![id.to_string()], outage_from_row)
            .optional()?;
        Ok(outage)
    }

    /// List a submitter's outages by start date
    pub fn list_for_submitter(&self, submitter_id: &SubmitterId) -> Result<Vec<Outage>> {
        let sql = format!(
            "SELECT {} FROM outages WHERE submitter_id = ?1 ORDER BY start_date, end_date",
            OUTAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let outages = stmt
            .query_map(params![submitter_id.as_str()], outage_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(outages)
    }

    /// List every outage by start date
    pub fn list_all(&self) -> Result<Vec<Outage>> {
        let sql = format!(
            "SELECT {} FROM outages ORDER BY start_date, submitter_id",
            OUTAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let outages = stmt
            .query_map([], outage_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(outages)
    }

    /// List outages whose window includes `date`
    pub fn list_covering(&self, date: NaiveDate) -> Result<Vec<Outage>> {
        let sql = format!(
            "SELECT {} FROM outages WHERE start_date <= ?1 AND end_date >= ?1 ORDER BY submitter_id",
            OUTAGE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let outages = stmt
            .query_map(params![format_date(date)], outage_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(outages)
    }

    /// Delete an outage; returns whether a row was deleted
    #[instrument(skip(self))]
    pub fn delete(&self, id: OutageId) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM outages WHERE id = ?1", params![id.to_string()])?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOutage;
    use crate::storage::Database;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    fn outage(submitter: &str, start: NaiveDate, end: NaiveDate) -> Outage {
        Outage::from_request(
            NewOutage {
                submitter_id: submitter.into(),
                start_date: start,
                end_date: end,
                reason: "away".into(),
                imposed_by_admin: false,
            },
            submitter.into(),
        )
    }

    #[test]
    fn test_list_ordered_by_start() {
        let db = Database::open_in_memory().unwrap();
        db.outages().create(&outage("b", d(7, 1), d(7, 2))).unwrap();
        db.outages().create(&outage("b", d(6, 1), d(6, 3))).unwrap();

        let listed = db.outages().list_for_submitter(&"b".into()).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].start_date, d(6, 1));
        assert_eq!(listed[1].start_date, d(7, 1));
    }

    #[test]
    fn test_list_covering_inclusive() {
        let db = Database::open_in_memory().unwrap();
        db.outages().create(&outage("b", d(6, 1), d(6, 3))).unwrap();
        db.outages().create(&outage("c", d(6, 4), d(6, 5))).unwrap();

        assert_eq!(db.outages().list_covering(d(6, 3)).unwrap().len(), 1);
        assert_eq!(db.outages().list_covering(d(6, 4)).unwrap()[0].submitter_id.as_str(), "c");
        assert!(db.outages().list_covering(d(6, 6)).unwrap().is_empty());
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let o = outage("b", d(6, 1), d(6, 3));
        db.outages().create(&o).unwrap();

        assert!(db.outages().delete(o.id).unwrap());
        assert!(!db.outages().delete(o.id).unwrap());
        assert!(db.outages().find_by_id(o.id).unwrap().is_none());
    }
}
