//! Audit log storage

use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use super::parse::{parse_audit_action, parse_datetime, parse_uuid};
use crate::error::Result;
use crate::models::{AuditEntry, SubmitterId};

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<AuditEntry> {
    Ok(AuditEntry {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        at: parse_datetime(&row.get::<_, String>(1)?)?,
        actor_id: SubmitterId(row.get(2)?),
        action: parse_audit_action(&row.get::<_, String>(3)?)?,
        subject: row.get(4)?,
        detail: row.get(5)?,
        correlation_id: parse_uuid(&row.get::<_, String>(6)?)?,
    })
}

pub struct AuditStore<'a> {
    conn: &'a Connection,
}

impl<'a> AuditStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append an entry
    pub fn append(&self, entry: &AuditEntry) -> Result<()> {
        self.conn.execute(
            "INSERT INTO audit_log (id, at, actor_id, action, subject, detail, correlation_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.id.to_string(),
                entry.at.to_rfc3339(),
                entry.actor_id.as_str(),
                entry.action.as_str(),
                entry.subject,
                entry.detail,
                entry.correlation_id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Most recent entries first
    pub fn list_recent(&self, limit: u32) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, at, actor_id, action, subject, detail, correlation_id
             FROM audit_log ORDER BY at DESC LIMIT ?1",
        )?;
        let entries = stmt
            .query_map(params![limit], entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Entries sharing a correlation id
    pub fn find_by_correlation(&self, correlation_id: Uuid) -> Result<Vec<AuditEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, at, actor_id, action, subject, detail, correlation_id
             FROM audit_log WHERE correlation_id = ?1 ORDER BY at",
        )?;
        let entries = stmt
            .query_map(params![correlation_id.to_string()], entry_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}
