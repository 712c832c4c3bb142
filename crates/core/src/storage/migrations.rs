//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Candidate albums
            CREATE TABLE IF NOT EXISTS submissions (
                id TEXT PRIMARY KEY,
                submitter_id TEXT NOT NULL,
                hidden INTEGER NOT NULL DEFAULT 0,
                submission_date TEXT NOT NULL,
                last_selected_date TEXT,
                times_selected INTEGER NOT NULL DEFAULT 0
            );

            -- Eligibility exclusion windows (inclusive dates)
            CREATE TABLE IF NOT EXISTS outages (
                id TEXT PRIMARY KEY,
                submitter_id TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                reason TEXT NOT NULL,
                imposed_by_admin INTEGER NOT NULL DEFAULT 0,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                CHECK (end_date >= start_date)
            );

            -- One Album of the Day per calendar date
            CREATE TABLE IF NOT EXISTS daily_selections (
                date TEXT PRIMARY KEY,
                submission_id TEXT NOT NULL,
                submitter_id TEXT NOT NULL,
                manually_selected INTEGER NOT NULL DEFAULT 0,
                admin_message TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY (submission_id) REFERENCES submissions(id)
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for query performance",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_submissions_submitter ON submissions(submitter_id);
            CREATE INDEX IF NOT EXISTS idx_submissions_date ON submissions(submission_date);

            CREATE INDEX IF NOT EXISTS idx_outages_submitter ON outages(submitter_id, start_date);
            CREATE INDEX IF NOT EXISTS idx_outages_range ON outages(start_date, end_date);

            CREATE INDEX IF NOT EXISTS idx_selections_submission ON daily_selections(submission_id, date);
            CREATE INDEX IF NOT EXISTS idx_selections_submitter ON daily_selections(submitter_id, date);
        "#,
    },
    Migration {
        version: 3,
        description: "Add audit log for admin actions",
        sql: r#"
            CREATE TABLE IF NOT EXISTS audit_log (
                id TEXT PRIMARY KEY,
                at TEXT NOT NULL,
                actor_id TEXT NOT NULL,
                action TEXT NOT NULL,
                subject TEXT NOT NULL,
                detail TEXT,
                correlation_id TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_audit_at ON audit_log(at);
            CREATE INDEX IF NOT EXISTS idx_audit_correlation ON audit_log(correlation_id);
        "#,
    },
    Migration {
        version: 4,
        description: "Add settings table for server-side secrets",
        sql: r#"
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> =
        conn.query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })?;
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;
    info!(current_version, "Checking for pending migrations");

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            let tx = conn.unchecked_transaction()?;
            tx.execute_batch(migration.sql)?;
            record_migration(&tx, migration)?;
            tx.commit()?;

            info!(version = migration.version, "Migration complete");
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn test_migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_current_version(&conn).unwrap();
        assert_eq!(version, latest_version());
    }

    #[test]
    fn test_migrations_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }

    #[test]
    fn test_selection_date_is_unique() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO submissions (id, submitter_id, submission_date) VALUES ('a1', 'a', '2025-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        let insert = "INSERT INTO daily_selections (date, submission_id, submitter_id, created_at)
                      VALUES ('2025-06-01', 'a1', 'a', '2025-06-01T05:00:00Z')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
