//! Key/value settings persistence
//!
//! Holds server-side values that must survive restarts, like the draw seed secret.

use chrono::Utc;
use rusqlite::{params, Connection};

use super::parse::OptionalExt;
use crate::error::Result;

/// Settings key for the persisted draw secret
pub const SEED_SECRET_KEY: &str = "seed_secret";

pub struct SettingsStore<'a> {
    conn: &'a Connection,
}

impl<'a> SettingsStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = ?3",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Return the stored value, or store and return `init()` if absent
    pub fn get_or_insert_with<F>(&self, key: &str, init: F) -> Result<String>
    where
        F: FnOnce() -> String,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        let value = init();
        self.set(key, &value)?;
        Ok(value)
    }
}
