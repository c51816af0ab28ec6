use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::models::{Credentials, HistoryEntry, UpdateRecord};

const SCHEMA_VERSION: i32 = 1;

/// Most recent submissions kept in the local history.
pub const HISTORY_LIMIT: usize = 50;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open database")?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let version: i32 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap_or(0);

        if version < SCHEMA_VERSION {
            self.conn.execute_batch(
                r#"
                -- Synced settings: one Jira connection per workspace
                CREATE TABLE IF NOT EXISTS jira_config (
                    id INTEGER PRIMARY KEY CHECK (id = 1),
                    domain TEXT NOT NULL,
                    email TEXT NOT NULL,
                    api_token TEXT NOT NULL
                );

                -- Local submission history, newest = highest id
                CREATE TABLE IF NOT EXISTS update_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    ticket_key TEXT NOT NULL,
                    yesterday TEXT NOT NULL DEFAULT '',
                    today TEXT NOT NULL DEFAULT '',
                    blockers TEXT NOT NULL DEFAULT '',
                    completion_date TEXT,
                    timestamp TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_history_ticket ON update_history(ticket_key);
                "#,
            )?;

            self.conn
                .execute(&format!("PRAGMA user_version = {}", SCHEMA_VERSION), [])?;
        }

        Ok(())
    }

    // Jira connection settings
    pub fn get_jira_config(&self) -> Result<Option<Credentials>> {
        let creds = self
            .conn
            .query_row(
                "SELECT domain, email, api_token FROM jira_config WHERE id = 1",
                [],
                |row| {
                    Ok(Credentials {
                        domain: row.get(0)?,
                        email: row.get(1)?,
                        api_token: row.get(2)?,
                    })
                },
            )
            .optional()
            .context("Failed to read Jira settings")?;
        Ok(creds)
    }

    pub fn set_jira_config(&self, creds: &Credentials) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO jira_config (id, domain, email, api_token) VALUES (1, ?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET domain = excluded.domain, email = excluded.email, api_token = excluded.api_token",
                params![creds.domain, creds.email, creds.api_token],
            )
            .context("Failed to save Jira settings")?;
        tracing::debug!(domain = %creds.domain, "saved jira settings");
        Ok(())
    }

    pub fn clear_jira_config(&self) -> Result<bool> {
        let rows = self.conn.execute("DELETE FROM jira_config", [])?;
        Ok(rows > 0)
    }

    // Update history
    pub fn append_history(&self, entry: &HistoryEntry) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO update_history (ticket_key, yesterday, today, blockers, completion_date, timestamp) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.ticket_key,
                entry.updates.yesterday,
                entry.updates.today,
                entry.updates.blockers,
                entry.updates.completion_date.map(|d| d.format("%Y-%m-%d").to_string()),
                entry.timestamp.to_rfc3339(),
            ],
        )?;
        let pruned = tx.execute(
            "DELETE FROM update_history WHERE id NOT IN (SELECT id FROM update_history ORDER BY id DESC LIMIT ?1)",
            [HISTORY_LIMIT as i64],
        )?;
        tx.commit()?;

        if pruned > 0 {
            tracing::debug!(pruned, "trimmed update history");
        }
        Ok(())
    }

    pub fn list_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT ticket_key, yesterday, today, blockers, completion_date, timestamp FROM update_history ORDER BY id DESC",
        )?;

        let entries = stmt
            .query_map([], |row| {
                Ok(HistoryEntry {
                    ticket_key: row.get(0)?,
                    updates: UpdateRecord {
                        yesterday: row.get(1)?,
                        today: row.get(2)?,
                        blockers: row.get(3)?,
                        completion_date: row.get::<_, Option<String>>(4)?.and_then(parse_date),
                    },
                    timestamp: parse_datetime(row.get::<_, String>(5)?),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    pub fn clear_history(&self) -> Result<usize> {
        let rows = self.conn.execute("DELETE FROM update_history", [])?;
        Ok(rows)
    }

    /// Forget everything: Jira settings and history.
    pub fn clear_all(&self) -> Result<()> {
        self.conn
            .execute_batch("DELETE FROM jira_config; DELETE FROM update_history;")
            .context("Failed to clear stored data")?;
        Ok(())
    }
}

fn parse_date(s: String) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
