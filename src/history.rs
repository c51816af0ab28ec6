use anyhow::Result;

use crate::db::Database;
use crate::models::HistoryEntry;

/// Bounded, newest-first log of successfully posted updates.
pub trait HistoryStore {
    fn append(&self, entry: &HistoryEntry) -> Result<()>;
    fn list(&self) -> Result<Vec<HistoryEntry>>;
    fn clear(&self) -> Result<()>;
}

impl HistoryStore for Database {
    fn append(&self, entry: &HistoryEntry) -> Result<()> {
        self.append_history(entry)
    }

    fn list(&self) -> Result<Vec<HistoryEntry>> {
        self.list_history()
    }

    fn clear(&self) -> Result<()> {
        self.clear_history().map(|_| ())
    }
}
