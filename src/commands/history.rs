use anyhow::Result;
use chrono::Local;
use std::io::{self, Write};

use crate::history::HistoryStore;
use crate::models::HistoryEntry;

pub fn list(store: &impl HistoryStore, date_format: &str, json: bool) -> Result<()> {
    let entries = store.list()?;

    if json {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        println!("No update history found.");
        return Ok(());
    }

    for entry in &entries {
        print!("{}", render_entry(entry, date_format));
        println!();
    }
    Ok(())
}

pub fn render_entry(entry: &HistoryEntry, date_format: &str) -> String {
    let mut out = format!(
        "{}  {}\n",
        entry.ticket_key,
        entry
            .timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    let u = &entry.updates;
    if !u.yesterday.is_empty() {
        out.push_str(&format!("  Yesterday: {}\n", u.yesterday));
    }
    if !u.today.is_empty() {
        out.push_str(&format!("  Today: {}\n", u.today));
    }
    if !u.blockers.is_empty() {
        out.push_str(&format!("  Blockers: {}\n", u.blockers));
    }
    if let Some(date) = u.completion_date {
        out.push_str(&format!("  Completion Date: {}\n", date.format(date_format)));
    }
    out
}

pub fn clear(store: &impl HistoryStore, force: bool) -> Result<()> {
    if !force
        && !super::confirm_stdin(
            "Clear your update history? This action cannot be undone.",
        )?
    {
        println!("Cancelled.");
        return Ok(());
    }

    store.clear()?;
    println!("Update history cleared successfully");
    Ok(())
}
