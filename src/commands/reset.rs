use anyhow::Result;
use std::io::{BufRead, Write};

use crate::db::Database;

/// Remove Jira settings and history. Asks twice unless forced.
pub fn run<R: BufRead, W: Write>(
    db: &Database,
    force: bool,
    input: &mut R,
    output: &mut W,
) -> Result<bool> {
    if !force {
        if !super::confirm(
            input,
            output,
            "Clear ALL data including settings and history? This action cannot be undone.",
        )? {
            writeln!(output, "Cancelled.")?;
            return Ok(false);
        }
        if !super::confirm(
            input,
            output,
            "This will remove your Jira settings and update history. Are you absolutely sure?",
        )? {
            writeln!(output, "Cancelled.")?;
            return Ok(false);
        }
    }

    db.clear_all()?;
    writeln!(output, "All data cleared successfully")?;
    Ok(true)
}
