use anyhow::{bail, Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::db::Database;
use crate::jira::JiraApi;
use crate::models::TicketUpdate;
use crate::submit::{SubmitReport, Submitter};

pub fn parse_drafts(json: &str) -> Result<Vec<TicketUpdate>> {
    let drafts: Vec<TicketUpdate> =
        serde_json::from_str(json).context("Draft file must be a JSON array of updates")?;
    Ok(drafts
        .into_iter()
        .map(|d| TicketUpdate::new(&d.ticket_key, d.update.trimmed()))
        .collect())
}

fn save_drafts(path: &Path, drafts: &[TicketUpdate]) -> Result<()> {
    let json = serde_json::to_string_pretty(drafts)?;
    fs::write(path, json)?;
    Ok(())
}

/// Post every draft in `path`. Drafts that went through are rewritten with
/// their notes cleared; failed ones stay as written.
pub fn run<W: Write>(
    db: &Database,
    api: &impl JiraApi,
    date_format: &str,
    path: &Path,
    keep_file: bool,
    output: &mut W,
) -> Result<SubmitReport> {
    let creds = super::require_credentials(db)?;
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read draft file {}", path.display()))?;
    let mut drafts = parse_drafts(&content)?;

    let submitter = Submitter::new(api, db, &creds).with_date_format(date_format);
    let report = submitter.submit_all(&mut drafts);

    // Comments are already posted; report them before touching the file.
    writeln!(output, "{}", report.summary())?;

    if !keep_file && report.succeeded > 0 {
        save_drafts(path, &drafts).with_context(|| {
            format!(
                "Failed to update draft file {}. {} posted drafts still hold their notes; \
                 remove them before running again.",
                path.display(),
                report.succeeded
            )
        })?;
    }

    if !report.is_clean() {
        bail!(
            "{} of {} updates failed",
            report.failures.len(),
            report.attempted
        );
    }
    Ok(report)
}
