use anyhow::{bail, Result};
use chrono::NaiveDate;

use crate::db::Database;
use crate::jira::JiraApi;
use crate::models::UpdateRecord;
use crate::submit::{SubmissionError, Submitter};

pub fn run(
    db: &Database,
    api: &impl JiraApi,
    date_format: &str,
    ticket_key: &str,
    update: &UpdateRecord,
) -> Result<()> {
    let ticket_key = ticket_key.trim();
    if ticket_key.is_empty() {
        bail!("Please enter a ticket number");
    }
    let creds = super::require_credentials(db)?;

    let submitter = Submitter::new(api, db, &creds).with_date_format(date_format);
    match submitter.submit_one(ticket_key, update) {
        Ok(_) => {
            println!("Update posted successfully!");
            Ok(())
        }
        Err(e @ SubmissionError::Validation) => bail!("{}", e),
        Err(e) => bail!("Failed to submit update: {}", e),
    }
}

/// Parse a `YYYY-MM-DD` date given on the command line.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD", s))
}
