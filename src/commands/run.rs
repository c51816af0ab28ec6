use anyhow::{bail, Result};
use chrono::NaiveDate;
use std::io::{BufRead, Write};

use crate::db::Database;
use crate::jira::JiraApi;
use crate::models::{Credentials, Ticket, TicketUpdate, UpdateRecord};
use crate::submit::Submitter;
use crate::view::{ticket_line, ViewState};

use super::post::parse_date;
use super::tickets::{load, print_configure_hint};

/// Read one line; `None` once input is exhausted.
fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
) -> Result<Option<String>> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn ask_date<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    default: Option<NaiveDate>,
) -> Result<Option<NaiveDate>> {
    let prompt = match default {
        Some(d) => format!("  Completion Date [{}] ('-' to clear): ", d.format("%Y-%m-%d")),
        None => "  Completion Date (YYYY-MM-DD): ".to_string(),
    };

    loop {
        let answer = match ask(input, output, &prompt)? {
            Some(a) => a,
            None => return Ok(default),
        };
        if answer.is_empty() {
            return Ok(default);
        }
        if answer == "-" {
            return Ok(None);
        }
        match parse_date(&answer) {
            Ok(date) => return Ok(Some(date)),
            Err(e) => writeln!(output, "  {}", e)?,
        }
    }
}

fn ask_update<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    due_date: Option<NaiveDate>,
) -> Result<UpdateRecord> {
    let yesterday = ask(input, output, "  Yesterday: ")?.unwrap_or_default();
    let today = ask(input, output, "  Today: ")?.unwrap_or_default();
    let blockers = ask(input, output, "  Blockers: ")?.unwrap_or_default();
    let completion_date = ask_date(input, output, due_date)?;
    Ok(UpdateRecord::new(&yesterday, &today, &blockers, completion_date))
}

/// Prompt for a note on each assigned ticket, then for any extra tickets
/// the user wants to report on.
pub fn collect_drafts<R: BufRead, W: Write>(
    tickets: &[Ticket],
    creds: &Credentials,
    input: &mut R,
    output: &mut W,
) -> Result<Vec<TicketUpdate>> {
    let mut drafts = Vec::new();

    if tickets.is_empty() {
        writeln!(output, "No assigned tickets found.")?;
    }
    for ticket in tickets {
        writeln!(output, "\n{}", ticket_line(ticket))?;
        writeln!(output, "  {}", creds.browse_url(&ticket.key))?;
        let update = ask_update(input, output, ticket.due_date)?;
        drafts.push(TicketUpdate::new(&ticket.key, update));
    }

    loop {
        let key = match ask(input, output, "\nAdd another ticket key (blank to finish): ")? {
            Some(k) if !k.is_empty() => k,
            _ => break,
        };
        writeln!(output, "  {}", creds.browse_url(&key))?;
        let update = ask_update(input, output, None)?;
        drafts.push(TicketUpdate::new(&key, update));
    }

    Ok(drafts)
}

pub fn run<R: BufRead, W: Write>(
    db: &Database,
    api: &impl JiraApi,
    date_format: &str,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    writeln!(output, "Loading assigned tickets...")?;
    let (tickets, creds) = match load(db, api)? {
        (ViewState::Main(tickets), Some(creds)) => (tickets, creds),
        (ViewState::Error(message), _) => bail!(message),
        _ => {
            print_configure_hint(output)?;
            return Ok(());
        }
    };

    let mut drafts = collect_drafts(&tickets, &creds, input, output)?;

    let submitter = Submitter::new(api, db, &creds).with_date_format(date_format);
    let report = submitter.submit_all(&mut drafts);
    writeln!(output, "\n{}", report.summary())?;

    if !report.is_clean() {
        bail!(
            "{} of {} updates failed",
            report.failures.len(),
            report.attempted
        );
    }
    Ok(())
}
