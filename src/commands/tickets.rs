use anyhow::{bail, Result};
use std::io::{self, Write};

use crate::db::Database;
use crate::jira::JiraApi;
use crate::models::{Credentials, Ticket};
use crate::view::{ticket_line, ViewState};

/// Walk the load sequence: settings, then the assigned-ticket search.
pub fn load(db: &Database, api: &impl JiraApi) -> Result<(ViewState, Option<Credentials>)> {
    let creds = db.get_jira_config()?;
    let state = ViewState::after_config_load(creds.as_ref());

    match (state, creds) {
        (ViewState::Loading, Some(creds)) => {
            let state = ViewState::after_ticket_load(api.search_assigned_tickets(&creds));
            Ok((state, Some(creds)))
        }
        (state, _) => Ok((state, None)),
    }
}

pub fn print_configure_hint<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output, "Jira is not configured.")?;
    writeln!(
        output,
        "Run 'standup config set --domain <site> --email <you@example.com> --api-token <token>'."
    )?;
    Ok(())
}

pub fn print_tickets(tickets: &[Ticket], creds: &Credentials) {
    if tickets.is_empty() {
        println!("No assigned tickets found.");
        return;
    }

    for ticket in tickets {
        println!("{}", ticket_line(ticket));
        println!("             {}", creds.browse_url(&ticket.key));
    }
}

pub fn run(db: &Database, api: &impl JiraApi) -> Result<()> {
    match load(db, api)? {
        (ViewState::Main(tickets), Some(creds)) => {
            print_tickets(&tickets, &creds);
            Ok(())
        }
        (ViewState::Error(message), _) => bail!(message),
        _ => print_configure_hint(&mut io::stdout()),
    }
}
