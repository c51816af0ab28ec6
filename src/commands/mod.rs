pub mod batch;
pub mod config;
pub mod history;
pub mod init;
pub mod post;
pub mod reset;
pub mod run;
pub mod tickets;

use anyhow::{bail, Result};
use std::io::{self, BufRead, Write};

use crate::db::Database;
use crate::models::Credentials;

/// Stored credentials, or an error pointing the user at `config set`.
pub fn require_credentials(db: &Database) -> Result<Credentials> {
    match db.get_jira_config()? {
        Some(creds) if creds.is_complete() => Ok(creds),
        _ => bail!("Jira is not configured. Run 'standup config set' first."),
    }
}

/// Ask a yes/no question; anything but `y` counts as no.
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<bool> {
    write!(output, "{} [y/N] ", question)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

pub fn confirm_stdin(question: &str) -> Result<bool> {
    confirm(&mut io::stdin().lock(), &mut io::stdout(), question)
}
