use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::db::Database;

pub const STANDUP_DIR: &str = ".standup";
pub const DB_FILE: &str = "standup.db";

pub fn run(path: &Path) -> Result<()> {
    let standup_dir = path.join(STANDUP_DIR);

    if standup_dir.exists() {
        println!("Already initialized at {}", path.display());
        return Ok(());
    }

    fs::create_dir_all(&standup_dir).context("Failed to create .standup directory")?;
    Database::open(&standup_dir.join(DB_FILE))?;
    println!("Created {}", standup_dir.display());
    println!("Next: run 'standup config set' to connect to Jira.");

    Ok(())
}
