use anyhow::{bail, Result};

use crate::credentials::{mask_token, prepare};
use crate::db::Database;
use crate::jira::{JiraApi, JiraError};

pub fn set(db: &Database, domain: &str, email: &str, api_token: &str) -> Result<()> {
    let creds = prepare(domain, email, api_token)?;
    db.set_jira_config(&creds)?;
    println!("Settings saved successfully!");
    println!("Jira site: {}", creds.base_url());
    Ok(())
}

pub fn show(db: &Database) -> Result<()> {
    match db.get_jira_config()? {
        Some(creds) => {
            println!("Domain:    {}", creds.domain);
            println!("Site:      {}", creds.base_url());
            println!("Email:     {}", creds.email);
            println!("API token: {}", mask_token(&creds.api_token));
        }
        None => println!("Jira is not configured. Run 'standup config set'."),
    }
    Ok(())
}

pub fn test_connection(db: &Database, api: &impl JiraApi) -> Result<()> {
    let creds = super::require_credentials(db)?;

    match api.test_connection(&creds) {
        Ok(user) => {
            println!("Connection successful! Welcome, {}", user.display_name);
            Ok(())
        }
        Err(e @ JiraError::Network(_)) => bail!("{}", e),
        Err(e) => bail!("Connection failed: {}", e),
    }
}
