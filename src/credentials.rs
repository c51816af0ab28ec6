//! Cleanup and checks applied to Jira settings before they are stored.

use anyhow::{anyhow, bail, Result};
use regex::Regex;
use std::sync::OnceLock;

use crate::models::Credentials;

const CLOUD_SUFFIX: &str = ".atlassian.net";
const EMAIL_PATTERN: &str = r"^[^\s@]+@[^\s@]+\.[^\s@]+$";

fn email_pattern() -> Result<&'static Regex> {
    static PATTERN: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(EMAIL_PATTERN))
        .as_ref()
        .map_err(|e| anyhow!("Email pattern failed to compile: {}", e))
}

/// Reduce whatever the user pasted to the bare site name:
/// `https://acme.atlassian.net/jira` becomes `acme`.
pub fn normalize_domain(input: &str) -> String {
    let trimmed = input.trim();
    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);

    match without_scheme.find(CLOUD_SUFFIX) {
        Some(idx) => without_scheme[..idx].to_string(),
        None => without_scheme.to_string(),
    }
}

pub fn is_valid_email(email: &str) -> Result<bool> {
    Ok(email_pattern()?.is_match(email))
}

/// Build storable credentials from raw input, rejecting missing fields and
/// malformed email addresses.
pub fn prepare(domain: &str, email: &str, api_token: &str) -> Result<Credentials> {
    let domain = domain.trim();
    let email = email.trim();
    let api_token = api_token.trim();

    if domain.is_empty() || email.is_empty() || api_token.is_empty() {
        bail!("Please fill in all required fields (domain, email, API token)");
    }

    if !is_valid_email(email)? {
        bail!("Please enter a valid email address");
    }

    let site = normalize_domain(domain);
    if site.is_empty() {
        bail!("Domain '{}' does not name a Jira site", domain);
    }

    Ok(Credentials {
        domain: site,
        email: email.to_string(),
        api_token: api_token.to_string(),
    })
}

/// Show enough of a token to recognise it without leaking it.
pub fn mask_token(token: &str) -> String {
    let count = token.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = token.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), tail)
}
