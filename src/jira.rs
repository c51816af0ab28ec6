//! Minimal Jira Cloud REST v3 client: who-am-I, assigned ticket search and
//! comment creation. Every call is a single authenticated attempt.

use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::{Credentials, Ticket, UserIdentity};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_ASSIGNEE: &str = "currentUser()";
pub const MAX_RESULTS: u32 = 50;

const SEARCH_FIELDS: [&str; 5] = ["summary", "status", "assignee", "updated", "duedate"];

#[derive(Debug, Error)]
pub enum JiraError {
    #[error("Jira is not configured: domain, email and API token are all required")]
    MissingCredentials,

    #[error("{message}")]
    Remote { status: u16, message: String },

    #[error("Network error. Check your domain name and internet connection. ({0})")]
    Network(String),

    #[error("'{0}' is not a Jira ticket key")]
    InvalidTicketKey(String),
}

/// The three remote operations the rest of the crate depends on.
pub trait JiraApi {
    fn test_connection(&self, creds: &Credentials) -> Result<UserIdentity, JiraError>;
    fn search_assigned_tickets(&self, creds: &Credentials) -> Result<Vec<Ticket>, JiraError>;
    fn post_comment(&self, creds: &Credentials, ticket_key: &str, text: &str)
        -> Result<(), JiraError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub assignee: String,
}

impl Default for SearchQuery {
    fn default() -> Self {
        SearchQuery {
            assignee: DEFAULT_ASSIGNEE.to_string(),
        }
    }
}

impl SearchQuery {
    pub fn jql(&self) -> String {
        format!(
            "assignee = {} AND status NOT IN (\"Ready to release\",Released,Closed) AND Sprint in openSprints() AND resolution = Unresolved order by priority DESC,updated DESC",
            self.assignee
        )
    }
}

// Wire types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchRequest<'a> {
    jql: String,
    fields: &'a [&'a str],
    max_results: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    issues: Option<Vec<Issue>>,
}

#[derive(Deserialize)]
struct Issue {
    key: String,
    #[serde(default)]
    fields: IssueFields,
}

#[derive(Deserialize, Default)]
struct IssueFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    status: Option<IssueStatus>,
    #[serde(default)]
    duedate: Option<String>,
}

#[derive(Deserialize)]
struct IssueStatus {
    name: String,
}

impl From<Issue> for Ticket {
    fn from(issue: Issue) -> Self {
        Ticket {
            key: issue.key,
            summary: issue.fields.summary.unwrap_or_default(),
            status: issue.fields.status.map(|s| s.name).unwrap_or_default(),
            due_date: issue
                .fields
                .duedate
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
        }
    }
}

/// Atlassian Document Format body holding one plain-text paragraph.
pub fn comment_document(text: &str) -> Value {
    serde_json::json!({
        "body": {
            "type": "doc",
            "version": 1,
            "content": [{
                "type": "paragraph",
                "content": [{ "type": "text", "text": text }]
            }]
        }
    })
}

/// Pull the most useful message out of a Jira error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    if let Some(first) = value
        .get("errorMessages")
        .and_then(Value::as_array)
        .and_then(|msgs| msgs.iter().find_map(Value::as_str))
    {
        return Some(first.to_string());
    }
    value
        .get("errors")
        .and_then(Value::as_object)
        .and_then(|errs| errs.values().find_map(Value::as_str))
        .map(str::to_string)
}

/// Keys go into the URL path as one segment, so only the characters Jira
/// uses in project keys and issue numbers are allowed.
fn is_ticket_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn status_line(status: StatusCode) -> String {
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

pub struct JiraClient {
    http: Client,
    base_url: Option<String>,
    query: SearchQuery,
}

impl JiraClient {
    pub fn new(timeout: Duration, query: SearchQuery) -> Result<Self, JiraError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("standup/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JiraError::Network(e.to_string()))?;
        Ok(JiraClient {
            http,
            base_url: None,
            query,
        })
    }

    /// Send every request to `base_url` instead of the site derived from the
    /// credentials' domain.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.trim_end_matches('/').to_string());
        self
    }

    fn url(&self, creds: &Credentials, path: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}{}", base, path),
            None => format!("{}{}", creds.base_url(), path),
        }
    }

    fn authed(&self, builder: RequestBuilder, creds: &Credentials) -> RequestBuilder {
        builder
            .basic_auth(&creds.email, Some(&creds.api_token))
            .header(ACCEPT, "application/json")
    }

    fn send(&self, creds: &Credentials, request: RequestBuilder) -> Result<Response, JiraError> {
        if !creds.is_complete() {
            return Err(JiraError::MissingCredentials);
        }
        request.send().map_err(|e| {
            tracing::warn!(error = %e, "jira request failed before a response arrived");
            JiraError::Network(e.to_string())
        })
    }

    /// Turn a non-2xx response into `JiraError::Remote`.
    fn check(
        response: Response,
        fallback: impl FnOnce(StatusCode) -> String,
    ) -> Result<Response, JiraError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| fallback(status));
        tracing::warn!(status = status.as_u16(), %message, "jira returned an error");
        Err(JiraError::Remote {
            status: status.as_u16(),
            message,
        })
    }

    fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, JiraError> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| JiraError::Network(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| JiraError::Remote {
            status,
            message: format!("Unexpected response from Jira: {}", e),
        })
    }
}

impl JiraApi for JiraClient {
    fn test_connection(&self, creds: &Credentials) -> Result<UserIdentity, JiraError> {
        let url = self.url(creds, "/rest/api/3/myself");
        tracing::debug!(%url, "testing jira connection");
        let request = self.authed(self.http.get(&url), creds);
        let response = Self::check(self.send(creds, request)?, status_line)?;
        Self::decode(response)
    }

    fn search_assigned_tickets(&self, creds: &Credentials) -> Result<Vec<Ticket>, JiraError> {
        let url = self.url(creds, "/rest/api/3/search/jql");
        let body = SearchRequest {
            jql: self.query.jql(),
            fields: &SEARCH_FIELDS,
            max_results: MAX_RESULTS,
        };
        tracing::debug!(%url, jql = %body.jql, "searching assigned tickets");
        let request = self.authed(self.http.post(&url), creds).json(&body);
        let response = Self::check(self.send(creds, request)?, |_| {
            "Failed to fetch tickets".to_string()
        })?;
        let found: SearchResponse = Self::decode(response)?;
        Ok(found
            .issues
            .unwrap_or_default()
            .into_iter()
            .map(Ticket::from)
            .collect())
    }

    fn post_comment(
        &self,
        creds: &Credentials,
        ticket_key: &str,
        text: &str,
    ) -> Result<(), JiraError> {
        if !is_ticket_key(ticket_key) {
            return Err(JiraError::InvalidTicketKey(ticket_key.to_string()));
        }
        let url = self.url(creds, &format!("/rest/api/3/issue/{}/comment", ticket_key));
        tracing::debug!(%url, "posting comment");
        let request = self
            .authed(self.http.post(&url), creds)
            .json(&comment_document(text));
        Self::check(self.send(creds, request)?, |_| {
            "Failed to post comment".to_string()
        })?;
        Ok(())
    }
}
