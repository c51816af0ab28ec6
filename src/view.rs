use crate::jira::JiraError;
use crate::models::{Credentials, Ticket};

/// What the session is currently showing. Each load step produces a fresh
/// value instead of toggling flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Configure,
    Loading,
    Error(String),
    Main(Vec<Ticket>),
}

impl ViewState {
    /// After reading stored settings: either ask for configuration or start
    /// loading tickets.
    pub fn after_config_load(creds: Option<&Credentials>) -> Self {
        match creds {
            Some(c) if c.is_complete() => ViewState::Loading,
            _ => ViewState::Configure,
        }
    }

    pub fn after_ticket_load(result: Result<Vec<Ticket>, JiraError>) -> Self {
        match result {
            Ok(tickets) => ViewState::Main(tickets),
            Err(JiraError::MissingCredentials) => ViewState::Configure,
            Err(e) => ViewState::Error(format!("Failed to load tickets: {}", e)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCategory {
    Todo,
    InProgress,
    InReview,
    Done,
}

impl StatusCategory {
    /// Jira workflows name statuses freely; bucket them by keyword.
    pub fn from_status(status: &str) -> Self {
        let lower = status.to_lowercase();

        if contains_any(&lower, &["todo", "to do", "open"]) {
            StatusCategory::Todo
        } else if contains_any(&lower, &["progress", "development"]) {
            StatusCategory::InProgress
        } else if contains_any(&lower, &["review", "testing"]) {
            StatusCategory::InReview
        } else if contains_any(&lower, &["done", "closed"]) {
            StatusCategory::Done
        } else {
            StatusCategory::Todo
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusCategory::Todo => "todo",
            StatusCategory::InProgress => "in-progress",
            StatusCategory::InReview => "in-review",
            StatusCategory::Done => "done",
        }
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// One-line summary of a ticket for lists and prompts.
pub fn ticket_line(ticket: &Ticket) -> String {
    let due = ticket
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{:<12} {:13} {:<50} due {}",
        ticket.key,
        format!("[{}]", StatusCategory::from_status(&ticket.status).label()),
        truncate(&ticket.summary, 50),
        due
    )
}
