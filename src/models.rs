use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Jira Cloud connection parameters. `domain` is the bare site name, e.g.
/// `acme` for `acme.atlassian.net`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub domain: String,
    pub email: String,
    pub api_token: String,
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        !self.domain.is_empty() && !self.email.is_empty() && !self.api_token.is_empty()
    }

    pub fn base_url(&self) -> String {
        format!("https://{}.atlassian.net", self.domain)
    }

    pub fn browse_url(&self, ticket_key: &str) -> String {
        format!("{}/browse/{}", self.base_url(), ticket_key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub key: String,
    pub summary: String,
    pub status: String,
    pub due_date: Option<NaiveDate>,
}

/// One standup note for a single ticket, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRecord {
    #[serde(default)]
    pub yesterday: String,
    #[serde(default)]
    pub today: String,
    #[serde(default)]
    pub blockers: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDate>,
}

impl UpdateRecord {
    pub fn new(
        yesterday: &str,
        today: &str,
        blockers: &str,
        completion_date: Option<NaiveDate>,
    ) -> Self {
        UpdateRecord {
            yesterday: yesterday.trim().to_string(),
            today: today.trim().to_string(),
            blockers: blockers.trim().to_string(),
            completion_date,
        }
    }

    pub fn trimmed(&self) -> Self {
        UpdateRecord::new(
            &self.yesterday,
            &self.today,
            &self.blockers,
            self.completion_date,
        )
    }

    /// At least one field has content worth posting.
    pub fn is_submittable(&self) -> bool {
        !self.yesterday.is_empty()
            || !self.today.is_empty()
            || !self.blockers.is_empty()
            || self.completion_date.is_some()
    }

    /// The form as it should look after a successful post. The completion
    /// date survives because it is usually a planned date, not a one-off note.
    pub fn cleared(&self) -> Self {
        UpdateRecord {
            completion_date: self.completion_date,
            ..UpdateRecord::default()
        }
    }
}

/// A draft update bound to the ticket it is meant for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketUpdate {
    #[serde(default)]
    pub ticket_key: String,
    #[serde(flatten)]
    pub update: UpdateRecord,
}

impl TicketUpdate {
    pub fn new(ticket_key: &str, update: UpdateRecord) -> Self {
        TicketUpdate {
            ticket_key: ticket_key.trim().to_string(),
            update,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub ticket_key: String,
    pub updates: UpdateRecord,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub display_name: String,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}
