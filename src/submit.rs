//! Standup submission: validate a draft, turn it into a Jira comment, post
//! it, then record it locally.
//!
//! Batches run strictly in the order given. A failure on one ticket never
//! stops the tickets after it; failures are collected and reported together.

use anyhow::{bail, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::Utc;
use thiserror::Error;

use crate::history::HistoryStore;
use crate::jira::{JiraApi, JiraError};
use crate::models::{Credentials, HistoryEntry, TicketUpdate, UpdateRecord};

pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Please fill in at least one field before submitting.")]
    Validation,

    #[error(transparent)]
    Jira(#[from] JiraError),
}

/// Result of one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub entry: HistoryEntry,
    /// What the draft should be reset to.
    pub form: UpdateRecord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitFailure {
    pub ticket_key: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitReport {
    pub succeeded: usize,
    pub attempted: usize,
    pub failures: Vec<SubmitFailure>,
}

impl SubmitReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        if self.attempted == 0 {
            return "No updates to submit. Please fill in at least one field for any ticket."
                .to_string();
        }
        if self.succeeded == self.attempted {
            return format!("All {} updates submitted successfully!", self.succeeded);
        }

        let mut text = format!(
            "{} of {} updates submitted successfully.",
            self.succeeded, self.attempted
        );
        if !self.failures.is_empty() {
            text.push_str("\n\nErrors:");
            for failure in &self.failures {
                text.push_str(&format!("\n{}: {}", failure.ticket_key, failure.message));
            }
        }
        text
    }
}

/// Reject strftime patterns chrono cannot render; formatting a date with one
/// would otherwise fail at the point of posting.
pub fn check_date_format(pattern: &str) -> Result<()> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        bail!("Invalid date format '{}'. Use strftime specifiers such as %m/%d/%Y.", pattern);
    }
    Ok(())
}

/// Render the comment body. Only non-empty fields get a line, always in the
/// order Yesterday, Today, Blockers, Completion Date.
pub fn format_comment(update: &UpdateRecord, date_format: &str) -> String {
    let mut comment = String::from("Daily Standup Update:\n\n");

    if !update.yesterday.is_empty() {
        comment.push_str(&format!("Yesterday: {}\n", update.yesterday));
    }
    if !update.today.is_empty() {
        comment.push_str(&format!("Today: {}\n", update.today));
    }
    if !update.blockers.is_empty() {
        comment.push_str(&format!("Blockers: {}\n", update.blockers));
    }
    if let Some(date) = update.completion_date {
        comment.push_str(&format!("Completion Date: {}\n", date.format(date_format)));
    }

    comment
}

pub struct Submitter<'a, J: JiraApi, H: HistoryStore> {
    api: &'a J,
    history: &'a H,
    creds: &'a Credentials,
    date_format: String,
}

impl<'a, J: JiraApi, H: HistoryStore> Submitter<'a, J, H> {
    pub fn new(api: &'a J, history: &'a H, creds: &'a Credentials) -> Self {
        Submitter {
            api,
            history,
            creds,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }

    pub fn with_date_format(mut self, date_format: &str) -> Self {
        self.date_format = date_format.to_string();
        self
    }

    pub fn submit_one(
        &self,
        ticket_key: &str,
        update: &UpdateRecord,
    ) -> Result<Submitted, SubmissionError> {
        if !update.is_submittable() {
            return Err(SubmissionError::Validation);
        }

        let comment = format_comment(update, &self.date_format);
        self.api.post_comment(self.creds, ticket_key, &comment)?;
        tracing::info!(ticket = ticket_key, "posted standup update");

        let entry = HistoryEntry {
            ticket_key: ticket_key.to_string(),
            updates: update.clone(),
            timestamp: Utc::now(),
        };
        // History is best-effort; the comment is already on the ticket.
        if let Err(e) = self.history.append(&entry) {
            tracing::warn!(ticket = ticket_key, error = %e, "could not save update history");
        }

        Ok(Submitted {
            entry,
            form: update.cleared(),
        })
    }

    /// Submit every eligible draft in order. Successful drafts are reset in
    /// place; failed ones are left as they were so they can be retried.
    pub fn submit_all(&self, drafts: &mut [TicketUpdate]) -> SubmitReport {
        let mut report = SubmitReport::default();

        for draft in drafts.iter_mut() {
            if draft.ticket_key.is_empty() || !draft.update.is_submittable() {
                continue;
            }

            report.attempted += 1;
            match self.submit_one(&draft.ticket_key, &draft.update) {
                Ok(submitted) => {
                    draft.update = submitted.form;
                    report.succeeded += 1;
                }
                Err(e) => {
                    tracing::warn!(ticket = %draft.ticket_key, error = %e, "update failed");
                    report.failures.push(SubmitFailure {
                        ticket_key: draft.ticket_key.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::jira::{JiraClient, SearchQuery};
    use crate::models::{Ticket, UserIdentity};
    use anyhow::bail;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Records every comment and fails for the configured ticket keys.
    #[derive(Default)]
    struct FakeJira {
        posted: RefCell<Vec<(String, String)>>,
        failing: HashSet<String>,
    }

    impl FakeJira {
        fn failing_on(keys: &[&str]) -> Self {
            FakeJira {
                failing: keys.iter().map(|k| k.to_string()).collect(),
                ..FakeJira::default()
            }
        }

        fn posted_keys(&self) -> Vec<String> {
            self.posted.borrow().iter().map(|(k, _)| k.clone()).collect()
        }
    }

    impl JiraApi for FakeJira {
        fn test_connection(&self, _creds: &Credentials) -> Result<UserIdentity, JiraError> {
            unreachable!("not used by the submitter")
        }

        fn search_assigned_tickets(&self, _creds: &Credentials) -> Result<Vec<Ticket>, JiraError> {
            unreachable!("not used by the submitter")
        }

        fn post_comment(
            &self,
            _creds: &Credentials,
            ticket_key: &str,
            text: &str,
        ) -> Result<(), JiraError> {
            self.posted
                .borrow_mut()
                .push((ticket_key.to_string(), text.to_string()));
            if self.failing.contains(ticket_key) {
                return Err(JiraError::Remote {
                    status: 404,
                    message: "Issue does not exist or you do not have permission to see it."
                        .to_string(),
                });
            }
            Ok(())
        }
    }

    struct BrokenHistory;

    impl HistoryStore for BrokenHistory {
        fn append(&self, _entry: &HistoryEntry) -> anyhow::Result<()> {
            bail!("disk full")
        }
        fn list(&self) -> anyhow::Result<Vec<HistoryEntry>> {
            bail!("disk full")
        }
        fn clear(&self) -> anyhow::Result<()> {
            bail!("disk full")
        }
    }

    fn setup_test_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();
        (db, dir)
    }

    fn creds() -> Credentials {
        Credentials {
            domain: "acme".to_string(),
            email: "a@b.com".to_string(),
            api_token: "tok".to_string(),
        }
    }

    fn note(today: &str) -> UpdateRecord {
        UpdateRecord::new("", today, "", None)
    }

    // ==================== Formatting ====================

    #[test]
    fn test_format_all_fields() {
        let update = UpdateRecord::new(
            "fixed login",
            "write docs",
            "waiting on QA",
            NaiveDate::from_ymd_opt(2026, 10, 20),
        );
        assert_eq!(
            format_comment(&update, DEFAULT_DATE_FORMAT),
            "Daily Standup Update:\n\nYesterday: fixed login\nToday: write docs\nBlockers: waiting on QA\nCompletion Date: 10/20/2026\n"
        );
    }

    #[test]
    fn test_format_omits_empty_fields() {
        let update = UpdateRecord::new("", "pairing", "", None);
        assert_eq!(
            format_comment(&update, DEFAULT_DATE_FORMAT),
            "Daily Standup Update:\n\nToday: pairing\n"
        );
    }

    #[test]
    fn test_format_custom_date_format() {
        let update = UpdateRecord::new("", "", "", NaiveDate::from_ymd_opt(2026, 10, 20));
        assert!(format_comment(&update, "%d.%m.%Y").ends_with("Completion Date: 20.10.2026\n"));
    }

    #[test]
    fn test_check_date_format() {
        assert!(check_date_format(DEFAULT_DATE_FORMAT).is_ok());
        assert!(check_date_format("%d.%m.%Y").is_ok());
        assert!(check_date_format("%B %e, %Y").is_ok());

        let err = check_date_format("%Q").unwrap_err();
        assert!(err.to_string().contains("Invalid date format '%Q'"));
        assert!(check_date_format("%m/%d/%").is_err());
    }

    // ==================== submit_one ====================

    #[test]
    fn test_empty_update_is_rejected_without_network() {
        let (db, _dir) = setup_test_db();
        let api = FakeJira::default();
        let creds = creds();
        let submitter = Submitter::new(&api, &db, &creds);

        let result = submitter.submit_one("ABC-1", &UpdateRecord::default());
        assert!(matches!(result, Err(SubmissionError::Validation)));
        assert!(api.posted.borrow().is_empty());
        assert!(db.list_history().unwrap().is_empty());
    }

    #[test]
    fn test_success_records_history_and_clears_form() {
        let (db, _dir) = setup_test_db();
        let api = FakeJira::default();
        let creds = creds();
        let submitter = Submitter::new(&api, &db, &creds);
        let date = NaiveDate::from_ymd_opt(2026, 10, 20);
        let update = UpdateRecord::new("a", "b", "c", date);

        let submitted = submitter.submit_one("ABC-1", &update).unwrap();
        assert_eq!(submitted.entry.ticket_key, "ABC-1");
        assert_eq!(submitted.entry.updates, update);
        assert_eq!(submitted.form, UpdateRecord::new("", "", "", date));

        let history = db.list_history().unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].ticket_key, "ABC-1");
    }

    #[test]
    fn test_remote_failure_leaves_no_history() {
        let (db, _dir) = setup_test_db();
        let api = FakeJira::failing_on(&["ABC-404"]);
        let creds = creds();
        let submitter = Submitter::new(&api, &db, &creds);

        let result = submitter.submit_one("ABC-404", &note("x"));
        match result {
            Err(SubmissionError::Jira(JiraError::Remote { status, .. })) => assert_eq!(status, 404),
            other => panic!("expected remote failure, got {:?}", other),
        }
        assert!(db.list_history().unwrap().is_empty());
    }

    #[test]
    fn test_history_failure_does_not_fail_submission() {
        let api = FakeJira::default();
        let creds = creds();
        let submitter = Submitter::new(&api, &BrokenHistory, &creds);

        let result = submitter.submit_one("ABC-1", &note("x"));
        assert!(result.is_ok());
        assert_eq!(api.posted_keys(), vec!["ABC-1"]);
    }

    // ==================== submit_all ====================

    #[test]
    fn test_submit_all_skips_ineligible_drafts() {
        let (db, _dir) = setup_test_db();
        let api = FakeJira::default();
        let creds = creds();
        let submitter = Submitter::new(&api, &db, &creds);
        let mut drafts = vec![
            TicketUpdate::new("ABC-1", note("one")),
            TicketUpdate::new("ABC-2", UpdateRecord::default()),
            TicketUpdate::new("", note("no key")),
            TicketUpdate::new("ABC-3", note("three")),
        ];

        let report = submitter.submit_all(&mut drafts);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 2);
        assert_eq!(api.posted_keys(), vec!["ABC-1", "ABC-3"]);
        assert_eq!(drafts[0].update, UpdateRecord::default());
        assert_eq!(drafts[2].update.today, "no key");
    }

    #[test]
    fn test_submit_all_continues_after_failure() {
        let (db, _dir) = setup_test_db();
        let api = FakeJira::failing_on(&["ABC-2"]);
        let creds = creds();
        let submitter = Submitter::new(&api, &db, &creds);
        let mut drafts = vec![
            TicketUpdate::new("ABC-1", note("one")),
            TicketUpdate::new("ABC-2", note("two")),
            TicketUpdate::new("ABC-3", note("three")),
        ];

        let report = submitter.submit_all(&mut drafts);
        assert_eq!(api.posted_keys(), vec!["ABC-1", "ABC-2", "ABC-3"]);
        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ticket_key, "ABC-2");
        // The failed draft keeps its text for a retry.
        assert_eq!(drafts[1].update.today, "two");
        assert_eq!(drafts[2].update.today, "");

        let keys: Vec<String> = db
            .list_history()
            .unwrap()
            .into_iter()
            .map(|e| e.ticket_key)
            .collect();
        assert_eq!(keys, vec!["ABC-3", "ABC-1"]);
    }

    #[test]
    fn test_summary_texts() {
        let empty = SubmitReport::default();
        assert!(empty.summary().starts_with("No updates to submit."));

        let clean = SubmitReport {
            succeeded: 3,
            attempted: 3,
            failures: vec![],
        };
        assert_eq!(clean.summary(), "All 3 updates submitted successfully!");

        let partial = SubmitReport {
            succeeded: 1,
            attempted: 2,
            failures: vec![SubmitFailure {
                ticket_key: "ABC-2".to_string(),
                message: "boom".to_string(),
            }],
        };
        assert_eq!(
            partial.summary(),
            "1 of 2 updates submitted successfully.\n\nErrors:\nABC-2: boom"
        );
    }

    // ==================== Over HTTP ====================

    #[test]
    fn test_post_over_http_records_history() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/rest/api/3/issue/ABC-1/comment")
            .match_header("authorization", "Basic YUBiLmNvbTp0b2s=")
            .with_status(201)
            .with_body(r#"{"id":"10001"}"#)
            .create();
        let client = JiraClient::new(Duration::from_secs(5), SearchQuery::default())
            .unwrap()
            .with_base_url(&server.url());
        let (db, _dir) = setup_test_db();
        let creds = creds();

        let submitted = Submitter::new(&client, &db, &creds)
            .submit_one("ABC-1", &note("hi"))
            .unwrap();
        mock.assert();
        assert_eq!(submitted.entry.ticket_key, "ABC-1");
        assert_eq!(db.list_history().unwrap()[0].ticket_key, "ABC-1");
    }

    // ==================== Property-Based Tests ====================

    fn field() -> impl Strategy<Value = String> {
        prop_oneof![Just(String::new()), "[a-zA-Z0-9][a-zA-Z0-9 ]{0,20}"]
    }

    proptest! {
        #[test]
        fn prop_comment_lines_follow_fields(
            yesterday in field(),
            today in field(),
            blockers in field(),
            with_date in any::<bool>()
        ) {
            let date = with_date.then(|| NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
            let update = UpdateRecord::new(&yesterday, &today, &blockers, date);
            prop_assume!(update.is_submittable());

            let comment = format_comment(&update, DEFAULT_DATE_FORMAT);
            let lines: Vec<&str> = comment.lines().skip(2).collect();

            let mut expected = Vec::new();
            if !update.yesterday.is_empty() { expected.push(format!("Yesterday: {}", update.yesterday)); }
            if !update.today.is_empty() { expected.push(format!("Today: {}", update.today)); }
            if !update.blockers.is_empty() { expected.push(format!("Blockers: {}", update.blockers)); }
            if with_date { expected.push("Completion Date: 01/02/2026".to_string()); }

            prop_assert_eq!(lines, expected.iter().map(String::as_str).collect::<Vec<_>>());
        }

        #[test]
        fn prop_batch_tally_is_consistent(
            plan in proptest::collection::vec((any::<bool>(), any::<bool>()), 0..12)
        ) {
            // (eligible, fails_remotely) per draft
            let (db, _dir) = setup_test_db();
            let failing: Vec<String> = plan
                .iter()
                .enumerate()
                .filter(|(_, (_, fails))| *fails)
                .map(|(i, _)| format!("T-{}", i))
                .collect();
            let failing_refs: Vec<&str> = failing.iter().map(String::as_str).collect();
            let api = FakeJira::failing_on(&failing_refs);
            let creds = creds();
            let submitter = Submitter::new(&api, &db, &creds);

            let mut drafts: Vec<TicketUpdate> = plan
                .iter()
                .enumerate()
                .map(|(i, (eligible, _))| {
                    let update = if *eligible { note("work") } else { UpdateRecord::default() };
                    TicketUpdate::new(&format!("T-{}", i), update)
                })
                .collect();

            let report = submitter.submit_all(&mut drafts);
            let eligible = plan.iter().filter(|(e, _)| *e).count();
            prop_assert_eq!(report.attempted, eligible);
            prop_assert_eq!(report.succeeded + report.failures.len(), report.attempted);
            prop_assert_eq!(api.posted.borrow().len(), eligible);
        }
    }
}
