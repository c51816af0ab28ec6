#![no_main]

//! Fuzz target for user-supplied text: pasted domains, draft files and the
//! notes that end up in comments. None of these may panic, and multi-byte
//! input must survive truncation and trimming intact.

use arbitrary::Arbitrary;
use chrono::NaiveDate;
use libfuzzer_sys::fuzz_target;

use standup::commands::batch::parse_drafts;
use standup::credentials::normalize_domain;
use standup::models::{Ticket, UpdateRecord};
use standup::submit::{format_comment, DEFAULT_DATE_FORMAT};
use standup::view::{ticket_line, truncate};

#[derive(Arbitrary, Debug)]
struct StandupInput {
    domain: String,
    yesterday: String,
    today: String,
    blockers: String,
    /// Days from 2000-01-01, if a completion date is set
    date_offset: Option<u16>,
    /// Raw contents of a draft file
    drafts: String,
    width: u8,
}

fuzz_target!(|input: StandupInput| {
    let domain = normalize_domain(&input.domain);
    assert!(!domain.contains(".atlassian.net"));

    let date = input.date_offset.and_then(|days| {
        NaiveDate::from_ymd_opt(2000, 1, 1)?.checked_add_days(chrono::Days::new(days as u64))
    });
    let update = UpdateRecord::new(&input.yesterday, &input.today, &input.blockers, date);
    let comment = format_comment(&update, DEFAULT_DATE_FORMAT);
    assert!(comment.starts_with("Daily Standup Update:\n\n"));
    if !update.is_submittable() {
        assert_eq!(comment, "Daily Standup Update:\n\n");
    }

    let _ = truncate(&input.today, input.width as usize);
    let _ = ticket_line(&Ticket {
        key: domain,
        summary: input.blockers.clone(),
        status: input.yesterday.clone(),
        due_date: date,
    });

    if let Ok(drafts) = parse_drafts(&input.drafts) {
        for draft in drafts {
            let _ = format_comment(&draft.update, DEFAULT_DATE_FORMAT);
        }
    }
});
