//! Post daily standup notes to assigned Jira tickets and keep a short local
//! history of what was sent.

pub mod commands;
pub mod credentials;
pub mod db;
pub mod history;
pub mod jira;
pub mod models;
pub mod submit;
pub mod view;
