use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use standup::commands;
use standup::commands::init::{DB_FILE, STANDUP_DIR};
use standup::db::Database;
use standup::jira::{JiraClient, SearchQuery, DEFAULT_ASSIGNEE};
use standup::models::UpdateRecord;
use standup::submit::{check_date_format, DEFAULT_DATE_FORMAT};

#[derive(Parser)]
#[command(name = "standup")]
#[command(about = "Post daily standup updates to your assigned Jira tickets")]
#[command(version)]
struct Cli {
    /// Directory holding standup.db (defaults to the nearest .standup/)
    #[arg(long, global = true, env = "STANDUP_DIR")]
    dir: Option<PathBuf>,

    /// HTTP timeout for each Jira request, in seconds
    #[arg(long, global = true, env = "STANDUP_TIMEOUT", default_value_t = 30)]
    timeout: u64,

    /// strftime pattern for the Completion Date line
    #[arg(long, global = true, env = "STANDUP_DATE_FORMAT", default_value = DEFAULT_DATE_FORMAT)]
    date_format: String,

    /// JQL value for the assignee clause of the ticket search
    #[arg(long, global = true, env = "STANDUP_ASSIGNEE", default_value = DEFAULT_ASSIGNEE)]
    assignee: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize standup storage in the current directory
    Init,

    /// Jira connection settings
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// List tickets assigned to you in open sprints
    Tickets,

    /// Post an update to a single ticket
    Post {
        /// Ticket key, e.g. ABC-123
        ticket: String,
        /// What you did yesterday
        #[arg(short, long, default_value = "")]
        yesterday: String,
        /// What you plan to do today
        #[arg(short, long, default_value = "")]
        today: String,
        /// Anything blocking you
        #[arg(short, long, default_value = "")]
        blockers: String,
        /// Planned completion date (YYYY-MM-DD)
        #[arg(short = 'd', long, value_parser = commands::post::parse_date)]
        completion_date: Option<NaiveDate>,
    },

    /// Post every update in a JSON draft file
    Batch {
        /// JSON array of {ticketKey, yesterday, today, blockers, completionDate}
        file: PathBuf,
        /// Leave the draft file untouched after posting
        #[arg(long)]
        keep: bool,
    },

    /// Walk through your assigned tickets and post updates interactively
    Run,

    /// Show or clear the local update history
    History {
        #[command(subcommand)]
        action: Option<HistoryCommands>,
    },

    /// Remove all stored settings and history
    Reset {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Save Jira domain, email and API token
    Set {
        /// Jira site, e.g. acme or https://acme.atlassian.net
        #[arg(long, env = "JIRA_DOMAIN")]
        domain: String,
        /// Account email
        #[arg(long, env = "JIRA_EMAIL")]
        email: String,
        /// API token from id.atlassian.com
        #[arg(long, env = "JIRA_API_TOKEN", hide_env_values = true)]
        api_token: String,
    },
    /// Show the saved settings
    Show,
    /// Check the saved settings against Jira
    Test,
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// List past updates, newest first
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all history entries
    Clear {
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::WARN.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn find_standup_dir(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let candidate = current.join(STANDUP_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }

        if !current.pop() {
            bail!("Not a standup workspace (or any parent). Run 'standup init' first.");
        }
    }
}

fn get_db(dir: Option<&Path>) -> Result<Database> {
    let standup_dir = match dir {
        Some(d) => d.to_path_buf(),
        None => find_standup_dir(&env::current_dir()?)?,
    };
    Database::open(&standup_dir.join(DB_FILE)).context("Failed to open database")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    check_date_format(&cli.date_format)?;

    let client = || -> Result<JiraClient> {
        let query = SearchQuery {
            assignee: cli.assignee.clone(),
        };
        Ok(JiraClient::new(Duration::from_secs(cli.timeout), query)?)
    };
    let dir = cli.dir.as_deref();

    match cli.command {
        Commands::Init => {
            let cwd = env::current_dir()?;
            commands::init::run(&cwd)
        }

        Commands::Config { action } => {
            let db = get_db(dir)?;
            match action {
                ConfigCommands::Set {
                    domain,
                    email,
                    api_token,
                } => commands::config::set(&db, &domain, &email, &api_token),
                ConfigCommands::Show => commands::config::show(&db),
                ConfigCommands::Test => commands::config::test_connection(&db, &client()?),
            }
        }

        Commands::Tickets => {
            let db = get_db(dir)?;
            commands::tickets::run(&db, &client()?)
        }

        Commands::Post {
            ticket,
            yesterday,
            today,
            blockers,
            completion_date,
        } => {
            let db = get_db(dir)?;
            let update = UpdateRecord::new(&yesterday, &today, &blockers, completion_date);
            commands::post::run(&db, &client()?, &cli.date_format, &ticket, &update)
        }

        Commands::Batch { file, keep } => {
            let db = get_db(dir)?;
            let api = client()?;
            let mut stdout = io::stdout();
            commands::batch::run(&db, &api, &cli.date_format, &file, keep, &mut stdout)
                .map(|_| ())
        }

        Commands::Run => {
            let db = get_db(dir)?;
            commands::run::run(
                &db,
                &client()?,
                &cli.date_format,
                &mut io::stdin().lock(),
                &mut io::stdout(),
            )
        }

        Commands::History { action } => {
            let db = get_db(dir)?;
            match action.unwrap_or(HistoryCommands::List { json: false }) {
                HistoryCommands::List { json } => {
                    commands::history::list(&db, &cli.date_format, json)
                }
                HistoryCommands::Clear { force } => commands::history::clear(&db, force),
            }
        }

        Commands::Reset { force } => {
            let db = get_db(dir)?;
            commands::reset::run(&db, force, &mut io::stdin().lock(), &mut io::stdout())
                .map(|_| ())
        }
    }
}
