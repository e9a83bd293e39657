//! Command-line surface of the `tally` binary.

pub mod context;
pub mod reports;
pub mod rules;
pub mod settings;
pub mod sync;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use uuid::Uuid;

use tally_domain::{Frequency, TransactionKind};

pub use context::AppContext;

use crate::{errors::CliError, server::Server};

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Materializes recurring income, expenses and investments as dated transactions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage recurring rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Materialize one user's due occurrences, as a signed-in client would.
    Sync {
        #[arg(long)]
        user: String,
        /// Override today's date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Run the daily pass over every user once and exit.
    RunDaily {
        /// Override today's date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Run the daily scheduler and the manual trigger listener.
    Serve,
    /// Show the next bills due for a user.
    Upcoming {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = tally_core::DEFAULT_UPCOMING_LIMIT)]
        limit: usize,
        /// Override today's date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },
    /// Report generated transactions that were created more than once.
    Reconcile {
        #[arg(long)]
        user: String,
    },
    /// Print the effective configuration, or change the stored one.
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration (the default).
    Show,
    /// Store the shared secret the manual trigger expects after `Bearer `.
    SetSecret { secret: String },
    /// Remove the stored secret; the manual trigger then rejects every request.
    ClearSecret,
    /// Change when the daily pass runs.
    SetSchedule {
        /// Wall-clock time, HH:MM
        #[arg(long = "run-at")]
        run_at: Option<String>,
        /// Offset from UTC in minutes, e.g. 330 or -300
        #[arg(long = "utc-offset-minutes", allow_hyphen_values = true)]
        utc_offset_minutes: Option<i32>,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a recurring rule.
    Add {
        #[arg(long)]
        user: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        amount: Decimal,
        #[arg(long)]
        category: String,
        #[arg(long = "category-id")]
        category_id: Option<String>,
        /// expense, income or investment
        #[arg(long = "type", default_value = "expense")]
        kind: TransactionKind,
        /// daily, weekly, monthly or yearly
        #[arg(long)]
        frequency: Frequency,
        /// First due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: NaiveDate,
        /// Store the rule paused
        #[arg(long)]
        paused: bool,
    },
    /// List a user's rules, malformed documents included.
    List {
        #[arg(long)]
        user: String,
    },
    /// Edit fields of a rule.
    Edit {
        #[arg(long)]
        user: String,
        id: Uuid,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        amount: Option<Decimal>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long = "type")]
        kind: Option<TransactionKind>,
        #[arg(long)]
        frequency: Option<Frequency>,
        /// Move the cursor forward to this date (YYYY-MM-DD)
        #[arg(long = "next-due", value_parser = parse_date)]
        next_due: Option<NaiveDate>,
    },
    /// Pause a rule.
    Pause {
        #[arg(long)]
        user: String,
        id: Uuid,
    },
    /// Resume a paused rule.
    Resume {
        #[arg(long)]
        user: String,
        id: Uuid,
    },
    /// Flip a rule between active and paused.
    Toggle {
        #[arg(long)]
        user: String,
        id: Uuid,
    },
    /// Delete a rule.
    Delete {
        #[arg(long)]
        user: String,
        id: Uuid,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    tally_domain::parse_iso(value.trim())
        .map_err(|err| format!("`{value}` is not a YYYY-MM-DD date: {err}"))
}

/// Dispatches a parsed command line.
pub fn run(cli: Cli) -> Result<(), CliError> {
    let context = AppContext::load()?;
    match cli.command {
        Commands::Rules { command } => rules::run(&context, command),
        Commands::Sync { user, today } => sync::interactive(&context, &user, today),
        Commands::RunDaily { today } => sync::daily(&context, today),
        Commands::Serve => Server::from_context(&context)?.run(),
        Commands::Upcoming { user, limit, today } => {
            reports::upcoming(&context, &user, limit, today)
        }
        Commands::Reconcile { user } => reports::reconcile(&context, &user),
        Commands::Config { command } => settings::run(&context, command.unwrap_or(ConfigCommands::Show)),
    }
}
