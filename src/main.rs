use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use churnlens::analytics::logger::Outcome;
use churnlens::cli;

#[derive(Debug, Parser)]
#[command(name = "churnlens")]
#[command(about = "Churn analytics dashboard in the terminal")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Upload a customer CSV and show the analysis
    Upload {
        /// Path to the CSV file
        file: PathBuf,
        /// Current monthly revenue (falls back to dashboard.current_revenue)
        #[arg(long, allow_hyphen_values = true)]
        revenue: Option<String>,
    },
    /// Re-run the analysis for one month of the uploaded data
    Filter {
        #[arg(long)]
        month: String,
        #[arg(long)]
        year: String,
    },
    /// Simulate a churn reduction and show the remaining revenue loss
    Simulate {
        /// Churn reduction in percent (0-100)
        #[arg(long, allow_hyphen_values = true)]
        reduction: String,
        /// Current monthly revenue (falls back to dashboard.current_revenue)
        #[arg(long, allow_hyphen_values = true)]
        revenue: Option<String>,
    },
    /// Ask the churn chatbot; starts an interactive session without a message
    Chat {
        /// Question to ask
        message: Option<String>,
        /// Ask a preset question instead (churn-rate, revenue, reasons, ...)
        #[arg(long, conflicts_with = "message")]
        quick: Option<String>,
        /// Current monthly revenue (falls back to dashboard.current_revenue)
        #[arg(long, allow_hyphen_values = true)]
        revenue: Option<String>,
    },
    /// Download the PDF analysis report
    Report {
        /// Directory to save into (default: current directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Check config files and backend reachability
    Health,
    /// Show interaction statistics from the journal
    Stats {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
        /// Only include the last N days of data
        #[arg(long)]
        days: Option<u32>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective (merged) configuration
    Show,
    /// Write a default ~/.churnlens/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set one value, e.g. `backend.base_url http://host:5000`
    Set { key: String, value: String },
    /// Restore the default configuration
    Reset,
}

/// Dashboard actions exit non-zero unless they succeeded.
fn exit_code(outcome: Outcome) -> ExitCode {
    match outcome {
        Outcome::Succeeded => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn main() -> Result<ExitCode> {
    let app = App::parse();

    let outcome = match app.command {
        Commands::Upload { file, revenue } => cli::run_upload(&file, revenue.as_deref())?,
        Commands::Filter { month, year } => cli::run_filter(&month, &year)?,
        Commands::Simulate { reduction, revenue } => {
            cli::run_simulate(&reduction, revenue.as_deref())?
        }
        Commands::Chat {
            message,
            quick,
            revenue,
        } => cli::run_chat(message.as_deref(), quick.as_deref(), revenue.as_deref())?,
        Commands::Report { out } => cli::run_report(out)?,
        Commands::Health => {
            cli::run_health()?;
            Outcome::Succeeded
        }
        Commands::Stats { format, days } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_stats(fmt, days)?;
            Outcome::Succeeded
        }
        Commands::Config { action } => {
            match action {
                ConfigAction::Show => cli::run_config_show()?,
                ConfigAction::Init { force } => cli::run_config_init(force)?,
                ConfigAction::Set { key, value } => cli::run_config_set(&key, &value)?,
                ConfigAction::Reset => cli::run_config_reset()?,
            }
            Outcome::Succeeded
        }
    };

    Ok(exit_code(outcome))
}
