//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `churnlens upload FILE`: analyze a CSV and show the dashboard
//! - `churnlens filter --month M --year Y`: re-run analysis for one month
//! - `churnlens simulate --reduction PCT`: retention-strategy what-if
//! - `churnlens chat [MESSAGE]`: one question, a preset, or an interactive session
//! - `churnlens report`: download the PDF report
//! - `churnlens health`: check config files and backend reachability
//! - `churnlens stats`: interaction journal summary
//! - `churnlens config show|init|set|reset`: configuration management

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Result, bail};
use colored::Colorize;

use crate::analytics::logger::{self, Journal, Outcome};
use crate::analytics::reporter::{self, Stats};
use crate::api::HttpBackend;
use crate::config::{self, ChurnlensConfig};
use crate::controller::Dashboard;
use crate::controller::quick::QuickQuestion;
use crate::view::charts::export_charts;
use crate::view::terminal;
use crate::view::{ChatMessage, ChatRole, DashboardView};

/// Output format for analytics commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// A dashboard wired to the configured backend and journal.
fn open_dashboard(cfg: &ChurnlensConfig) -> Dashboard<HttpBackend> {
    Dashboard::new(HttpBackend::from_config(&cfg.backend))
        .with_journal(Journal::from_config(&cfg.logging))
        .with_segmentation_question(cfg.dashboard.segmentation_question.as_str())
}

/// CLI flag if given, else the configured raw revenue field.
fn revenue_input(cfg: &ChurnlensConfig, flag: Option<&str>) -> String {
    flag.map(str::to_string)
        .unwrap_or_else(|| cfg.dashboard.current_revenue.clone())
}

fn print_view(view: &DashboardView) {
    let rendered = terminal::render_dashboard(view);
    if !rendered.is_empty() {
        println!("{rendered}");
    }
}

/// Write decoded charts to `[charts] output_dir`, if configured.
fn export_configured_charts(cfg: &ChurnlensConfig, view: &DashboardView) -> Result<()> {
    let (Some(dir), Some(panels)) = (&cfg.charts.output_dir, &view.charts) else {
        return Ok(());
    };
    let written = export_charts(panels, dir)?;
    if !written.is_empty() {
        println!();
        println!(
            "  {} {} chart(s) written to {}",
            "✓".green().bold(),
            written.len(),
            dir.display()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// churnlens upload
// ---------------------------------------------------------------------------

/// Upload a CSV and print the resulting dashboard.
pub fn run_upload(file: &Path, revenue: Option<&str>) -> Result<Outcome> {
    let cfg = config::load();
    let revenue = revenue_input(&cfg, revenue);
    let mut dashboard = open_dashboard(&cfg);

    println!("{}", format!("Analyzing {} ...", file.display()).dimmed());
    let outcome = dashboard.submit_upload(Some(file), &revenue);
    print_view(dashboard.view());
    export_configured_charts(&cfg, dashboard.view())?;

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// churnlens filter
// ---------------------------------------------------------------------------

/// Apply a month/year filter to the last uploaded dataset.
pub fn run_filter(month: &str, year: &str) -> Result<Outcome> {
    let cfg = config::load();
    let mut dashboard = open_dashboard(&cfg);

    let outcome = dashboard.submit_date_filter(month, year);
    print_view(dashboard.view());
    export_configured_charts(&cfg, dashboard.view())?;

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// churnlens simulate
// ---------------------------------------------------------------------------

/// Show the revenue loss after a churn reduction of `reduction` percent.
pub fn run_simulate(reduction: &str, revenue: Option<&str>) -> Result<Outcome> {
    let cfg = config::load();
    let revenue = revenue_input(&cfg, revenue);
    let mut dashboard = open_dashboard(&cfg);

    let outcome = dashboard.submit_retention_simulation(reduction, &revenue);
    print_view(dashboard.view());

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// churnlens chat
// ---------------------------------------------------------------------------

/// Ask one question (free text or a preset), or start an interactive session
/// when neither is given.
pub fn run_chat(message: Option<&str>, quick: Option<&str>, revenue: Option<&str>) -> Result<Outcome> {
    let cfg = config::load();
    let revenue = revenue_input(&cfg, revenue);
    let mut dashboard = open_dashboard(&cfg);
    let interval = typing_interval(&cfg);

    if let Some(topic) = quick {
        let Some(question) = QuickQuestion::from_topic(topic) else {
            bail!("unknown topic '{topic}' (expected one of: {})", topic_list());
        };
        println!("{}", terminal::render_message(&ChatMessage::user(question.question())));
        let outcome = dashboard.ask_quick_question(question, &revenue);
        print_last_reply(dashboard.view(), interval)?;
        return Ok(outcome);
    }

    if let Some(message) = message {
        let outcome = dashboard.send_chat_message(message, &revenue);
        print_last_reply(dashboard.view(), interval)?;
        return Ok(outcome);
    }

    run_chat_session(&mut dashboard, &revenue, interval)
}

fn run_chat_session(
    dashboard: &mut Dashboard<HttpBackend>,
    revenue: &str,
    interval: Option<Duration>,
) -> Result<Outcome> {
    println!("{}", "Churn Insights Chat".bold().cyan());
    println!("{}", "=".repeat(40));
    println!(
        "  {}",
        format!("/quick TOPIC for a preset ({}), /exit to leave", topic_list()).dimmed()
    );

    let stdin = io::stdin();
    let mut last = Outcome::Succeeded;
    loop {
        print!("{} ", "you>".bold());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();

        match line {
            "/exit" | "/quit" => break,
            "" => continue,
            _ => {}
        }

        last = match line.strip_prefix("/quick") {
            Some(topic) => match QuickQuestion::from_topic(topic) {
                Some(question) => dashboard.ask_quick_question(question, revenue),
                None => {
                    println!("  {}", format!("Topics: {}", topic_list()).yellow());
                    continue;
                }
            },
            None => dashboard.send_chat_message(line, revenue),
        };
        print_last_reply(dashboard.view(), interval)?;
    }

    Ok(last)
}

fn typing_interval(cfg: &ChurnlensConfig) -> Option<Duration> {
    cfg.chat
        .typing_effect
        .then(|| Duration::from_millis(cfg.chat.typing_interval_ms))
}

fn print_last_reply(view: &DashboardView, interval: Option<Duration>) -> Result<()> {
    if let Some(reply) = view.transcript.last().filter(|m| m.role == ChatRole::Bot) {
        let mut out = io::stdout().lock();
        terminal::print_bot_reply(&mut out, &reply.text, interval)?;
    }
    Ok(())
}

fn topic_list() -> String {
    QuickQuestion::ALL
        .iter()
        .map(|q| q.topic())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// churnlens report
// ---------------------------------------------------------------------------

/// Download the PDF report into `out` (default: current directory).
pub fn run_report(out: Option<PathBuf>) -> Result<Outcome> {
    let cfg = config::load();
    let mut dashboard = open_dashboard(&cfg);
    let dir = out.unwrap_or_else(|| PathBuf::from("."));

    let (outcome, _) = dashboard.download_report(&dir);
    print_view(dashboard.view());

    Ok(outcome)
}

// ---------------------------------------------------------------------------
// churnlens health
// ---------------------------------------------------------------------------

/// Check config files, backend reachability and the journal.
pub fn run_health() -> Result<()> {
    println!("{}", "churnlens Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.churnlens/config.toml found"
        } else {
            "not found (run `churnlens config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".churnlens.toml found"
        } else {
            "none (optional)"
        },
    );

    let backend = HttpBackend::from_config(&cfg.backend);
    let reachable = backend.is_reachable();
    let backend_detail = if reachable {
        format!("reachable at {}", backend.base_url())
    } else {
        format!("not reachable at {}. Is the server running?", backend.base_url())
    };
    print_health_item("Backend", reachable, &backend_detail);

    let timeout_detail = match cfg.backend.timeout() {
        Some(timeout) => format!("{} ms", timeout.as_millis()),
        None => "none (requests wait for the server)".to_string(),
    };
    print_health_item("Request timeout", true, &timeout_detail);

    let revenue = crate::controller::validation::normalize_revenue(&cfg.dashboard.current_revenue);
    print_health_item(
        "Current revenue",
        revenue > 0.0,
        &if revenue > 0.0 {
            format!("₹{revenue:.2}")
        } else {
            "0 (pass --revenue or set dashboard.current_revenue)".to_string()
        },
    );

    let journal = Journal::from_config(&cfg.logging);
    let log_exists = journal.path().map(|p| p.exists()).unwrap_or(false);
    print_health_item(
        "Interaction log",
        cfg.logging.enabled,
        &if !cfg.logging.enabled {
            "disabled".to_string()
        } else if log_exists {
            format!("{} entries", journal.read_all().len())
        } else {
            "no log file yet".to_string()
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// churnlens stats
// ---------------------------------------------------------------------------

/// Summarize the interaction journal.
pub fn run_stats(format: OutputFormat, days: Option<u32>) -> Result<()> {
    let cfg = config::load();
    let journal = match &cfg.logging.path {
        Some(path) => Journal::at(path),
        None => logger::interaction_log_path()
            .map(Journal::at)
            .unwrap_or_default(),
    };
    let stats = reporter::compute_stats(&journal.read_since_days(days));

    if stats.total == 0 {
        println!(
            "{}",
            "No data yet. Use the dashboard commands to record interactions.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => print_stats_json(&stats)?,
        OutputFormat::Csv => print_stats_csv(&stats),
        OutputFormat::Table => print_stats_table(&stats),
    }

    Ok(())
}

fn print_stats_table(stats: &Stats) {
    println!("{}", "churnlens Interaction Report".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();

    println!("  {} {}", "Requests:     ".bold(), stats.total);
    println!("  {} {}", "Succeeded:    ".bold(), stats.succeeded);
    println!(
        "  {} {} server, {} transport",
        "Failed:       ".bold(),
        stats.server_errors,
        stats.failed
    );
    println!("  {} {:.1}%", "Failure rate: ".bold(), stats.failure_pct());
    println!();

    println!("{}", "By Action".bold().cyan());
    println!(
        "  {:<22} {:>6} {:>6} {:>8} {:>10}",
        "Action", "Count", "OK", "Failed", "Avg ms"
    );
    println!("  {}", "-".repeat(58));

    for (i, action) in stats.actions.iter().enumerate() {
        let line = format!(
            "  {:<22} {:>6} {:>6} {:>8} {:>10}",
            truncate(&action.action, 22),
            action.count,
            action.succeeded,
            action.server_errors + action.failed,
            action
                .avg_latency_ms
                .map(|ms| ms.to_string())
                .unwrap_or_else(|| "-".to_string()),
        );

        if i % 2 == 0 {
            println!("{}", line);
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_stats_json(stats: &Stats) -> Result<()> {
    let value = serde_json::json!({
        "total": stats.total,
        "succeeded": stats.succeeded,
        "rejected": stats.rejected,
        "server_errors": stats.server_errors,
        "failed": stats.failed,
        "failure_pct": stats.failure_pct(),
        "actions": stats.actions.iter().map(|a| serde_json::json!({
            "action": a.action,
            "count": a.count,
            "succeeded": a.succeeded,
            "rejected": a.rejected,
            "server_errors": a.server_errors,
            "failed": a.failed,
            "avg_latency_ms": a.avg_latency_ms,
        })).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_stats_csv(stats: &Stats) {
    println!("action,count,succeeded,rejected,server_errors,failed,avg_latency_ms");
    for a in &stats.actions {
        println!(
            "{},{},{},{},{},{},{}",
            a.action,
            a.count,
            a.succeeded,
            a.rejected,
            a.server_errors,
            a.failed,
            a.avg_latency_ms.map(|ms| ms.to_string()).unwrap_or_default(),
        );
    }
}

// ---------------------------------------------------------------------------
// churnlens config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective churnlens Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.churnlens/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.churnlens/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".churnlens.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".churnlens.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "CHURNLENS_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.churnlens/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point churnlens at your backend.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
