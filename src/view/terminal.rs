//! Colored terminal rendering of the view-model.
//!
//! Rendering only reads a [`DashboardView`]; nothing here talks to the
//! backend. Each `render_*` function returns the text so the CLI decides
//! where it goes.

use std::io::{self, Write};
use std::time::Duration;

use colored::{ColoredString, Colorize};

use super::charts::{ChartContent, ChartPanel};
use super::model::{
    Alert, AlertLevel, ChatMessage, ChatRole, DashboardView, InsightFields, Section,
    SummaryFields,
};
use super::typing::{from_markup, type_out};

/// How many ranked features the insights panel lists.
const TOP_FEATURES: usize = 5;

fn level_tag(level: AlertLevel) -> ColoredString {
    match level {
        AlertLevel::Info => "info".blue().bold(),
        AlertLevel::Success => "ok".green().bold(),
        AlertLevel::Warning => "warn".yellow().bold(),
        AlertLevel::Danger => "error".red().bold(),
    }
}

fn paint(level: AlertLevel, text: &str) -> ColoredString {
    match level {
        AlertLevel::Info => text.normal(),
        AlertLevel::Success => text.green(),
        AlertLevel::Warning => text.yellow(),
        AlertLevel::Danger => text.red(),
    }
}

/// One alert, continuation lines indented under the first.
pub fn render_alert(alert: &Alert) -> String {
    let mut lines = alert.text.lines();
    let first = lines.next().unwrap_or("");
    let mut out = format!("  [{}] {}", level_tag(alert.level), paint(alert.level, first));
    for line in lines {
        out.push('\n');
        out.push_str(&format!("        {}", paint(alert.level, line)));
    }
    out
}

fn heading(title: &str) -> String {
    format!("{}\n{}", title.bold().cyan(), "=".repeat(50))
}

pub fn render_summary(summary: &SummaryFields) -> String {
    [
        heading("Data Summary"),
        format!("  {} {}", "Customers:   ".bold(), summary.total_customers),
        format!("  {} {}", "Columns:     ".bold(), summary.total_columns),
        format!("  {} {}", "Missing:     ".bold(), summary.total_missing),
        format!("  {} {}", "Data quality:".bold(), summary.data_quality),
    ]
    .join("\n")
}

pub fn render_insights(insights: &InsightFields) -> String {
    let mut lines = vec![
        heading("Insights"),
        format!("  {} {}", "Churn rate:    ".bold(), insights.churn_rate),
        format!("  {} {}", "Model accuracy:".bold(), insights.model_accuracy),
        format!("  {} {}", "Monthly loss:  ".bold(), insights.monthly_loss),
        format!("  {} {}", "Yearly loss:   ".bold(), insights.yearly_loss),
    ];

    if !insights.top_features.is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}", "Top churn drivers".bold()));
        for (i, (name, importance)) in insights.top_features.iter().take(TOP_FEATURES).enumerate()
        {
            let line = format!("  {:>2}. {:<28} {:>8}", i + 1, name, importance);
            if i % 2 == 0 {
                lines.push(line);
            } else {
                lines.push(line.dimmed().to_string());
            }
        }
    }

    lines.join("\n")
}

pub fn render_charts(panels: &[ChartPanel]) -> String {
    let mut lines = vec![heading("Charts")];
    for panel in panels {
        let status = match &panel.content {
            ChartContent::Image(bytes) => format!("{} PNG, {} bytes", "✓".green(), bytes.len()),
            ChartContent::LoadFailed | ChartContent::Unavailable => {
                let text = panel.message().unwrap_or_default();
                format!("{} {}", "✗".red(), text.dimmed())
            }
        };
        lines.push(format!("  {:<26} {}", panel.slot.id, status));
    }
    lines.join("\n")
}

/// A finished transcript entry as plain lines. The typing placeholder shows
/// as an ellipsis.
pub fn render_message(message: &ChatMessage) -> String {
    match message.role {
        ChatRole::User => format!("{} {}", "you>".bold(), message.text),
        ChatRole::Bot => format!("{} {}", "bot>".cyan().bold(), from_markup(&message.text)),
        ChatRole::Typing => format!("{} {}", "bot>".cyan().bold(), "…".dimmed()),
    }
}

/// Print a bot reply with the typing effect, or all at once when `interval`
/// is `None`.
pub fn print_bot_reply<W: Write>(out: &mut W, markup: &str, interval: Option<Duration>) -> io::Result<()> {
    write!(out, "{} ", "bot>".cyan().bold())?;
    match interval {
        Some(interval) => type_out(out, markup, interval)?,
        None => write!(out, "{}", from_markup(markup))?,
    }
    writeln!(out)
}

/// The whole dashboard, top to bottom. Hidden sections are skipped.
pub fn render_dashboard(view: &DashboardView) -> String {
    let mut blocks = Vec::new();

    if let Some(alert) = &view.upload_status {
        blocks.push(render_alert(alert));
    }

    if view.is_visible(Section::DataSummary)
        && let Some(summary) = &view.summary
    {
        blocks.push(render_summary(summary));
    }

    if view.is_visible(Section::Insights) {
        let mut block = Vec::new();
        if let Some(insights) = &view.insights {
            block.push(render_insights(insights));
        }
        for warning in &view.insight_warnings {
            block.push(render_alert(warning));
        }
        if !block.is_empty() {
            blocks.push(block.join("\n"));
        }
        if let Some(charts) = &view.charts {
            blocks.push(render_charts(charts));
        }
    }

    if let Some(alert) = &view.revenue_prediction {
        blocks.push(format!("{}\n{}", heading("Revenue Impact"), render_alert(alert)));
    }

    if view.is_visible(Section::Segmentation)
        && let Some(alert) = &view.segmentation
    {
        blocks.push(format!("{}\n{}", heading("Customer Segmentation"), render_alert(alert)));
    }

    if let Some(alert) = &view.retention_result {
        blocks.push(format!("{}\n{}", heading("Retention Simulator"), render_alert(alert)));
    }

    if let Some(alert) = &view.report_status {
        blocks.push(render_alert(alert));
    }

    if view.is_visible(Section::DataSummary) {
        let next: Vec<String> = Section::UPLOAD_RESULTS[1..]
            .iter()
            .filter(|s| view.is_visible(**s))
            .map(ToString::to_string)
            .collect();
        if !next.is_empty() {
            blocks.push(format!("  {} {}", "Available:".dimmed(), next.join(", ").dimmed()));
        }
    }

    blocks.join("\n\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
