//! Typed view-model for the dashboard.
//!
//! Every on-screen target the controller writes to is a field here. The
//! renderer only reads this struct, so render logic is testable without a
//! terminal and the "current result" is never implicit in printed output.

use std::collections::BTreeSet;
use std::fmt;

use crate::api::types::{DataInfo, Insights};
use crate::controller::form::FormState;

use super::charts::ChartPanel;

// ---------------------------------------------------------------------------
// Chat transcript
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Bot,
    /// Placeholder shown while a reply is pending.
    Typing,
}

/// One entry of the in-session transcript. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    /// Message markup; bot replies use `<br>` for line breaks.
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Bot,
            text: text.into(),
        }
    }

    pub fn typing() -> Self {
        Self {
            role: ChatRole::Typing,
            text: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Alerts and sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Info,
    Success,
    Warning,
    Danger,
}

/// An inline status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub level: AlertLevel,
    pub text: String,
}

impl Alert {
    pub fn info(text: impl Into<String>) -> Self {
        Self::new(AlertLevel::Info, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(AlertLevel::Success, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(AlertLevel::Warning, text)
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self::new(AlertLevel::Danger, text)
    }

    fn new(level: AlertLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
        }
    }
}

/// Dashboard sections that start hidden and are revealed by results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    DataSummary,
    DateFilter,
    Chatbot,
    DownloadReport,
    Segmentation,
    RetentionSimulator,
    Insights,
}

impl Section {
    /// The six sections a successful upload reveals, before insights.
    pub const UPLOAD_RESULTS: [Section; 6] = [
        Section::DataSummary,
        Section::DateFilter,
        Section::Chatbot,
        Section::DownloadReport,
        Section::Segmentation,
        Section::RetentionSimulator,
    ];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::DataSummary => "Data Summary",
            Self::DateFilter => "Date Filter",
            Self::Chatbot => "Chatbot",
            Self::DownloadReport => "Download Report",
            Self::Segmentation => "Customer Segmentation",
            Self::RetentionSimulator => "Retention Simulator",
            Self::Insights => "Insights",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Metric panels
// ---------------------------------------------------------------------------

/// The four data-summary cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryFields {
    pub total_customers: String,
    pub total_columns: String,
    pub total_missing: String,
    pub data_quality: String,
}

impl SummaryFields {
    pub fn from_data_info(info: &DataInfo) -> Self {
        Self {
            total_customers: info.rows.to_string(),
            total_columns: info.columns.to_string(),
            total_missing: info.missing_values.to_string(),
            data_quality: format_percent(info.data_quality_score),
        }
    }
}

/// Churn and revenue-loss insight cards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsightFields {
    pub churn_rate: String,
    pub model_accuracy: String,
    pub monthly_loss: String,
    pub yearly_loss: String,
    /// Top predictive features as `(name, importance)` labels.
    pub top_features: Vec<(String, String)>,
}

impl InsightFields {
    /// Format server insights. Missing loss figures render as `₹0.00`.
    pub fn from_insights(insights: &Insights) -> Self {
        Self {
            churn_rate: format_percent(insights.churn_rate * 100.0),
            model_accuracy: format_percent(insights.model_accuracy * 100.0),
            monthly_loss: format_rupees(insights.potential_monthly_loss.unwrap_or(0.0)),
            yearly_loss: format_rupees(insights.potential_yearly_loss.unwrap_or(0.0)),
            top_features: insights
                .feature_importance
                .iter()
                .map(|f| (f.feature.clone(), format!("{:.4}", f.importance)))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Whole dashboard
// ---------------------------------------------------------------------------

/// Per-form state machines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forms {
    pub chat: FormState,
    pub upload: FormState,
    pub date_filter: FormState,
    pub retention: FormState,
    pub report: FormState,
}

/// Everything the renderer shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardView {
    pub visible: BTreeSet<Section>,
    pub upload_status: Option<Alert>,
    pub summary: Option<SummaryFields>,
    pub insights: Option<InsightFields>,
    pub charts: Option<Vec<ChartPanel>>,
    pub insight_warnings: Vec<Alert>,
    pub revenue_prediction: Option<Alert>,
    pub segmentation: Option<Alert>,
    pub retention_result: Option<Alert>,
    pub report_status: Option<Alert>,
    pub transcript: Vec<ChatMessage>,
    pub forms: Forms,
}

impl DashboardView {
    pub fn show(&mut self, section: Section) {
        self.visible.insert(section);
    }

    pub fn is_visible(&self, section: Section) -> bool {
        self.visible.contains(&section)
    }

    /// Drop the pending-reply placeholder, if any.
    pub fn remove_typing(&mut self) {
        self.transcript.retain(|m| m.role != ChatRole::Typing);
    }

    /// Whether a reply is still pending.
    pub fn is_typing(&self) -> bool {
        self.transcript.iter().any(|m| m.role == ChatRole::Typing)
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// `12.3456` → `"12.35%"`.
pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}

/// `1234.5` → `"₹1234.50"`.
pub fn format_rupees(value: f64) -> String {
    format!("₹{value:.2}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
