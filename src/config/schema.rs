/// Configuration schema and defaults for churnlens.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[backend]`, `[dashboard]`, `[chat]`, `[charts]` and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values they
/// want to override.
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Question sent to `/chat` to fill the segmentation panel after an upload.
pub const DEFAULT_SEGMENTATION_QUESTION: &str = "Which customer segment has the highest churn?";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level churnlens configuration.
///
/// Maps directly to the `~/.churnlens/config.toml` and `.churnlens.toml`
/// file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnlensConfig {
    pub backend: BackendConfig,
    pub dashboard: DashboardConfig,
    pub chat: ChatConfig,
    pub charts: ChartsConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the analytics backend lives and how requests are sent to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the analytics service.
    pub base_url: String,
    /// Per-request timeout in milliseconds. `0` disables the timeout, so a
    /// hung request blocks until the server answers.
    pub timeout_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 0,
        }
    }
}

impl BackendConfig {
    /// The configured timeout, or `None` when requests may wait forever.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Values the dashboard forms fall back to when the CLI omits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Raw "current revenue" field. Kept as text and normalized per request,
    /// the same way a form input is.
    pub current_revenue: String,
    /// Question asked to fill the segmentation panel.
    pub segmentation_question: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            current_revenue: String::new(),
            segmentation_question: DEFAULT_SEGMENTATION_QUESTION.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [chat]
// ---------------------------------------------------------------------------

/// Chatbot presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Reveal bot replies frame by frame.
    pub typing_effect: bool,
    /// Delay between reveal frames (milliseconds).
    pub typing_interval_ms: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_effect: true,
            typing_interval_ms: 20,
        }
    }
}

// ---------------------------------------------------------------------------
// [charts]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Directory decoded chart PNGs are written to. Unset = don't export.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Interaction journal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append one JSONL entry per interaction.
    pub enabled: bool,
    /// Override for the journal location
    /// (default `~/.churnlens/interaction-log.jsonl`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl ChurnlensConfig {
    /// The annotated TOML written by `churnlens config init`.
    pub fn default_toml() -> &'static str {
        DEFAULT_CONFIG_TOML
    }
}

const DEFAULT_CONFIG_TOML: &str = r#"# churnlens configuration
#
# Precedence (lowest to highest): built-in defaults, this file,
# .churnlens.toml in the working directory, CHURNLENS_* environment variables.

[backend]
# Base URL of the churn analytics service.
base_url = "http://127.0.0.1:5000"
# Request timeout in milliseconds. 0 waits indefinitely.
timeout_ms = 0

[dashboard]
# Monthly revenue used by chat, upload and the retention simulator.
# Empty, non-numeric or non-positive values are treated as 0.
current_revenue = ""
segmentation_question = "Which customer segment has the highest churn?"

[chat]
typing_effect = true
typing_interval_ms = 20

[charts]
# Uncomment to write decoded chart images to disk.
# output_dir = "charts"

[logging]
enabled = true
# path = "/tmp/churnlens-interactions.jsonl"
"#;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
