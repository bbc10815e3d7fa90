use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Interaction log entry (JSONL)
// ---------------------------------------------------------------------------

/// How a dashboard interaction ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The server answered with a usable result.
    Succeeded,
    /// Local validation rejected the input; no request was sent.
    Rejected,
    /// The server answered `success: false`.
    ServerError,
    /// Transport failure, non-2xx status or undecodable body.
    Failed,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Rejected => write!(f, "rejected"),
            Self::ServerError => write!(f, "server_error"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A single entry in the interaction journal
/// (`~/.churnlens/interaction-log.jsonl`).
///
/// One line per handled action (and per chained follow-up request). Used by
/// the reporter for `churnlens stats`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEntry {
    pub timestamp: String,
    /// Dashboard action, e.g. `"upload"` or `"segmentation"`.
    pub action: String,
    /// Endpoint path, empty when no request was made.
    #[serde(default)]
    pub endpoint: String,
    pub outcome: Outcome,
    /// Wall-clock time of the request (absent for rejected input).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latency_ms: Option<u64>,
    /// Error chain or server message for anything but success.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

impl InteractionEntry {
    pub fn new(action: &str, endpoint: &str, outcome: Outcome) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            action: action.to_string(),
            endpoint: endpoint.to_string(),
            outcome,
            latency_ms: None,
            detail: None,
        }
    }

    pub fn latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Where interaction entries go. Disabled journals drop everything.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    path: Option<PathBuf>,
}

impl Journal {
    /// A journal that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// A journal appending to `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Build from the `[logging]` section.
    pub fn from_config(config: &crate::config::schema::LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: config.path.clone().or_else(interaction_log_path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry. Best effort; failures are silently ignored.
    pub fn record(&self, entry: &InteractionEntry) {
        if let Some(path) = &self.path {
            let _ = append_entry(path, entry);
        }
    }

    /// Read every entry, skipping malformed lines.
    pub fn read_all(&self) -> Vec<InteractionEntry> {
        self.path
            .as_deref()
            .map(read_entries)
            .unwrap_or_default()
    }

    /// Read entries from the last `days` days (all entries when `None`).
    pub fn read_since_days(&self, days: Option<u32>) -> Vec<InteractionEntry> {
        let entries = self.read_all();

        let Some(days) = days else {
            return entries;
        };

        let cutoff = (Utc::now() - chrono::Duration::days(i64::from(days))).to_rfc3339();
        entries
            .into_iter()
            .filter(|e| e.timestamp >= cutoff)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// File I/O
// ---------------------------------------------------------------------------

fn read_entries(path: &Path) -> Vec<InteractionEntry> {
    let Ok(file) = fs::File::open(path) else {
        return Vec::new();
    };

    BufReader::new(file)
        .lines()
        .map_while(Result::ok)
        .filter_map(|line| serde_json::from_str::<InteractionEntry>(&line).ok())
        .collect()
}

fn append_entry(path: &Path, entry: &InteractionEntry) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(entry)?;
    writeln!(file, "{json}")?;

    Ok(())
}

/// Default journal location.
pub fn interaction_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".churnlens").join("interaction-log.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::at(dir.path().join("nested").join("log.jsonl"));

        journal.record(&InteractionEntry::new("upload", "/upload", Outcome::Succeeded).latency(42));
        journal.record(
            &InteractionEntry::new("chat", "/chat", Outcome::Failed)
                .latency(7)
                .detail("/chat returned HTTP 500: boom"),
        );

        let entries = journal.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "upload");
        assert_eq!(entries[0].latency_ms, Some(42));
        assert_eq!(entries[1].outcome, Outcome::Failed);
        assert_eq!(
            entries[1].detail.as_deref(),
            Some("/chat returned HTTP 500: boom")
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let journal = Journal::at(&path);
        journal.record(&InteractionEntry::new("simulate", "", Outcome::Rejected));
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();

        assert_eq!(journal.read_all().len(), 1);
    }

    #[test]
    fn disabled_journal_records_nothing() {
        let journal = Journal::disabled();
        journal.record(&InteractionEntry::new("chat", "/chat", Outcome::Succeeded));
        assert!(journal.read_all().is_empty());
        assert!(journal.path().is_none());
    }

    #[test]
    fn old_entries_fall_outside_window() {
        let dir = tempfile::tempdir().unwrap();
        let journal = Journal::at(dir.path().join("log.jsonl"));
        let mut old = InteractionEntry::new("chat", "/chat", Outcome::Succeeded);
        old.timestamp = "2000-01-01T00:00:00+00:00".to_string();
        journal.record(&old);
        journal.record(&InteractionEntry::new("chat", "/chat", Outcome::Succeeded));

        assert_eq!(journal.read_since_days(Some(7)).len(), 1);
        assert_eq!(journal.read_since_days(None).len(), 2);
    }

    #[test]
    fn outcome_serializes_snake_case() {
        let json = serde_json::to_string(&Outcome::ServerError).unwrap();
        assert_eq!(json, "\"server_error\"");
        assert_eq!(Outcome::ServerError.to_string(), "server_error");
    }
}
