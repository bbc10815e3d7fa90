//! Chart slots and base64 PNG decoding.
//!
//! The dashboard has six fixed chart slots. Each maps to one key of the
//! `charts` object the backend returns; the mapping lives in [`CHART_SLOTS`]
//! rather than in branching code.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// First eight bytes of every PNG file.
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// A dashboard chart slot and the response key that feeds it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSlot {
    /// Stable slot identifier (also used as the export file stem).
    pub id: &'static str,
    /// Key in the backend's `charts` map.
    pub key: &'static str,
    /// Human-readable label.
    pub label: &'static str,
}

/// The six chart slots, in display order.
pub const CHART_SLOTS: [ChartSlot; 6] = [
    ChartSlot {
        id: "churn-distribution",
        key: "churn_distribution",
        label: "churn distribution",
    },
    ChartSlot {
        id: "tenure-chart",
        key: "tenure_vs_churn",
        label: "tenure chart",
    },
    ChartSlot {
        id: "charges-chart",
        key: "charges_vs_churn",
        label: "charges chart",
    },
    ChartSlot {
        id: "contract-chart",
        key: "contract_vs_churn",
        label: "contract chart",
    },
    ChartSlot {
        id: "feature-importance-chart",
        key: "feature_importance",
        label: "feature importance-chart",
    },
    ChartSlot {
        id: "churn-over-time",
        key: "churn_over_time",
        label: "churn over-time",
    },
];

/// What a chart slot shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartContent {
    /// A decoded PNG image.
    Image(Vec<u8>),
    /// The key was present but the payload is not a loadable PNG.
    LoadFailed,
    /// The key was absent or empty.
    Unavailable,
}

/// One rendered chart slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPanel {
    pub slot: ChartSlot,
    pub content: ChartContent,
}

impl ChartPanel {
    /// Placeholder or status text for non-image content.
    pub fn message(&self) -> Option<String> {
        match self.content {
            ChartContent::Image(_) => None,
            ChartContent::LoadFailed => Some("Error loading chart. Please try again.".to_string()),
            ChartContent::Unavailable => {
                Some(format!("Chart data unavailable for {}.", self.slot.label))
            }
        }
    }
}

/// Map a backend `charts` object onto the six slots.
pub fn render_charts(charts: &HashMap<String, String>) -> Vec<ChartPanel> {
    CHART_SLOTS
        .iter()
        .map(|slot| {
            let content = match charts.get(slot.key).map(String::as_str) {
                None | Some("") => ChartContent::Unavailable,
                Some(encoded) => match decode_png(encoded) {
                    Some(bytes) => ChartContent::Image(bytes),
                    None => ChartContent::LoadFailed,
                },
            };
            ChartPanel {
                slot: *slot,
                content,
            }
        })
        .collect()
}

/// Decode a base64 payload and accept it only if it is a PNG.
///
/// Tolerates a `data:image/png;base64,` prefix and embedded whitespace.
fn decode_png(encoded: &str) -> Option<Vec<u8>> {
    let payload = encoded
        .strip_prefix("data:image/png;base64,")
        .unwrap_or(encoded);
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).ok()?;
    bytes.starts_with(&PNG_SIGNATURE).then_some(bytes)
}

/// Write every decoded image to `dir/<slot id>.png`. Returns the written paths.
pub fn export_charts(panels: &[ChartPanel], dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create chart directory {}", dir.display()))?;

    let mut written = Vec::new();
    for panel in panels {
        if let ChartContent::Image(bytes) = &panel.content {
            let path = dir.join(format!("{}.png", panel.slot.id));
            fs::write(&path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            written.push(path);
        }
    }
    Ok(written)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
