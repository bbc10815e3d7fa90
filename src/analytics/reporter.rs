//! Journal reporter: per-action aggregation for `churnlens stats`.

use std::collections::HashMap;

use crate::analytics::logger::{InteractionEntry, Outcome};

/// Summary statistics across the journal.
#[derive(Debug, Default)]
pub struct Stats {
    pub total: usize,
    pub succeeded: usize,
    pub rejected: usize,
    pub server_errors: usize,
    pub failed: usize,
    /// Per-action breakdown, busiest first.
    pub actions: Vec<ActionStat>,
}

impl Stats {
    /// Share of requests (rejections excluded) that did not succeed.
    pub fn failure_pct(&self) -> f64 {
        let sent = self.total - self.rejected;
        if sent == 0 {
            0.0
        } else {
            ((self.server_errors + self.failed) as f64 / sent as f64) * 100.0
        }
    }
}

/// Aggregated figures for one dashboard action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionStat {
    pub action: String,
    pub count: usize,
    pub succeeded: usize,
    pub rejected: usize,
    pub server_errors: usize,
    pub failed: usize,
    /// Mean latency over entries that made a request.
    pub avg_latency_ms: Option<u64>,
}

/// Aggregate journal entries.
pub fn compute_stats(entries: &[InteractionEntry]) -> Stats {
    let mut stats = Stats::default();
    let mut by_action: HashMap<&str, (ActionStat, u64, u64)> = HashMap::new();

    for entry in entries {
        stats.total += 1;
        let (stat, latency_sum, latency_count) =
            by_action.entry(entry.action.as_str()).or_insert_with(|| {
                (
                    ActionStat {
                        action: entry.action.clone(),
                        count: 0,
                        succeeded: 0,
                        rejected: 0,
                        server_errors: 0,
                        failed: 0,
                        avg_latency_ms: None,
                    },
                    0,
                    0,
                )
            });
        stat.count += 1;

        match entry.outcome {
            Outcome::Succeeded => {
                stats.succeeded += 1;
                stat.succeeded += 1;
            }
            Outcome::Rejected => {
                stats.rejected += 1;
                stat.rejected += 1;
            }
            Outcome::ServerError => {
                stats.server_errors += 1;
                stat.server_errors += 1;
            }
            Outcome::Failed => {
                stats.failed += 1;
                stat.failed += 1;
            }
        }

        if let Some(ms) = entry.latency_ms {
            *latency_sum += ms;
            *latency_count += 1;
        }
    }

    stats.actions = by_action
        .into_values()
        .map(|(mut stat, sum, count)| {
            stat.avg_latency_ms = (count > 0).then(|| sum / count);
            stat
        })
        .collect();
    stats
        .actions
        .sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.action.cmp(&b.action)));

    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
