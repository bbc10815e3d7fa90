//! Retention-strategy simulation.
//!
//! The backend only predicts the baseline loss; the "what if churn dropped by
//! N %" figures are computed here from that baseline.

use crate::view::model::format_rupees;

/// Loss figures after applying a churn reduction to a baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetentionSimulation {
    pub reduction_pct: f64,
    pub monthly_loss: f64,
    pub yearly_loss: f64,
}

/// Scale the baseline monthly loss by `1 - pct/100`; yearly is twelve months
/// of the reduced figure.
pub fn simulate_retention(baseline_monthly_loss: f64, reduction_pct: f64) -> RetentionSimulation {
    let monthly_loss = baseline_monthly_loss * (1.0 - reduction_pct / 100.0);
    RetentionSimulation {
        reduction_pct,
        monthly_loss,
        yearly_loss: monthly_loss * 12.0,
    }
}

impl RetentionSimulation {
    /// Text for the retention result panel.
    pub fn summary(&self) -> String {
        format!(
            "With {}% churn reduction:\nMonthly Loss: {}\nAnnual Loss: {}",
            self.reduction_pct,
            format_rupees(self.monthly_loss),
            format_rupees(self.yearly_loss)
        )
    }
}
