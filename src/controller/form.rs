//! Per-form lifecycle.
//!
//! ```text
//! Idle → Validating ─┬─ invalid ──────────────────────→ Idle (inline error)
//!                    └─ valid → Submitting ─┬─ ok ────→ Idle (results shown)
//!                                           └─ failed → Idle (error shown)
//! ```
//!
//! Nothing cancels a submission: starting a new one while another is in
//! flight is allowed and both complete.

use crate::analytics::logger::Outcome;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
}

/// Current phase plus how the previous run ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormState {
    pub phase: FormPhase,
    pub last_outcome: Option<Outcome>,
    /// Completed runs (any outcome).
    pub runs: u32,
}

impl FormState {
    pub fn begin(&mut self) {
        self.phase = FormPhase::Validating;
    }

    pub fn submit(&mut self) {
        self.phase = FormPhase::Submitting;
    }

    /// Return to idle, remembering the outcome.
    pub fn finish(&mut self, outcome: Outcome) {
        self.phase = FormPhase::Idle;
        self.last_outcome = Some(outcome);
        self.runs += 1;
    }

    pub fn is_idle(&self) -> bool {
        self.phase == FormPhase::Idle
    }
}
