//! Interaction journal and its reporting.
//!
//! Every request a dashboard action sends appends a JSONL line to
//! `~/.churnlens/interaction-log.jsonl`; failed requests carry the error
//! detail there instead of being printed.

pub mod logger;
pub mod reporter;
