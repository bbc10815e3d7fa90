//! Dashboard view-model and the pieces that render into it.
//!
//! - [`model`]: the typed state every handler writes to
//! - [`charts`]: the six chart slots and PNG decoding
//! - [`typing`]: the bot-reply reveal effect
//! - [`terminal`]: prints a [`model::DashboardView`] with colors

pub mod charts;
pub mod model;
pub mod terminal;
pub mod typing;

pub use model::{Alert, AlertLevel, ChatMessage, ChatRole, DashboardView, Section};
