//! churnlens: terminal client for the churn-analytics dashboard backend.

pub mod analytics;
pub mod api;
pub mod cli;
pub mod config;
pub mod controller;
pub mod view;
