//! Analytics backend API.
//!
//! The dashboard talks to five endpoints:
//!
//! | Endpoint           | Method | Body                               |
//! |--------------------|--------|------------------------------------|
//! | `/chat`            | POST   | JSON `{query, current_revenue}`    |
//! | `/upload`          | POST   | multipart `file`, `current_revenue`|
//! | `/predict_revenue` | POST   | JSON `{current_revenue}`           |
//! | `/filter_by_date`  | POST   | JSON `{month, year}`               |
//! | `/download_report` | GET    | none                               |
//!
//! [`DashboardApi`] is the seam between the interaction controller and the
//! network: [`client::HttpBackend`] is the real implementation, tests plug in
//! recording fakes.
use anyhow::Result;

pub mod client;
pub mod types;

pub use client::HttpBackend;
use types::{
    AnalysisResponse, ChatQuery, ChatReply, CsvUpload, DateRange, ReportDownload,
    RevenuePrediction, RevenueQuery,
};

/// One method per backend endpoint.
///
/// `Err` means the exchange itself failed: transport error, non-2xx status or
/// an undecodable body. A server-side `success: false` is a successful
/// exchange and comes back as `Ok`.
///
/// Implementations must be `Sync` because the upload follow-up requests run
/// on two scoped threads at once.
pub trait DashboardApi: Sync {
    fn chat(&self, query: &ChatQuery) -> Result<ChatReply>;
    fn upload(&self, upload: &CsvUpload) -> Result<AnalysisResponse>;
    fn predict_revenue(&self, query: &RevenueQuery) -> Result<RevenuePrediction>;
    fn filter_by_date(&self, range: &DateRange) -> Result<AnalysisResponse>;
    fn download_report(&self) -> Result<ReportDownload>;
}

/// Endpoint paths, used for journaling.
pub mod endpoints {
    pub const CHAT: &str = "/chat";
    pub const UPLOAD: &str = "/upload";
    pub const PREDICT_REVENUE: &str = "/predict_revenue";
    pub const FILTER_BY_DATE: &str = "/filter_by_date";
    pub const DOWNLOAD_REPORT: &str = "/download_report";
}
