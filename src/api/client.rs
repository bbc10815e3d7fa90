//! HTTP client for the churn analytics backend.
//!
//! Talks to the service at `backend.base_url` using the synchronous `ureq`
//! client. The CSV upload goes through `reqwest`'s blocking multipart form,
//! which ureq 2 lacks. Every call blocks the calling thread until the server
//! answers.
use std::io::Read;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use reqwest::blocking::multipart::{Form, Part};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::DashboardApi;
use super::endpoints;
use super::types::{
    AnalysisResponse, ChatQuery, ChatReply, CsvUpload, DateRange, ErrorBody, ReportDownload,
    RevenuePrediction, RevenueQuery,
};
use crate::config::schema::BackendConfig;

/// Upper bound for a downloaded report. Larger bodies are rejected.
const MAX_REPORT_BYTES: u64 = 64 * 1024 * 1024;

/// Synchronous analytics-backend client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    timeout: Option<Duration>,
    agent: ureq::Agent,
}

impl HttpBackend {
    /// Build a client from the resolved `[backend]` section.
    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.base_url, config.timeout())
    }

    /// Build a client for `base_url`, optionally bounding every request.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            agent: builder.build(),
        }
    }

    /// The normalized base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check whether the backend answers at all.
    ///
    /// Any HTTP response counts as reachable; only transport failures
    /// (refused connection, DNS, timeout) do not. Uses a 5 s cap even when
    /// no request timeout is configured.
    pub fn is_reachable(&self) -> bool {
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));
        match self
            .agent
            .get(&self.url("/"))
            .timeout(timeout)
            .call()
        {
            Ok(_) | Err(ureq::Error::Status(..)) => true,
            Err(ureq::Error::Transport(_)) => false,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// POST a JSON body and decode the JSON answer.
    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let result = self.agent.post(&self.url(path)).send_json(body);
        let resp = check_status(path, result)?;
        resp.into_json()
            .with_context(|| format!("failed to parse {path} response"))
    }
}

impl DashboardApi for HttpBackend {
    fn chat(&self, query: &ChatQuery) -> Result<ChatReply> {
        self.post_json(endpoints::CHAT, query)
    }

    fn upload(&self, upload: &CsvUpload) -> Result<AnalysisResponse> {
        let part = Part::bytes(upload.contents.clone())
            .file_name(upload.file_name.clone())
            .mime_str("text/csv")?;
        let form = Form::new()
            .part("file", part)
            .text("current_revenue", upload.current_revenue.to_string());

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .context("failed to build upload client")?;
        let resp = client
            .post(self.url(endpoints::UPLOAD))
            .multipart(form)
            .send()
            .with_context(|| format!("{} request failed", endpoints::UPLOAD))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            bail!(
                "{} returned HTTP {}: {}",
                endpoints::UPLOAD,
                status.as_u16(),
                body.trim()
            );
        }
        resp.json().context("failed to parse /upload response")
    }

    fn predict_revenue(&self, query: &RevenueQuery) -> Result<RevenuePrediction> {
        self.post_json(endpoints::PREDICT_REVENUE, query)
    }

    fn filter_by_date(&self, range: &DateRange) -> Result<AnalysisResponse> {
        self.post_json(endpoints::FILTER_BY_DATE, range)
    }

    fn download_report(&self) -> Result<ReportDownload> {
        let result = self.agent.get(&self.url(endpoints::DOWNLOAD_REPORT)).call();
        let resp = check_status(endpoints::DOWNLOAD_REPORT, result)?;

        if resp.content_type() == "application/json" {
            let body: ErrorBody = resp
                .into_json()
                .context("failed to parse /download_report error body")?;
            return Ok(ReportDownload::Refused(body.error));
        }

        let suggested_name = resp
            .header("Content-Disposition")
            .and_then(attachment_file_name);

        let mut bytes = Vec::new();
        resp.into_reader()
            .take(MAX_REPORT_BYTES + 1)
            .read_to_end(&mut bytes)
            .context("failed to read report body")?;
        if bytes.len() as u64 > MAX_REPORT_BYTES {
            bail!("report exceeds {} bytes", MAX_REPORT_BYTES);
        }

        Ok(ReportDownload::Pdf {
            suggested_name,
            bytes,
        })
    }
}

/// Turn HTTP status errors into errors that carry the response body, so the
/// journal records what the server said.
fn check_status(
    path: &str,
    result: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<ureq::Response> {
    match result {
        Ok(resp) => Ok(resp),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            bail!("{path} returned HTTP {code}: {}", body.trim())
        }
        Err(err) => Err(err).with_context(|| format!("{path} request failed")),
    }
}

/// Extract `filename` from a `Content-Disposition: attachment; filename=...`
/// header value.
fn attachment_file_name(header: &str) -> Option<String> {
    header.split(';').find_map(|param| {
        let (key, value) = param.trim().split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        // Never let the server pick a directory.
        let name = value.rsplit(['/', '\\']).next().unwrap_or(value);
        (!name.is_empty()).then(|| name.to_string())
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_strips_trailing_slash() {
        let client = HttpBackend::new("http://127.0.0.1:5000/", None);
        assert_eq!(client.base_url(), "http://127.0.0.1:5000");
        assert_eq!(client.url("/chat"), "http://127.0.0.1:5000/chat");
    }

    #[test]
    fn client_from_default_config_has_no_timeout() {
        let client = HttpBackend::from_config(&BackendConfig::default());
        assert_eq!(client.timeout, None);
    }

    #[test]
    fn attachment_file_name_parsing() {
        assert_eq!(
            attachment_file_name(
                "attachment; filename=churn_analysis_report_20240101_120000.pdf"
            ),
            Some("churn_analysis_report_20240101_120000.pdf".to_string())
        );
        assert_eq!(
            attachment_file_name("attachment; filename=\"report.pdf\""),
            Some("report.pdf".to_string())
        );
        assert_eq!(
            attachment_file_name("attachment; filename=\"../../etc/report.pdf\""),
            Some("report.pdf".to_string())
        );
        assert_eq!(attachment_file_name("inline"), None);
    }
}
