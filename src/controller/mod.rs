//! Interaction controller.
//!
//! [`Dashboard`] has one method per user action. Each method validates its
//! input, sends exactly the requests that action needs through a
//! [`DashboardApi`], and writes the outcome into the [`DashboardView`]:
//!
//! 1. **Invalid input**: inline error, no request.
//! 2. **Transport failure**: one fixed fallback message per action. The
//!    error detail goes to the interaction journal.
//! 3. **`success: false`**: the server's message, shown like (1).
//!
//! Handlers run to completion on the calling thread. The only concurrency is
//! the pair of follow-up requests after a successful upload, which run side
//! by side and are applied once both have returned.

pub mod form;
pub mod quick;
pub mod retention;
pub mod validation;

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use anyhow::Result;
use chrono::Local;

use crate::analytics::logger::{InteractionEntry, Journal, Outcome};
use crate::api::DashboardApi;
use crate::api::endpoints;
use crate::api::types::{
    AnalysisResponse, ChatQuery, ChatReply, CsvUpload, DateRange, ReportDownload,
    RevenuePrediction, RevenueQuery,
};
use crate::config::schema::DEFAULT_SEGMENTATION_QUESTION;
use crate::view::charts::render_charts;
use crate::view::model::{
    Alert, ChatMessage, DashboardView, InsightFields, Section, SummaryFields, format_rupees,
};
use crate::view::typing::to_markup;

use quick::QuickQuestion;
use retention::simulate_retention;
use validation::{
    ValidationError, normalize_revenue, validate_csv_path, validate_date, validate_message,
    validate_percentage,
};

// Fallback copy shown when a request fails outright.
const CHAT_FAILED: &str = "Sorry, I couldn't process your request. Please try again later.";
const UPLOAD_FAILED: &str = "Server error. Please ensure the server is running and try again.";
const UPLOAD_REJECTED: &str = "Analysis failed. Please check your data.";
const PREDICTION_FAILED: &str = "Error predicting revenue. Please try again.";
const PREDICTION_REJECTED: &str = "Revenue prediction failed.";
const SEGMENTATION_FAILED: &str = "Error fetching segmentation data.";
const FILTER_FAILED: &str = "Error applying date filter. Please try again.";
const FILTER_REJECTED: &str = "Failed to apply date filter.";
const RETENTION_FAILED: &str = "Error simulating retention strategy.";
const RETENTION_REJECTED: &str = "Retention simulation failed.";
const REPORT_FAILED: &str = "Error downloading report. Please try again.";

/// The dashboard session: API seam, view-model and journal.
pub struct Dashboard<A> {
    api: A,
    view: DashboardView,
    journal: Journal,
    segmentation_question: String,
}

impl<A: DashboardApi> Dashboard<A> {
    /// A dashboard with an empty view and journaling disabled.
    pub fn new(api: A) -> Self {
        Self {
            api,
            view: DashboardView::default(),
            journal: Journal::disabled(),
            segmentation_question: DEFAULT_SEGMENTATION_QUESTION.to_string(),
        }
    }

    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = journal;
        self
    }

    pub fn with_segmentation_question(mut self, question: impl Into<String>) -> Self {
        self.segmentation_question = question.into();
        self
    }

    pub fn view(&self) -> &DashboardView {
        &self.view
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    /// Send a chat message and append the reply to the transcript.
    ///
    /// Blank input is ignored. The reply is stored with `<br>` line breaks;
    /// on failure a fixed apology replaces it.
    pub fn send_chat_message(&mut self, text: &str, revenue_input: &str) -> Outcome {
        self.view.forms.chat.begin();
        let message = match validate_message(text) {
            Ok(message) => message.to_string(),
            Err(_) => {
                self.view.forms.chat.finish(Outcome::Rejected);
                return Outcome::Rejected;
            }
        };

        self.view.transcript.push(ChatMessage::user(message.as_str()));
        self.view.transcript.push(ChatMessage::typing());

        let query = ChatQuery {
            query: message,
            current_revenue: Some(normalize_revenue(revenue_input)),
        };

        self.view.forms.chat.submit();
        let (result, latency_ms) = timed(|| self.api.chat(&query));
        self.view.remove_typing();

        let outcome = match result {
            Ok(reply) => {
                self.view
                    .transcript
                    .push(ChatMessage::bot(to_markup(&reply.response)));
                self.record("chat", endpoints::CHAT, Outcome::Succeeded, latency_ms, None);
                Outcome::Succeeded
            }
            Err(err) => {
                self.view.transcript.push(ChatMessage::bot(CHAT_FAILED));
                self.record(
                    "chat",
                    endpoints::CHAT,
                    Outcome::Failed,
                    latency_ms,
                    Some(format!("{err:#}")),
                );
                Outcome::Failed
            }
        };

        self.view.forms.chat.finish(outcome);
        outcome
    }

    /// Ask one of the preset questions.
    pub fn ask_quick_question(&mut self, question: QuickQuestion, revenue_input: &str) -> Outcome {
        self.send_chat_message(question.question(), revenue_input)
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Upload a CSV for analysis, then run the follow-up requests.
    ///
    /// Steps, in order:
    /// 1. validate the file selection and normalize revenue;
    /// 2. upload and apply the analysis;
    /// 3. if revenue > 0, predict revenue; if the dataset has a `contract`
    ///    column, ask the segmentation question. These two run concurrently.
    pub fn submit_upload(&mut self, file: Option<&Path>, revenue_input: &str) -> Outcome {
        self.view.forms.upload.begin();

        let path = match validate_csv_path(file) {
            Ok(path) => path,
            Err(err) => return self.reject_upload(err.to_string()),
        };

        let revenue = normalize_revenue(revenue_input);
        if revenue == 0.0 {
            self.view.revenue_prediction = Some(Alert::warning("Current Revenue is 0"));
        }

        let contents = match fs::read(path) {
            Ok(contents) => contents,
            Err(_) => return self.reject_upload(format!("Could not read {}.", path.display())),
        };
        let upload = CsvUpload {
            file_name: file_name_of(path),
            contents,
            current_revenue: revenue,
        };

        self.view.upload_status = Some(Alert::info("Analyzing your data..."));
        self.view.forms.upload.submit();
        let (result, latency_ms) = timed(|| self.api.upload(&upload));

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.view.upload_status = Some(Alert::danger(UPLOAD_FAILED));
                self.record(
                    "upload",
                    endpoints::UPLOAD,
                    Outcome::Failed,
                    latency_ms,
                    Some(format!("{err:#}")),
                );
                self.view.forms.upload.finish(Outcome::Failed);
                return Outcome::Failed;
            }
        };

        if !response.success {
            let message = response
                .error
                .clone()
                .unwrap_or_else(|| UPLOAD_REJECTED.to_string());
            self.view.upload_status = Some(Alert::danger(message.as_str()));
            if let Some(warning) = &response.warning {
                self.view.insight_warnings.push(Alert::warning(warning.as_str()));
                self.view.show(Section::Insights);
            }
            let detail = match &response.warning {
                Some(warning) => format!("{message} ({warning})"),
                None => message.clone(),
            };
            self.record(
                "upload",
                endpoints::UPLOAD,
                Outcome::ServerError,
                latency_ms,
                Some(detail),
            );
            self.view.forms.upload.finish(Outcome::ServerError);
            return Outcome::ServerError;
        }

        self.record("upload", endpoints::UPLOAD, Outcome::Succeeded, latency_ms, None);
        self.view.upload_status = Some(Alert::success("Analysis complete! View insights below."));
        for section in Section::UPLOAD_RESULTS {
            self.view.show(section);
        }
        self.view.show(Section::Insights);
        self.apply_analysis(&response);

        if let Some(message) = &response.revenue_message {
            self.view.revenue_prediction = Some(Alert::warning(message.as_str()));
        }

        let wants_segmentation = response
            .data_info
            .as_ref()
            .is_some_and(|info| info.has_column("contract"));
        self.run_follow_ups(revenue, wants_segmentation);

        self.view.forms.upload.finish(Outcome::Succeeded);
        Outcome::Succeeded
    }

    fn reject_upload(&mut self, message: String) -> Outcome {
        self.view.upload_status = Some(Alert::danger(message));
        self.view.forms.upload.finish(Outcome::Rejected);
        Outcome::Rejected
    }

    /// Revenue prediction and segmentation, issued together after the upload
    /// result is on screen. Results are applied prediction first.
    fn run_follow_ups(&mut self, revenue: f64, wants_segmentation: bool) {
        if revenue <= 0.0 && !wants_segmentation {
            return;
        }

        let api = &self.api;
        let segmentation_query = ChatQuery {
            query: self.segmentation_question.clone(),
            current_revenue: None,
        };
        let revenue_query = RevenueQuery {
            current_revenue: revenue,
        };

        let (prediction, segmentation) = thread::scope(|scope| {
            let prediction = (revenue > 0.0)
                .then(|| scope.spawn(|| timed(|| api.predict_revenue(&revenue_query))));
            let segmentation = wants_segmentation
                .then(|| scope.spawn(|| timed(|| api.chat(&segmentation_query))));

            (
                prediction.map(|handle| join_request(handle.join())),
                segmentation.map(|handle| join_request(handle.join())),
            )
        });

        if let Some((result, latency_ms)) = prediction {
            self.apply_prediction(result, latency_ms);
        }
        if let Some((result, latency_ms)) = segmentation {
            self.apply_segmentation(result, latency_ms);
        }
    }

    fn apply_prediction(&mut self, result: Result<RevenuePrediction>, latency_ms: u64) {
        let (alert, outcome, detail) = match result {
            Ok(prediction) if prediction.success => (
                Alert::info(format!(
                    "Predicted Revenue Impact:\nMonthly Loss: {}\nAnnual Loss: {}\nFuture Revenue: {}",
                    format_rupees(prediction.monthly_loss),
                    format_rupees(prediction.yearly_loss),
                    format_rupees(prediction.future_revenue),
                )),
                Outcome::Succeeded,
                None,
            ),
            Ok(prediction) => {
                let message = prediction
                    .error
                    .unwrap_or_else(|| PREDICTION_REJECTED.to_string());
                (
                    Alert::danger(message.as_str()),
                    Outcome::ServerError,
                    Some(message),
                )
            }
            Err(err) => (
                Alert::danger(PREDICTION_FAILED),
                Outcome::Failed,
                Some(format!("{err:#}")),
            ),
        };
        self.view.revenue_prediction = Some(alert);
        self.record(
            "revenue_prediction",
            endpoints::PREDICT_REVENUE,
            outcome,
            latency_ms,
            detail,
        );
    }

    fn apply_segmentation(&mut self, result: Result<ChatReply>, latency_ms: u64) {
        let (alert, outcome, detail) = match result {
            Ok(reply) => (Alert::info(reply.response), Outcome::Succeeded, None),
            Err(err) => (
                Alert::danger(SEGMENTATION_FAILED),
                Outcome::Failed,
                Some(format!("{err:#}")),
            ),
        };
        self.view.segmentation = Some(alert);
        self.record("segmentation", endpoints::CHAT, outcome, latency_ms, detail);
    }

    /// Fill the summary, insight and chart panels from an analysis result.
    ///
    /// Charts are only redrawn when insights are present.
    fn apply_analysis(&mut self, response: &AnalysisResponse) {
        if let Some(info) = &response.data_info {
            self.view.summary = Some(SummaryFields::from_data_info(info));
        }
        if let Some(insights) = &response.insights {
            self.view.insights = Some(InsightFields::from_insights(insights));
            self.view.charts = Some(render_charts(&response.charts));
            self.view.show(Section::Insights);
        }
    }

    // -----------------------------------------------------------------------
    // Date filter
    // -----------------------------------------------------------------------

    /// Re-run the analysis on rows from one month.
    pub fn submit_date_filter(&mut self, month: &str, year: &str) -> Outcome {
        self.view.forms.date_filter.begin();

        let range = match validate_date(month, year) {
            Ok((month, year)) => DateRange {
                month: month.to_string(),
                year: year.to_string(),
            },
            Err(err) => {
                self.view.upload_status = Some(Alert::danger(err.to_string()));
                self.view.forms.date_filter.finish(Outcome::Rejected);
                return Outcome::Rejected;
            }
        };

        self.view.upload_status = Some(Alert::info("Applying date filter..."));
        self.view.forms.date_filter.submit();
        let (result, latency_ms) = timed(|| self.api.filter_by_date(&range));

        let outcome = match result {
            Ok(response) if response.success => {
                self.view.upload_status =
                    Some(Alert::success("Date filter applied successfully!"));
                self.apply_analysis(&response);
                self.view.show(Section::Insights);
                self.record(
                    "date_filter",
                    endpoints::FILTER_BY_DATE,
                    Outcome::Succeeded,
                    latency_ms,
                    None,
                );
                Outcome::Succeeded
            }
            Ok(response) => {
                let message = response
                    .error
                    .unwrap_or_else(|| FILTER_REJECTED.to_string());
                self.view.upload_status = Some(Alert::danger(message.as_str()));
                self.record(
                    "date_filter",
                    endpoints::FILTER_BY_DATE,
                    Outcome::ServerError,
                    latency_ms,
                    Some(message),
                );
                Outcome::ServerError
            }
            Err(err) => {
                self.view.upload_status = Some(Alert::danger(FILTER_FAILED));
                self.record(
                    "date_filter",
                    endpoints::FILTER_BY_DATE,
                    Outcome::Failed,
                    latency_ms,
                    Some(format!("{err:#}")),
                );
                Outcome::Failed
            }
        };

        self.view.forms.date_filter.finish(outcome);
        outcome
    }

    // -----------------------------------------------------------------------
    // Retention simulator
    // -----------------------------------------------------------------------

    /// Fetch the baseline loss and show it reduced by `reduction_input` %.
    pub fn submit_retention_simulation(
        &mut self,
        reduction_input: &str,
        revenue_input: &str,
    ) -> Outcome {
        self.view.forms.retention.begin();

        let reduction_pct = match validate_percentage(reduction_input) {
            Ok(pct) => pct,
            Err(err) => {
                self.view.retention_result = Some(Alert::danger(err.to_string()));
                self.view.forms.retention.finish(Outcome::Rejected);
                return Outcome::Rejected;
            }
        };

        let revenue = normalize_revenue(revenue_input);
        if revenue == 0.0 {
            self.view.retention_result =
                Some(Alert::warning(ValidationError::ZeroRevenue.to_string()));
            self.view.forms.retention.finish(Outcome::Rejected);
            return Outcome::Rejected;
        }

        self.view.retention_result = Some(Alert::info("Simulating retention strategy..."));
        self.view.forms.retention.submit();
        let query = RevenueQuery {
            current_revenue: revenue,
        };
        let (result, latency_ms) = timed(|| self.api.predict_revenue(&query));

        let (alert, outcome, detail) = match result {
            Ok(baseline) if baseline.success => {
                let simulation = simulate_retention(baseline.monthly_loss, reduction_pct);
                (Alert::success(simulation.summary()), Outcome::Succeeded, None)
            }
            Ok(baseline) => {
                let message = baseline
                    .error
                    .unwrap_or_else(|| RETENTION_REJECTED.to_string());
                (
                    Alert::danger(message.as_str()),
                    Outcome::ServerError,
                    Some(message),
                )
            }
            Err(err) => (
                Alert::danger(RETENTION_FAILED),
                Outcome::Failed,
                Some(format!("{err:#}")),
            ),
        };

        self.view.retention_result = Some(alert);
        self.record(
            "retention_simulation",
            endpoints::PREDICT_REVENUE,
            outcome,
            latency_ms,
            detail,
        );
        self.view.forms.retention.finish(outcome);
        outcome
    }

    // -----------------------------------------------------------------------
    // Report
    // -----------------------------------------------------------------------

    /// Download the PDF report into `out_dir`.
    ///
    /// Returns the outcome and, on success, where the file was written.
    pub fn download_report(&mut self, out_dir: &Path) -> (Outcome, Option<PathBuf>) {
        self.view.forms.report.begin();
        self.view.report_status = Some(Alert::info("Generating report..."));
        self.view.forms.report.submit();
        let (result, latency_ms) = timed(|| self.api.download_report());

        let (alert, outcome, detail, saved) = match result {
            Ok(ReportDownload::Pdf {
                suggested_name,
                bytes,
            }) => {
                let name = suggested_name.unwrap_or_else(default_report_name);
                let path = out_dir.join(name);
                match fs::create_dir_all(out_dir).and_then(|_| fs::write(&path, &bytes)) {
                    Ok(()) => (
                        Alert::success(format!("Report saved to {}", path.display())),
                        Outcome::Succeeded,
                        None,
                        Some(path),
                    ),
                    Err(err) => (
                        Alert::danger(format!("Could not save report: {err}")),
                        Outcome::Failed,
                        Some(format!("writing {}: {err}", path.display())),
                        None,
                    ),
                }
            }
            Ok(ReportDownload::Refused(message)) => (
                Alert::danger(message.as_str()),
                Outcome::ServerError,
                Some(message),
                None,
            ),
            Err(err) => (
                Alert::danger(REPORT_FAILED),
                Outcome::Failed,
                Some(format!("{err:#}")),
                None,
            ),
        };

        self.view.report_status = Some(alert);
        self.record(
            "report",
            endpoints::DOWNLOAD_REPORT,
            outcome,
            latency_ms,
            detail,
        );
        self.view.forms.report.finish(outcome);
        (outcome, saved)
    }

    // -----------------------------------------------------------------------
    // Journal
    // -----------------------------------------------------------------------

    fn record(
        &self,
        action: &str,
        endpoint: &str,
        outcome: Outcome,
        latency_ms: u64,
        detail: Option<String>,
    ) {
        let mut entry = InteractionEntry::new(action, endpoint, outcome).latency(latency_ms);
        if let Some(detail) = detail {
            entry = entry.detail(detail);
        }
        self.journal.record(&entry);
    }
}

/// Run a request and measure it.
fn timed<T>(request: impl FnOnce() -> Result<T>) -> (Result<T>, u64) {
    let start = Instant::now();
    let result = request();
    (result, start.elapsed().as_millis() as u64)
}

/// A panicked worker counts as a failed request.
fn join_request<T>(joined: thread::Result<(Result<T>, u64)>) -> (Result<T>, u64) {
    joined.unwrap_or_else(|_| (Err(anyhow::anyhow!("request worker panicked")), 0))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `churn_analysis_report_YYYYmmdd_HHMMSS.pdf` in local time.
pub fn default_report_name() -> String {
    format!(
        "churn_analysis_report_{}.pdf",
        Local::now().format("%Y%m%d_%H%M%S")
    )
}
