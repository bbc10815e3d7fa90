/// Interaction controller tests.
///
/// A recording fake stands in for the backend so every test can check both
/// what was shown and exactly which requests were sent.
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use churnlens::analytics::logger::{Journal, Outcome};
use churnlens::api::DashboardApi;
use churnlens::api::types::{
    AnalysisResponse, ChatQuery, ChatReply, CsvUpload, DataInfo, DateRange, Insights,
    ReportDownload, RevenuePrediction, RevenueQuery,
};
use churnlens::controller::Dashboard;
use churnlens::controller::quick::QuickQuestion;
use churnlens::view::charts::ChartContent;
use churnlens::view::typing::Reveal;
use churnlens::view::{AlertLevel, ChatRole, Section};

// ---------------------------------------------------------------------------
// Recording fake
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Chat(ChatQuery),
    Upload {
        file_name: String,
        current_revenue: f64,
    },
    PredictRevenue(RevenueQuery),
    FilterByDate(DateRange),
    DownloadReport,
}

/// Canned answers; `None` means the exchange fails.
#[derive(Default)]
struct FakeBackend {
    chat: Option<String>,
    upload: Option<AnalysisResponse>,
    prediction: Option<RevenuePrediction>,
    filter: Option<AnalysisResponse>,
    report: Option<ReportDownload>,
    calls: Mutex<Vec<Call>>,
}

impl FakeBackend {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn log(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

fn refused<T>() -> Result<T> {
    Err(anyhow!("connection refused"))
}

impl DashboardApi for FakeBackend {
    fn chat(&self, query: &ChatQuery) -> Result<ChatReply> {
        self.log(Call::Chat(query.clone()));
        match &self.chat {
            Some(response) => Ok(ChatReply {
                response: response.clone(),
            }),
            None => refused(),
        }
    }

    fn upload(&self, upload: &CsvUpload) -> Result<AnalysisResponse> {
        self.log(Call::Upload {
            file_name: upload.file_name.clone(),
            current_revenue: upload.current_revenue,
        });
        self.upload.clone().map_or_else(refused, Ok)
    }

    fn predict_revenue(&self, query: &RevenueQuery) -> Result<RevenuePrediction> {
        self.log(Call::PredictRevenue(*query));
        self.prediction.clone().map_or_else(refused, Ok)
    }

    fn filter_by_date(&self, range: &DateRange) -> Result<AnalysisResponse> {
        self.log(Call::FilterByDate(range.clone()));
        self.filter.clone().map_or_else(refused, Ok)
    }

    fn download_report(&self) -> Result<ReportDownload> {
        self.log(Call::DownloadReport);
        self.report.clone().map_or_else(refused, Ok)
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

const PNG_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

fn analysis(columns: &[&str]) -> AnalysisResponse {
    let mut charts = HashMap::new();
    for key in [
        "churn_distribution",
        "tenure_vs_churn",
        "charges_vs_churn",
        "contract_vs_churn",
        "churn_over_time",
    ] {
        charts.insert(key.to_string(), PNG_BASE64.to_string());
    }

    AnalysisResponse {
        success: true,
        data_info: Some(DataInfo {
            rows: 7043,
            columns: columns.len() as u64,
            missing_values: 11,
            data_quality_score: 99.84,
            column_names: columns.iter().map(|c| c.to_string()).collect(),
        }),
        insights: Some(Insights {
            churn_rate: 0.2654,
            model_accuracy: 0.79,
            potential_monthly_loss: Some(1200.0),
            potential_yearly_loss: Some(14400.0),
            feature_importance: Vec::new(),
        }),
        charts,
        ..Default::default()
    }
}

fn prediction(monthly: f64) -> RevenuePrediction {
    RevenuePrediction {
        success: true,
        monthly_loss: monthly,
        yearly_loss: monthly * 12.0,
        future_revenue: 10_000.0 - monthly,
        ..Default::default()
    }
}

fn csv_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, "tenure,contract,Churn\n1,Month-to-month,Yes\n").unwrap();
    path
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

#[test]
fn chat_sends_normalized_revenue() {
    let api = FakeBackend {
        chat: Some("ok".into()),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    dashboard.send_chat_message("churn rate?", "abc");
    dashboard.send_chat_message("churn rate?", "-5");
    dashboard.send_chat_message("churn rate?", " 1500 ");

    let revenues: Vec<Option<f64>> = dashboard
        .api()
        .calls()
        .into_iter()
        .map(|call| match call {
            Call::Chat(q) => q.current_revenue,
            other => panic!("unexpected call {other:?}"),
        })
        .collect();
    assert_eq!(revenues, vec![Some(0.0), Some(0.0), Some(1500.0)]);
}

#[test]
fn blank_chat_message_sends_nothing() {
    let mut dashboard = Dashboard::new(FakeBackend::default());

    let outcome = dashboard.send_chat_message("   \n", "100");

    assert_eq!(outcome, Outcome::Rejected);
    assert!(dashboard.api().calls().is_empty());
    assert!(dashboard.view().transcript.is_empty());
}

#[test]
fn chat_reply_is_appended_with_line_breaks() {
    let api = FakeBackend {
        chat: Some("Churn rate: 26.54%\nModel accuracy: 79%".into()),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    let outcome = dashboard.send_chat_message("  What is the churn rate? ", "");

    assert_eq!(outcome, Outcome::Succeeded);
    let transcript = &dashboard.view().transcript;
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].role, ChatRole::User);
    assert_eq!(transcript[0].text, "What is the churn rate?");
    assert_eq!(transcript[1].role, ChatRole::Bot);
    assert_eq!(transcript[1].text, "Churn rate: 26.54%<br>Model accuracy: 79%");
    assert!(!dashboard.view().is_typing());
}

#[test]
fn chat_failure_shows_apology() {
    let mut dashboard = Dashboard::new(FakeBackend::default());

    let outcome = dashboard.send_chat_message("hello", "");

    assert_eq!(outcome, Outcome::Failed);
    let last = dashboard.view().transcript.last().unwrap();
    assert_eq!(last.role, ChatRole::Bot);
    assert_eq!(
        last.text,
        "Sorry, I couldn't process your request. Please try again later."
    );
    assert!(!dashboard.view().is_typing());
}

#[test]
fn quick_question_uses_chat_path() {
    let api = FakeBackend {
        chat: Some("Model accuracy: 79%".into()),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    dashboard.ask_quick_question(QuickQuestion::ModelAccuracy, "2000");

    assert_eq!(
        dashboard.api().calls(),
        vec![Call::Chat(ChatQuery {
            query: "How accurate is the churn model?".into(),
            current_revenue: Some(2000.0),
        })]
    );
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

#[test]
fn upload_without_file_sends_nothing() {
    let mut dashboard = Dashboard::new(FakeBackend::default());

    let outcome = dashboard.submit_upload(None, "1000");

    assert_eq!(outcome, Outcome::Rejected);
    assert!(dashboard.api().calls().is_empty());
    let status = dashboard.view().upload_status.as_ref().unwrap();
    assert_eq!(status.level, AlertLevel::Danger);
    assert_eq!(status.text, "Please select a CSV file.");
}

#[test]
fn upload_rejects_non_csv_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = csv_file(dir.path(), "customers.xlsx");
    let mut dashboard = Dashboard::new(FakeBackend::default());

    let outcome = dashboard.submit_upload(Some(&path), "1000");

    assert_eq!(outcome, Outcome::Rejected);
    assert!(dashboard.api().calls().is_empty());
    assert_eq!(
        dashboard.view().upload_status.as_ref().unwrap().text,
        "Please upload a CSV file."
    );
}

#[test]
fn successful_upload_runs_both_follow_ups() {
    let dir = tempfile::tempdir().unwrap();
    let path = csv_file(dir.path(), "customers.csv");
    let api = FakeBackend {
        upload: Some(analysis(&["tenure", "contract", "Churn"])),
        prediction: Some(prediction(1000.0)),
        chat: Some("Month-to-month contracts churn most.".into()),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    let outcome = dashboard.submit_upload(Some(&path), "10000");
    assert_eq!(outcome, Outcome::Succeeded);

    let calls = dashboard.api().calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        Call::Upload {
            file_name: "customers.csv".into(),
            current_revenue: 10000.0,
        }
    );
    assert!(calls.contains(&Call::PredictRevenue(RevenueQuery {
        current_revenue: 10000.0
    })));
    assert!(calls.contains(&Call::Chat(ChatQuery {
        query: "Which customer segment has the highest churn?".into(),
        current_revenue: None,
    })));

    let view = dashboard.view();
    assert_eq!(
        view.upload_status.as_ref().unwrap().text,
        "Analysis complete! View insights below."
    );
    for section in Section::UPLOAD_RESULTS {
        assert!(view.is_visible(section), "{section} should be visible");
    }
    assert!(view.is_visible(Section::Insights));

    let summary = view.summary.as_ref().unwrap();
    assert_eq!(summary.total_customers, "7043");
    assert_eq!(summary.data_quality, "99.84%");
    let insights = view.insights.as_ref().unwrap();
    assert_eq!(insights.churn_rate, "26.54%");
    assert_eq!(insights.monthly_loss, "₹1200.00");

    let impact = view.revenue_prediction.as_ref().unwrap();
    assert_eq!(impact.level, AlertLevel::Info);
    assert_eq!(
        impact.text,
        "Predicted Revenue Impact:\nMonthly Loss: ₹1000.00\nAnnual Loss: ₹12000.00\nFuture Revenue: ₹9000.00"
    );
    assert_eq!(
        view.segmentation.as_ref().unwrap().text,
        "Month-to-month contracts churn most."
    );
}

#[test]
fn missing_chart_key_gets_placeholder_only_in_its_slot() {
    let dir = tempfile::tempdir().unwrap();
    let path = csv_file(dir.path(), "customers.csv");
    let api = FakeBackend {
        upload: Some(analysis(&["tenure"])),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    dashboard.submit_upload(Some(&path), "");

    let charts = dashboard.view().charts.as_ref().unwrap();
    assert_eq!(charts.len(), 6);
    for panel in charts {
        if panel.slot.key == "feature_importance" {
            assert_eq!(panel.content, ChartContent::Unavailable);
            assert_eq!(
                panel.message().unwrap(),
                "Chart data unavailable for feature importance-chart."
            );
        } else {
            assert!(matches!(panel.content, ChartContent::Image(_)));
        }
    }
}

#[test]
fn segmentation_needs_contract_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = csv_file(dir.path(), "customers.csv");
    let api = FakeBackend {
        upload: Some(analysis(&["tenure", "Contract", "Churn"])),
        prediction: Some(prediction(500.0)),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    dashboard.submit_upload(Some(&path), "5000");

    let calls = dashboard.api().calls();
    assert!(!calls.iter().any(|c| matches!(c, Call::Chat(_))));
    assert!(dashboard.view().segmentation.is_none());
}

#[test]
fn zero_revenue_skips_prediction() {
    let dir = tempfile::tempdir().unwrap();
    let path = csv_file(dir.path(), "customers.csv");
    let api = FakeBackend {
        upload: Some(analysis(&["tenure"])),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    dashboard.submit_upload(Some(&path), "not a number");

    let calls = dashboard.api().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        Call::Upload {
            file_name: "customers.csv".into(),
            current_revenue: 0.0,
        }
    );
    let warning = dashboard.view().revenue_prediction.as_ref().unwrap();
    assert_eq!(warning.level, AlertLevel::Warning);
    assert_eq!(warning.text, "Current Revenue is 0");
}

#[test]
fn failed_prediction_does_not_hide_upload_results() {
    let dir = tempfile::tempdir().unwrap();
    let path = csv_file(dir.path(), "customers.csv");
    let api = FakeBackend {
        upload: Some(analysis(&["contract"])),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    let outcome = dashboard.submit_upload(Some(&path), "1000");

    assert_eq!(outcome, Outcome::Succeeded);
    let view = dashboard.view();
    assert!(view.summary.is_some());
    assert_eq!(
        view.revenue_prediction.as_ref().unwrap().text,
        "Error predicting revenue. Please try again."
    );
    assert_eq!(
        view.segmentation.as_ref().unwrap().text,
        "Error fetching segmentation data."
    );
}

#[test]
fn rejected_upload_shows_server_error_and_warning() {
    let dir = tempfile::tempdir().unwrap();
    let path = csv_file(dir.path(), "customers.csv");
    let api = FakeBackend {
        upload: Some(AnalysisResponse {
            success: false,
            error: Some("Missing required column: Churn".into()),
            warning: Some("Only 3 rows found".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    let outcome = dashboard.submit_upload(Some(&path), "1000");

    assert_eq!(outcome, Outcome::ServerError);
    assert_eq!(dashboard.api().calls().len(), 1);
    let view = dashboard.view();
    assert_eq!(
        view.upload_status.as_ref().unwrap().text,
        "Missing required column: Churn"
    );
    assert_eq!(view.insight_warnings[0].text, "Only 3 rows found");
    assert!(!view.is_visible(Section::DataSummary));
}

#[test]
fn transport_failure_uses_fallback_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = csv_file(dir.path(), "customers.csv");
    let mut dashboard = Dashboard::new(FakeBackend::default());

    let outcome = dashboard.submit_upload(Some(&path), "1000");

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(dashboard.api().calls().len(), 1);
    assert_eq!(
        dashboard.view().upload_status.as_ref().unwrap().text,
        "Server error. Please ensure the server is running and try again."
    );
}

// ---------------------------------------------------------------------------
// Date filter
// ---------------------------------------------------------------------------

#[test]
fn date_filter_requires_month_and_year() {
    let mut dashboard = Dashboard::new(FakeBackend::default());

    let outcome = dashboard.submit_date_filter("03", "");

    assert_eq!(outcome, Outcome::Rejected);
    assert!(dashboard.api().calls().is_empty());
    assert_eq!(
        dashboard.view().upload_status.as_ref().unwrap().text,
        "Please select both month and year."
    );
}

#[test]
fn date_filter_refreshes_insights() {
    let api = FakeBackend {
        filter: Some(analysis(&["tenure"])),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    let outcome = dashboard.submit_date_filter("03", "2024");

    assert_eq!(outcome, Outcome::Succeeded);
    assert_eq!(
        dashboard.api().calls(),
        vec![Call::FilterByDate(DateRange {
            month: "03".into(),
            year: "2024".into(),
        })]
    );
    let view = dashboard.view();
    assert_eq!(
        view.upload_status.as_ref().unwrap().text,
        "Date filter applied successfully!"
    );
    assert!(view.insights.is_some());
    assert!(view.is_visible(Section::Insights));
}

#[test]
fn date_filter_shows_server_message() {
    let api = FakeBackend {
        filter: Some(AnalysisResponse {
            success: false,
            error: Some("No data for the selected period".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    assert_eq!(
        dashboard.submit_date_filter("01", "1999"),
        Outcome::ServerError
    );
    assert_eq!(
        dashboard.view().upload_status.as_ref().unwrap().text,
        "No data for the selected period"
    );
}

// ---------------------------------------------------------------------------
// Retention simulator
// ---------------------------------------------------------------------------

#[test]
fn retention_simulation_reduces_baseline_loss() {
    let api = FakeBackend {
        prediction: Some(prediction(1000.0)),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    let outcome = dashboard.submit_retention_simulation("25", "10000");

    assert_eq!(outcome, Outcome::Succeeded);
    let result = dashboard.view().retention_result.as_ref().unwrap();
    assert_eq!(result.level, AlertLevel::Success);
    assert!(result.text.contains("Monthly Loss: ₹750.00"));
    assert!(result.text.contains("Annual Loss: ₹9000.00"));
}

#[test]
fn retention_rejects_bad_percentages_without_request() {
    let mut dashboard = Dashboard::new(FakeBackend::default());

    for bad in ["", "-1", "101", "abc"] {
        assert_eq!(
            dashboard.submit_retention_simulation(bad, "1000"),
            Outcome::Rejected
        );
        assert_eq!(
            dashboard.view().retention_result.as_ref().unwrap().text,
            "Please enter a valid percentage (0-100)."
        );
    }
    assert!(dashboard.api().calls().is_empty());
}

#[test]
fn retention_with_zero_revenue_warns_without_request() {
    let mut dashboard = Dashboard::new(FakeBackend::default());

    let outcome = dashboard.submit_retention_simulation("25", "0");

    assert_eq!(outcome, Outcome::Rejected);
    assert!(dashboard.api().calls().is_empty());
    let result = dashboard.view().retention_result.as_ref().unwrap();
    assert_eq!(result.level, AlertLevel::Warning);
    assert_eq!(result.text, "Current Revenue is 0, no loss predicted.");
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[test]
fn report_is_saved_under_suggested_name() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeBackend {
        report: Some(ReportDownload::Pdf {
            suggested_name: Some("churn_analysis_report_20240301_120000.pdf".into()),
            bytes: b"%PDF-1.4".to_vec(),
        }),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    let (outcome, saved) = dashboard.download_report(dir.path());

    assert_eq!(outcome, Outcome::Succeeded);
    let saved = saved.unwrap();
    assert_eq!(
        saved,
        dir.path().join("churn_analysis_report_20240301_120000.pdf")
    );
    assert_eq!(fs::read(&saved).unwrap(), b"%PDF-1.4");
}

#[test]
fn refused_report_shows_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let api = FakeBackend {
        report: Some(ReportDownload::Refused("No data available".into())),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(api);

    let (outcome, saved) = dashboard.download_report(dir.path());

    assert_eq!(outcome, Outcome::ServerError);
    assert!(saved.is_none());
    let status = dashboard.view().report_status.as_ref().unwrap();
    assert_eq!(status.level, AlertLevel::Danger);
    assert_eq!(status.text, "No data available");
}

// ---------------------------------------------------------------------------
// Journal and forms
// ---------------------------------------------------------------------------

#[test]
fn journal_records_sent_requests_only() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::at(dir.path().join("log.jsonl"));
    let mut dashboard = Dashboard::new(FakeBackend::default()).with_journal(journal.clone());

    dashboard.send_chat_message("", "");
    dashboard.submit_retention_simulation("150", "1000");
    dashboard.send_chat_message("hello", "");

    let entries = journal.read_all();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].action, "chat");
    assert_eq!(entries[0].endpoint, "/chat");
    assert_eq!(entries[0].outcome, Outcome::Failed);
    assert!(entries[0].detail.as_deref().unwrap().contains("connection refused"));
}

#[test]
fn journal_keeps_server_error_as_detail() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::at(dir.path().join("log.jsonl"));
    let backend = FakeBackend {
        chat: Some("ok".into()),
        prediction: Some(RevenuePrediction {
            success: false,
            error: Some("Revenue prediction failed: no model".into()),
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut dashboard = Dashboard::new(backend).with_journal(journal.clone());

    dashboard.send_chat_message("hello", "");
    dashboard.submit_retention_simulation("10", "1000");

    let entries = journal.read_all();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].outcome, Outcome::Succeeded);
    assert_eq!(entries[0].detail, None);
    assert_eq!(entries[1].action, "retention_simulation");
    assert_eq!(entries[1].outcome, Outcome::ServerError);
    assert_eq!(
        entries[1].detail.as_deref(),
        Some("Revenue prediction failed: no model")
    );
}

#[test]
fn forms_return_to_idle_after_every_outcome() {
    let mut dashboard = Dashboard::new(FakeBackend::default());

    dashboard.send_chat_message("hi", "");
    dashboard.submit_date_filter("", "");

    let forms = &dashboard.view().forms;
    assert!(forms.chat.is_idle());
    assert_eq!(forms.chat.last_outcome, Some(Outcome::Failed));
    assert!(forms.date_filter.is_idle());
    assert_eq!(forms.date_filter.last_outcome, Some(Outcome::Rejected));
}

// ---------------------------------------------------------------------------
// Typing reveal
// ---------------------------------------------------------------------------

#[test]
fn reveal_takes_line_breaks_in_one_step() {
    let steps: Vec<&str> = Reveal::new("Hi<br>there").collect();
    assert_eq!(steps, vec!["H", "i", "<br>", "t", "h", "e", "r", "e"]);
}
