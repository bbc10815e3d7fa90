//! Request and response bodies exchanged with the analytics backend.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body for `POST /chat`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatQuery {
    pub query: String,
    /// Omitted for the segmentation question, which carries no revenue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_revenue: Option<f64>,
}

/// Body for `POST /predict_revenue`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevenueQuery {
    pub current_revenue: f64,
}

/// Body for `POST /filter_by_date`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub month: String,
    pub year: String,
}

/// A CSV file ready to be sent as multipart form data to `/upload`.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvUpload {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub current_revenue: f64,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Response from `POST /chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Response from `POST /upload` and `POST /filter_by_date`.
///
/// A successful analysis carries `data_info`, `insights` and `charts`; a
/// failed one carries `error` and sometimes `warning` (and may still report
/// `data_info` for the rows that were read).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data_info: Option<DataInfo>,
    #[serde(default)]
    pub insights: Option<Insights>,
    /// Chart key → base64-encoded PNG.
    #[serde(default, deserialize_with = "null_as_default")]
    pub charts: HashMap<String, String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub revenue_message: Option<String>,
}

/// Shape summary of the analysed dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DataInfo {
    pub rows: u64,
    pub columns: u64,
    pub missing_values: u64,
    pub data_quality_score: f64,
    #[serde(default)]
    pub column_names: Vec<String>,
}

impl DataInfo {
    /// Whether the dataset has a column named exactly `name`.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }
}

/// Server-computed churn metrics for the loaded dataset.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Insights {
    pub churn_rate: f64,
    pub model_accuracy: f64,
    #[serde(default)]
    pub potential_monthly_loss: Option<f64>,
    #[serde(default)]
    pub potential_yearly_loss: Option<f64>,
    #[serde(default)]
    pub feature_importance: Vec<FeatureImportance>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FeatureImportance {
    #[serde(rename = "Feature")]
    pub feature: String,
    #[serde(rename = "Importance")]
    pub importance: f64,
}

/// Response from `POST /predict_revenue`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RevenuePrediction {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub monthly_loss: f64,
    #[serde(default)]
    pub yearly_loss: f64,
    #[serde(default)]
    pub future_revenue: f64,
    #[serde(default)]
    pub error: Option<String>,
}

/// What `GET /download_report` produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportDownload {
    /// The PDF bytes plus the file name the server suggested, if any.
    Pdf {
        suggested_name: Option<String>,
        bytes: Vec<u8>,
    },
    /// The server answered with `{"error": ...}` instead of a document.
    Refused(String),
}

/// JSON error body returned by `/download_report`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

/// Treat an explicit JSON `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
