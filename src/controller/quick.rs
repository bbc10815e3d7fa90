//! Preset chatbot questions.
//!
//! Each topic is phrased so it hits one of the backend's chat intents
//! (churn rate, revenue, reasons, reduce churn, accuracy, trend, segment).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickQuestion {
    ChurnRate,
    RevenueImpact,
    ChurnReasons,
    Recommendations,
    ModelAccuracy,
    ChurnTrend,
    CustomerSegments,
}

impl QuickQuestion {
    pub const ALL: [QuickQuestion; 7] = [
        Self::ChurnRate,
        Self::RevenueImpact,
        Self::ChurnReasons,
        Self::Recommendations,
        Self::ModelAccuracy,
        Self::ChurnTrend,
        Self::CustomerSegments,
    ];

    /// The text sent to `/chat`.
    pub fn question(self) -> &'static str {
        match self {
            Self::ChurnRate => "What is the current churn rate?",
            Self::RevenueImpact => "How much revenue are we losing to churn?",
            Self::ChurnReasons => "What are the main reasons for churn?",
            Self::Recommendations => "How can we reduce churn?",
            Self::ModelAccuracy => "How accurate is the churn model?",
            Self::ChurnTrend => "What is the churn trend?",
            Self::CustomerSegments => "Which customer segment has the highest churn?",
        }
    }

    /// CLI topic name.
    pub fn topic(self) -> &'static str {
        match self {
            Self::ChurnRate => "churn-rate",
            Self::RevenueImpact => "revenue",
            Self::ChurnReasons => "reasons",
            Self::Recommendations => "recommendations",
            Self::ModelAccuracy => "accuracy",
            Self::ChurnTrend => "trend",
            Self::CustomerSegments => "segments",
        }
    }

    /// Parse a CLI topic name (case-insensitive, `_` or `-`).
    pub fn from_topic(topic: &str) -> Option<Self> {
        let normalized = topic.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL.into_iter().find(|q| q.topic() == normalized)
    }
}
