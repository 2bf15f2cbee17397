use serde::{Deserialize, Serialize};
use std::fmt;

/// Envelope every Workers API endpoint responds with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    #[serde(alias = "positif", alias = "Positive", alias = "Positif")]
    Positive,
    #[serde(alias = "negatif", alias = "Negative", alias = "Negatif")]
    Negative,
    #[serde(alias = "netral", alias = "Neutral", alias = "Netral")]
    Neutral,
}

impl Sentiment {
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "positive" | "positif" => Some(Sentiment::Positive),
            "negative" | "negatif" => Some(Sentiment::Negative),
            "neutral" | "netral" => Some(Sentiment::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InsightSummary {
    pub id: i64,
    pub word_insight: String,
    pub total_count: i64,
    pub positif_count: i64,
    pub negatif_count: i64,
    pub netral_count: i64,
    pub positif_percentage: f64,
    pub negatif_percentage: f64,
    pub netral_percentage: f64,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardStats {
    pub total_insights: i64,
    pub total_feedback: i64,
    pub positive_ratio: f64,
    pub negative_ratio: f64,
    pub neutral_ratio: f64,
    #[serde(default)]
    pub top_positive_insights: Vec<InsightSummary>,
    #[serde(default)]
    pub top_negative_insights: Vec<InsightSummary>,
    #[serde(default)]
    pub all_insights: Vec<InsightSummary>,
}

/// One feedback sentence with its assigned sentiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeInsight {
    pub id: i64,
    pub employee_name: String,
    pub source: String,
    pub sentence: String,
    #[serde(default)]
    pub word_insight: String,
    pub sentiment: Sentiment,
    pub kota: String,
    #[serde(default)]
    pub witel: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CitySummary {
    pub kota: String,
    #[serde(default)]
    pub witel: Option<String>,
    pub total_count: i64,
    pub positif_count: i64,
    pub negatif_count: i64,
    pub netral_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: i64,
    pub word_insight: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookmark {
    pub word_insight: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Filters the user has applied on a page; stored verbatim in the page context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FilterSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kota: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContext {
    pub page: String,
    pub session_id: String,
    #[serde(default)]
    pub filters: FilterSet,
    #[serde(default)]
    pub ai_conclusion: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConclusion {
    pub page: String,
    pub conclusion: String,
    #[serde(default)]
    pub generated_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConclusionRequest {
    pub session_id: String,
    pub filters: FilterSet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatQuery {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// One question/answer pair kept in the chat history of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatExchange {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentiment_accepts_dataset_labels() {
        let parsed: Vec<Sentiment> =
            serde_json::from_str(r#"["positif","negatif","netral","positive"]"#).unwrap();
        assert_eq!(
            parsed,
            vec![
                Sentiment::Positive,
                Sentiment::Negative,
                Sentiment::Neutral,
                Sentiment::Positive
            ]
        );
        assert_eq!(serde_json::to_string(&Sentiment::Neutral).unwrap(), "\"neutral\"");
    }

    #[test]
    fn envelope_decodes_insight_summary() {
        let body = r#"{
            "success": true,
            "message": "ok",
            "data": [{
                "id": 1, "word_insight": "gaji", "total_count": 10,
                "positif_count": 2, "negatif_count": 7, "netral_count": 1,
                "positif_percentage": 20.0, "negatif_percentage": 70.0,
                "netral_percentage": 10.0, "created_at": "2025-01-02"
            }]
        }"#;
        let parsed: ApiResponse<Vec<InsightSummary>> = serde_json::from_str(body).unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.data[0].word_insight, "gaji");
        assert_eq!(parsed.data[0].negatif_count, 7);
    }

    #[test]
    fn empty_filter_set_serializes_to_empty_object() {
        assert_eq!(serde_json::to_string(&FilterSet::default()).unwrap(), "{}");
    }
}
