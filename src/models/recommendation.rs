use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Field;
use crate::error::{AppError, ErrorKind};

/// One ranked neighbour of a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityResult {
    /// 1-based position in the top-K list
    pub rank: usize,
    /// Cosine similarity in [0, 1]
    pub score: f64,
    /// Row of the reference corpus
    pub index: usize,
}

/// Aggregated recommendation for one (vacation type, location type) group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub vacation_type: String,
    pub location_type: String,
    /// Most frequent concrete destination within the group
    pub recommended_location: String,
    pub avg_satisfaction: f64,
    /// Fraction of members sharing the query's next-vacation preference
    pub preference_match: f64,
    /// 0.7 * satisfaction + 0.3 * preference match, on the 1-5 scale
    pub total_score: f64,
    pub sample_count: usize,
    pub confidence: f64,
}

/// Summary of a similar historical respondent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarUser {
    pub rank: usize,
    /// Integer percentage, e.g. "85%"
    pub similarity: String,
    pub vacation_type: String,
    pub location: String,
    pub satisfaction: String,
    pub cost: String,
    pub next_vacation: String,
}

/// Popular next-vacation choice among satisfied respondents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum NextVacationSuggestion {
    AgePreference {
        vacation_type: String,
        target_age: String,
        popularity: u32,
    },
    TransitionPattern {
        vacation_type: String,
        current_vacation: String,
        popularity: u32,
    },
}

/// vacation type -> location type -> most common cost bracket
pub type CostTable = BTreeMap<String, BTreeMap<String, String>>;

/// Everything a successful query produces
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Recommendation {
    pub recommendations: Vec<RecommendationRecord>,
    pub similar_users: Vec<SimilarUser>,
    pub cost_info: CostTable,
    pub next_vacation_suggestions: Vec<NextVacationSuggestion>,
}

/// Outcome of a recommend call. Failures carry an empty payload and a message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub recommendations: Vec<RecommendationRecord>,
    pub similar_users: Vec<SimilarUser>,
    pub cost_info: CostTable,
    pub next_vacation_suggestions: Vec<NextVacationSuggestion>,
}

impl RecommendationResult {
    pub fn failure(error: &AppError) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            recommendations: Vec::new(),
            similar_users: Vec::new(),
            cost_info: CostTable::new(),
            next_vacation_suggestions: Vec::new(),
        }
    }
}

impl From<Recommendation> for RecommendationResult {
    fn from(recommendation: Recommendation) -> Self {
        Self {
            success: true,
            error: None,
            error_kind: None,
            recommendations: recommendation.recommendations,
            similar_users: recommendation.similar_users,
            cost_info: recommendation.cost_info,
            next_vacation_suggestions: recommendation.next_vacation_suggestions,
        }
    }
}

/// Facts about a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub trained_at: DateTime<Utc>,
    pub corpus_size: usize,
    pub dimensions: usize,
    pub features: Vec<Field>,
}

/// Lifecycle phase of the recommender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPhase {
    Untrained,
    Training,
    Loading,
    Trained,
}

/// Snapshot of the recommender lifecycle
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelStatus {
    pub phase: ModelPhase,
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_has_empty_payload() {
        let result = RecommendationResult::failure(&AppError::NotTrained);
        assert!(!result.success);
        assert!(result.recommendations.is_empty());
        assert!(result.similar_users.is_empty());
        assert_eq!(result.error_kind, Some(ErrorKind::NotTrained));
    }

    #[test]
    fn test_failure_serialization() {
        let result = RecommendationResult::failure(&AppError::NotTrained);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_kind"], "not_trained");
        assert_eq!(json["recommendations"], serde_json::json!([]));
    }

    #[test]
    fn test_suggestion_is_tagged_by_category() {
        let suggestion = NextVacationSuggestion::AgePreference {
            vacation_type: "도시 관광".to_string(),
            target_age: "20대".to_string(),
            popularity: 3,
        };
        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["category"], "age_preference");
        assert_eq!(json["target_age"], "20대");
    }
}
