pub mod recommendation;
pub mod submission;
pub mod survey;

pub use recommendation::{
    CostTable, ModelMetadata, ModelPhase, ModelStatus, NextVacationSuggestion, Recommendation,
    RecommendationRecord, RecommendationResult, SimilarUser, SimilarityResult,
};
pub use submission::SurveySubmission;
pub use survey::{Field, Profile, Satisfaction, SurveyResponse, OTHER};
