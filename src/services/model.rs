use chrono::Utc;

use super::{
    encoder::{FeatureVector, Vocabulary},
    patterns::{PatternTables, MAX_RECOMMENDATIONS},
    similarity,
};
use crate::{
    error::{AppError, AppResult},
    models::{
        Field, ModelMetadata, Profile, Recommendation, SimilarUser, SimilarityResult,
        SurveyResponse,
    },
};

/// Similar respondents shown per recommendation
pub const SIMILAR_USERS_SHOWN: usize = 3;

const NOT_AVAILABLE: &str = "n/a";

/// Immutable trained state: vocabulary, encoded corpus and learned patterns
///
/// Retraining builds a new value instead of mutating this one.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModel {
    pub(crate) vocabulary: Vocabulary,
    pub(crate) matrix: Vec<FeatureVector>,
    pub(crate) corpus: Vec<SurveyResponse>,
    pub(crate) patterns: PatternTables,
    pub(crate) metadata: ModelMetadata,
}

impl TrainedModel {
    /// Fits the vocabulary, encodes the corpus and learns grouped patterns
    pub fn train(corpus: Vec<SurveyResponse>, features: &[String]) -> AppResult<Self> {
        let vocabulary = Vocabulary::fit(&corpus, features)?;
        let matrix = vocabulary.encode_corpus(&corpus);
        let patterns = PatternTables::learn(&corpus);

        let metadata = ModelMetadata {
            trained_at: Utc::now(),
            corpus_size: corpus.len(),
            dimensions: vocabulary.dimensions(),
            features: vocabulary.features().to_vec(),
        };

        tracing::info!(
            corpus_size = metadata.corpus_size,
            dimensions = metadata.dimensions,
            groups = patterns.vacation.group_count(),
            "Model trained"
        );

        Ok(Self {
            vocabulary,
            matrix,
            corpus,
            patterns,
            metadata,
        })
    }

    /// Retrains on the current corpus plus one new response
    pub fn with_response(&self, response: SurveyResponse, features: &[String]) -> AppResult<Self> {
        let mut corpus = self.corpus.clone();
        corpus.push(response);
        Self::train(corpus, features)
    }

    /// Reassembles a model from persisted parts, checking they agree
    pub(crate) fn from_parts(
        vocabulary: Vocabulary,
        matrix: Vec<FeatureVector>,
        corpus: Vec<SurveyResponse>,
        patterns: PatternTables,
        metadata: ModelMetadata,
    ) -> Result<Self, String> {
        if matrix.len() != corpus.len() {
            return Err(format!(
                "matrix has {} rows but corpus has {} responses",
                matrix.len(),
                corpus.len()
            ));
        }
        if let Some(row) = matrix.iter().find(|row| row.len() != vocabulary.dimensions()) {
            return Err(format!(
                "matrix row width {} does not match vocabulary width {}",
                row.len(),
                vocabulary.dimensions()
            ));
        }
        if vocabulary.encode_corpus(&corpus) != matrix {
            return Err("matrix does not match the encoded corpus".to_string());
        }
        if PatternTables::learn(&corpus) != patterns {
            return Err("pattern tables do not match the corpus".to_string());
        }
        if metadata.corpus_size != corpus.len()
            || metadata.dimensions != vocabulary.dimensions()
            || metadata.features != vocabulary.features()
        {
            return Err("metadata does not describe the stored corpus".to_string());
        }

        Ok(Self {
            vocabulary,
            matrix,
            corpus,
            patterns,
            metadata,
        })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn corpus(&self) -> &[SurveyResponse] {
        &self.corpus
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Top-K neighbours of the profile, keeping only satisfied respondents
    pub fn similar(&self, profile: &Profile, top_k: usize) -> AppResult<Vec<SimilarityResult>> {
        if !self.vocabulary.covers(profile) {
            let features: Vec<&str> = self
                .vocabulary
                .features()
                .iter()
                .map(|f| f.name())
                .collect();
            return Err(AppError::Validation(format!(
                "profile answers none of the matching features ({})",
                features.join(", ")
            )));
        }

        let query = self.vocabulary.encode(profile);
        if query.is_zero() {
            tracing::debug!("Query shares no category with the corpus vocabulary");
        }

        let ranked = similarity::rank(&query, &self.matrix, top_k);
        Ok(similarity::retain_satisfied(ranked, &self.corpus))
    }

    /// Full recommendation for one profile
    pub fn recommend(&self, profile: &Profile, top_k: usize) -> AppResult<Recommendation> {
        let similar = self.similar(profile, top_k)?;

        let recommendations = self
            .patterns
            .vacation
            .recommend(profile.category(Field::NextVacation), MAX_RECOMMENDATIONS);

        let similar_users = similar
            .iter()
            .take(SIMILAR_USERS_SHOWN)
            .filter_map(|result| {
                let row = self.corpus.get(result.index)?;
                Some(SimilarUser {
                    rank: result.rank,
                    similarity: similarity::as_percentage(result.score),
                    vacation_type: row.category(Field::VacationType).to_string(),
                    location: row.resolved_destination().to_string(),
                    satisfaction: row
                        .satisfaction
                        .map(|s| s.label().to_string())
                        .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
                    cost: row.category(Field::Cost).to_string(),
                    next_vacation: row.category(Field::NextVacation).to_string(),
                })
            })
            .collect();

        Ok(Recommendation {
            recommendations,
            similar_users,
            cost_info: self.patterns.cost.lookup_table(),
            next_vacation_suggestions: self.patterns.preference.suggestions(),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::Satisfaction;

    pub(crate) fn features() -> Vec<String> {
        [
            "age_group",
            "gender",
            "companion",
            "location_type",
            "vacation_type",
            "next_vacation",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn profile(
        age: &str,
        gender: &str,
        companion: &str,
        location_type: &str,
        vacation: &str,
        next: &str,
    ) -> Profile {
        Profile::default()
            .with(Field::AgeGroup, age)
            .with(Field::Gender, gender)
            .with(Field::Companion, companion)
            .with(Field::LocationType, location_type)
            .with(Field::VacationType, vacation)
            .with(Field::NextVacation, next)
    }

    fn row(profile: Profile, destination: &str, satisfaction: u8) -> SurveyResponse {
        SurveyResponse::new(
            profile
                .with(Field::Destination, destination)
                .with(Field::Cost, "30만~50만 원"),
            Some(Satisfaction::try_from(satisfaction).unwrap()),
        )
    }

    /// Ten respondents; the first six went to the beach domestically and
    /// liked it.
    pub(crate) fn beach_corpus() -> Vec<SurveyResponse> {
        let beach = |gender: &str, companion: &str, satisfaction: u8| {
            row(
                profile("20대", gender, companion, "domestic", "beach", "city"),
                "부산",
                satisfaction,
            )
        };
        vec![
            beach("여성", "가족", 5),
            beach("여성", "친구", 4),
            beach("남성", "가족", 5),
            beach("여성", "가족", 4),
            beach("남성", "친구", 5),
            beach("여성", "연인", 4),
            row(
                profile("50대", "남성", "혼자", "international", "mountain", "food"),
                "스위스",
                2,
            ),
            row(
                profile("50대", "남성", "동호회", "international", "mountain", "food"),
                "네팔",
                2,
            ),
            row(
                profile("40대", "여성", "직장 동료", "domestic", "city", "rest"),
                "서울",
                1,
            ),
            row(
                profile("60대 이상", "남성", "혼자", "domestic", "city", "rest"),
                "대구",
                3,
            ),
        ]
    }

    #[test]
    fn test_beach_profile_finds_the_beach_goers() {
        let model = TrainedModel::train(beach_corpus(), &features()).unwrap();

        // matches the beach rows on 5 of 6 features (age differs)
        let query = profile("30대", "여성", "가족", "domestic", "beach", "city");
        let similar = model.similar(&query, 6).unwrap();

        assert_eq!(similar.len(), 6);
        let mut indices: Vec<usize> = similar.iter().map(|r| r.index).collect();
        indices.sort_unstable();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5]);

        let recommendation = model.recommend(&query, 5).unwrap();
        let top = &recommendation.recommendations[0];
        assert_eq!(top.vacation_type, "beach");
        assert_eq!(top.location_type, "domestic");
        assert_eq!(top.recommended_location, "부산");
        assert_eq!(top.sample_count, 6);
        assert_eq!(recommendation.recommendations.len(), 1);
    }

    #[test]
    fn test_exact_corpus_match_scores_one() {
        let corpus = beach_corpus();
        let model = TrainedModel::train(corpus.clone(), &features()).unwrap();

        let similar = model.similar(&corpus[0].profile, 5).unwrap();
        assert_eq!(similar[0].index, 0);
        assert_eq!(similar[0].score, 1.0);
        // row 3 answers identically to row 0
        assert_eq!(similar[1].index, 3);
        assert_eq!(similar[1].score, 1.0);
    }

    #[test]
    fn test_dissatisfied_neighbours_are_filtered_after_ranking() {
        let model = TrainedModel::train(beach_corpus(), &features()).unwrap();
        let query = profile("50대", "남성", "혼자", "international", "mountain", "food");

        let similar = model.similar(&query, 2).unwrap();
        // both nearest rows are dissatisfied, so nothing survives
        assert!(similar.is_empty());
    }

    #[test]
    fn test_similar_users_are_capped_and_formatted() {
        let corpus = beach_corpus();
        let model = TrainedModel::train(corpus.clone(), &features()).unwrap();

        let recommendation = model.recommend(&corpus[0].profile, 5).unwrap();
        assert_eq!(recommendation.similar_users.len(), SIMILAR_USERS_SHOWN);
        assert_eq!(recommendation.similar_users[0].similarity, "100%");
        assert_eq!(recommendation.similar_users[0].satisfaction, "very satisfied");
        assert_eq!(recommendation.similar_users[0].next_vacation, "city");
        assert_eq!(recommendation.cost_info["beach"]["domestic"], "30만~50만 원");
    }

    #[test]
    fn test_partial_profile_still_recommends() {
        let model = TrainedModel::train(beach_corpus(), &features()).unwrap();
        let query = Profile::default().with(Field::Gender, "여성");

        let recommendation = model.recommend(&query, 5).unwrap();
        assert!(!recommendation.recommendations.is_empty());
        assert!(recommendation
            .similar_users
            .iter()
            .all(|u| u.similarity.ends_with('%')));
    }

    #[test]
    fn test_unseen_values_give_zero_similarity() {
        let model = TrainedModel::train(beach_corpus(), &features()).unwrap();
        let query = profile("10대", "기타", "반려견", "space", "moon", "mars");

        let similar = model.similar(&query, 5).unwrap();
        assert!(similar.iter().all(|r| r.score == 0.0));
    }

    #[test]
    fn test_profile_without_matching_features_is_rejected() {
        let model = TrainedModel::train(beach_corpus(), &features()).unwrap();
        let query = Profile::default().with(Field::Duration, "4~6일");

        let result = model.recommend(&query, 5);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_with_response_rebuilds_vocabulary() {
        let model = TrainedModel::train(beach_corpus(), &features()).unwrap();
        let newcomer = row(
            profile("20대", "여성", "가족", "international", "culture", "city"),
            "파리",
            5,
        );

        let updated = model.with_response(newcomer.clone(), &features()).unwrap();
        assert_eq!(updated.corpus().len(), 11);
        assert!(updated.vocabulary().dimensions() > model.vocabulary().dimensions());

        let similar = updated.similar(&newcomer.profile, 1).unwrap();
        assert_eq!(similar[0].index, 10);
        assert_eq!(similar[0].score, 1.0);
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_matrix() {
        let model = TrainedModel::train(beach_corpus(), &features()).unwrap();
        let mut matrix = model.matrix.clone();
        matrix.pop();

        let result = TrainedModel::from_parts(
            model.vocabulary.clone(),
            matrix,
            model.corpus.clone(),
            model.patterns.clone(),
            model.metadata.clone(),
        );
        assert!(result.is_err());
    }
}
