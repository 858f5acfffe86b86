use std::cmp::Ordering;

use super::encoder::FeatureVector;
use crate::models::{SimilarityResult, SurveyResponse};

/// Default number of neighbours considered per query
pub const DEFAULT_TOP_K: usize = 5;

/// Cosine similarity of two indicator vectors, in [0, 1]
///
/// Zero vectors are similar to nothing. Identical non-zero vectors score
/// exactly 1.0 since the denominator is taken as one square root of a
/// perfect square.
pub fn cosine_similarity(a: &FeatureVector, b: &FeatureVector) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let norms = u64::from(a.norm_squared()) * u64::from(b.norm_squared());
    if norms == 0 {
        return 0.0;
    }

    let score = f64::from(a.dot(b)) / (norms as f64).sqrt();
    score.clamp(0.0, 1.0)
}

/// Scores the query against every reference row and keeps the `top_k` best
///
/// Sorting is stable, so equal scores keep corpus order.
pub fn rank(query: &FeatureVector, matrix: &[FeatureVector], top_k: usize) -> Vec<SimilarityResult> {
    let mut scored: Vec<(usize, f64)> = matrix
        .iter()
        .enumerate()
        .map(|(index, row)| (index, cosine_similarity(query, row)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    scored
        .into_iter()
        .take(top_k)
        .enumerate()
        .map(|(position, (index, score))| SimilarityResult {
            rank: position + 1,
            score,
            index,
        })
        .collect()
}

/// Drops neighbours whose respondent was less than neutral about their trip
///
/// Applied after ranking, so ranks keep their top-K positions and fewer
/// than K results may remain.
pub fn retain_satisfied(
    ranked: Vec<SimilarityResult>,
    corpus: &[SurveyResponse],
) -> Vec<SimilarityResult> {
    ranked
        .into_iter()
        .filter(|result| {
            corpus
                .get(result.index)
                .is_some_and(SurveyResponse::is_satisfied)
        })
        .collect()
}

/// Similarity as an integer percentage string, e.g. "85%"
pub fn as_percentage(score: f64) -> String {
    format!("{}%", (score * 100.0).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, Profile, Satisfaction};

    fn v(values: &[u8]) -> FeatureVector {
        FeatureVector::from(values.to_vec())
    }

    #[test]
    fn test_identical_vectors_score_exactly_one() {
        for width in 1..=12 {
            let ones = v(&vec![1; width]);
            assert_eq!(cosine_similarity(&ones, &ones), 1.0);
        }
        let sparse = v(&[1, 0, 1, 0, 0, 1, 1, 0, 1]);
        assert_eq!(cosine_similarity(&sparse, &sparse), 1.0);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let zero = v(&[0, 0, 0]);
        assert_eq!(cosine_similarity(&zero, &v(&[1, 0, 1])), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn test_partial_overlap() {
        let score = cosine_similarity(&v(&[1, 1, 0, 0]), &v(&[1, 0, 1, 0]));
        assert!((score - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_mismatched_width_scores_zero() {
        assert_eq!(cosine_similarity(&v(&[1, 1]), &v(&[1, 1, 0])), 0.0);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let query = v(&[1, 0, 1]);
        let matrix = vec![
            v(&[0, 1, 0]),
            v(&[1, 1, 0]),
            v(&[1, 0, 1]),
            v(&[1, 1, 0]),
            v(&[0, 0, 1]),
        ];
        let ranked = rank(&query, &matrix, 5);
        let order: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![2, 4, 1, 3, 0]);
        assert_eq!(ranked[0].rank, 1);
        assert!(ranked.iter().all(|r| (0.0..=1.0).contains(&r.score)));
    }

    #[test]
    fn test_rank_truncates_to_top_k() {
        let query = v(&[1, 0]);
        let matrix = vec![v(&[1, 0]); 8];
        assert_eq!(rank(&query, &matrix, DEFAULT_TOP_K).len(), 5);
        assert_eq!(rank(&query, &matrix[..2], DEFAULT_TOP_K).len(), 2);
    }

    #[test]
    fn test_retain_satisfied_keeps_ranks() {
        let corpus: Vec<SurveyResponse> = [
            Some(Satisfaction::VerySatisfied),
            Some(Satisfaction::Dissatisfied),
            None,
            Some(Satisfaction::Neutral),
        ]
        .into_iter()
        .map(|s| SurveyResponse::new(Profile::default().with(Field::Gender, "여성"), s))
        .collect();

        let ranked: Vec<SimilarityResult> = (0..4)
            .map(|i| SimilarityResult {
                rank: i + 1,
                score: 1.0,
                index: i,
            })
            .collect();

        let kept = retain_satisfied(ranked, &corpus);
        let ranks: Vec<usize> = kept.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 4]);
    }

    #[test]
    fn test_as_percentage() {
        assert_eq!(as_percentage(1.0), "100%");
        assert_eq!(as_percentage(0.8466), "85%");
        assert_eq!(as_percentage(0.0), "0%");
    }
}
