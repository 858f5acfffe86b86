use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{
    CostTable, Field, NextVacationSuggestion, RecommendationRecord, Satisfaction, SurveyResponse,
};

/// Groups with fewer members are not evidence enough to recommend
pub const MIN_GROUP_SIZE: usize = 2;
/// Lowest mean satisfaction ("neutral") a recommended group may have
pub const MIN_MEAN_SATISFACTION: f64 = 3.0;
/// Upper bound on recommendations returned per query
pub const MAX_RECOMMENDATIONS: usize = 5;

const SATISFACTION_WEIGHT: f64 = 0.7;
const PREFERENCE_WEIGHT: f64 = 0.3;
const SUGGESTIONS_PER_AGE: usize = 3;
const SUGGESTIONS_PER_VACATION: usize = 2;

/// A satisfied respondent's trip, as remembered by its group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub location: String,
    pub satisfaction: Satisfaction,
    pub cost: String,
    pub duration: String,
    pub next_vacation: String,
}

/// vacation type -> location type -> members
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VacationPatterns(BTreeMap<String, BTreeMap<String, Vec<Experience>>>);

/// Next-vacation preference counts of satisfied respondents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencePatterns {
    /// age group -> next vacation -> count
    pub by_age: BTreeMap<String, BTreeMap<String, u32>>,
    /// current vacation type -> next vacation -> count
    pub by_current_vacation: BTreeMap<String, BTreeMap<String, u32>>,
}

/// Cost brackets of satisfied respondents, as key -> sub-key -> brackets
///
/// Keys are the vacation type (sub-key: location type) plus the prefixed
/// profile keys `age_*`, `gender_*` (sub-key: vacation type) and
/// `companion_*`, `next_*` (sub-key: location type).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CostPatterns(BTreeMap<String, BTreeMap<String, Vec<String>>>);

/// The three grouped-pattern tables learned from a corpus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternTables {
    pub vacation: VacationPatterns,
    pub preference: PreferencePatterns,
    pub cost: CostPatterns,
}

impl PatternTables {
    /// Learns all tables from the satisfied (neutral or better) rows
    pub fn learn(corpus: &[SurveyResponse]) -> Self {
        let mut tables = PatternTables::default();
        let mut satisfied = 0usize;

        for row in corpus {
            let Some(satisfaction) = row.satisfaction.filter(|s| s.is_satisfied()) else {
                continue;
            };
            satisfied += 1;

            let vacation_type = row.category(Field::VacationType);
            let location_type = row.category(Field::LocationType);
            let next_vacation = row.category(Field::NextVacation);

            tables.vacation.insert(
                vacation_type,
                location_type,
                Experience {
                    location: row.resolved_destination().to_string(),
                    satisfaction,
                    cost: row.category(Field::Cost).to_string(),
                    duration: row.category(Field::Duration).to_string(),
                    next_vacation: next_vacation.to_string(),
                },
            );

            tables
                .preference
                .record(row.category(Field::AgeGroup), vacation_type, next_vacation);

            tables.cost.record(row);
        }

        tracing::debug!(
            total = corpus.len(),
            satisfied,
            groups = tables.vacation.group_count(),
            "Patterns learned"
        );

        tables
    }
}

impl VacationPatterns {
    pub fn insert(&mut self, vacation_type: &str, location_type: &str, experience: Experience) {
        self.0
            .entry(vacation_type.to_string())
            .or_default()
            .entry(location_type.to_string())
            .or_default()
            .push(experience);
    }

    pub fn group_count(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &str, &[Experience])> {
        self.0.iter().flat_map(|(vacation_type, by_location)| {
            by_location.iter().map(move |(location_type, members)| {
                (vacation_type.as_str(), location_type.as_str(), members.as_slice())
            })
        })
    }

    /// Ranked recommendations for a respondent whose next preference is
    /// `next_preference`
    ///
    /// Groups need at least [`MIN_GROUP_SIZE`] members and a mean
    /// satisfaction of at least [`MIN_MEAN_SATISFACTION`]. Ordered by blended
    /// score, then group size, both descending.
    pub fn recommend(&self, next_preference: &str, limit: usize) -> Vec<RecommendationRecord> {
        let mut scored: Vec<(f64, RecommendationRecord)> = self
            .groups()
            .filter_map(|(vacation_type, location_type, members)| {
                score_group(vacation_type, location_type, members, next_preference)
            })
            .collect();

        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .partial_cmp(a_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.sample_count.cmp(&a.sample_count))
        });

        scored
            .into_iter()
            .take(limit)
            .map(|(_, record)| record)
            .collect()
    }
}

fn score_group(
    vacation_type: &str,
    location_type: &str,
    members: &[Experience],
    next_preference: &str,
) -> Option<(f64, RecommendationRecord)> {
    if members.len() < MIN_GROUP_SIZE {
        return None;
    }

    let count = members.len() as f64;
    let avg_satisfaction = members
        .iter()
        .map(|m| f64::from(m.satisfaction.score()))
        .sum::<f64>()
        / count;

    if avg_satisfaction < MIN_MEAN_SATISFACTION {
        return None;
    }

    let matches = members
        .iter()
        .filter(|m| m.next_vacation == next_preference)
        .count();
    let preference_match = matches as f64 / count;
    let total_score =
        avg_satisfaction * SATISFACTION_WEIGHT + preference_match * 5.0 * PREFERENCE_WEIGHT;

    let recommended_location = most_common(members.iter().map(|m| m.location.as_str()))?;

    let record = RecommendationRecord {
        vacation_type: vacation_type.to_string(),
        location_type: location_type.to_string(),
        recommended_location: recommended_location.to_string(),
        avg_satisfaction: round2(avg_satisfaction),
        preference_match: round2(preference_match),
        total_score: round2(total_score),
        sample_count: members.len(),
        confidence: (count / 10.0 * total_score / 5.0).min(1.0),
    };

    Some((total_score, record))
}

impl PreferencePatterns {
    fn record(&mut self, age_group: &str, current_vacation: &str, next_vacation: &str) {
        *self
            .by_age
            .entry(age_group.to_string())
            .or_default()
            .entry(next_vacation.to_string())
            .or_default() += 1;
        *self
            .by_current_vacation
            .entry(current_vacation.to_string())
            .or_default()
            .entry(next_vacation.to_string())
            .or_default() += 1;
    }

    /// Most popular next vacations per age group, then per current vacation
    pub fn suggestions(&self) -> Vec<NextVacationSuggestion> {
        let mut suggestions = Vec::new();

        for (age_group, counts) in &self.by_age {
            for (vacation_type, popularity) in top_counts(counts, SUGGESTIONS_PER_AGE) {
                suggestions.push(NextVacationSuggestion::AgePreference {
                    vacation_type,
                    target_age: age_group.clone(),
                    popularity,
                });
            }
        }

        for (current_vacation, counts) in &self.by_current_vacation {
            for (vacation_type, popularity) in top_counts(counts, SUGGESTIONS_PER_VACATION) {
                suggestions.push(NextVacationSuggestion::TransitionPattern {
                    vacation_type,
                    current_vacation: current_vacation.clone(),
                    popularity,
                });
            }
        }

        suggestions
    }
}

impl CostPatterns {
    pub fn insert(&mut self, key: &str, sub_key: &str, cost: &str) {
        self.0
            .entry(key.to_string())
            .or_default()
            .entry(sub_key.to_string())
            .or_default()
            .push(cost.to_string());
    }

    fn record(&mut self, row: &SurveyResponse) {
        let vacation_type = row.category(Field::VacationType);
        let location_type = row.category(Field::LocationType);
        let cost = row.category(Field::Cost);

        self.insert(vacation_type, location_type, cost);
        self.insert(
            &format!("age_{}", row.category(Field::AgeGroup)),
            vacation_type,
            cost,
        );
        self.insert(
            &format!("gender_{}", row.category(Field::Gender)),
            vacation_type,
            cost,
        );
        self.insert(
            &format!("companion_{}", row.category(Field::Companion)),
            location_type,
            cost,
        );
        self.insert(
            &format!("next_{}", row.category(Field::NextVacation)),
            location_type,
            cost,
        );
    }

    /// Most frequent cost bracket per key and sub-key
    pub fn lookup_table(&self) -> CostTable {
        self.0
            .iter()
            .map(|(vacation_type, by_location)| {
                let costs = by_location
                    .iter()
                    .filter_map(|(location_type, costs)| {
                        most_common(costs.iter().map(String::as_str))
                            .map(|cost| (location_type.clone(), cost.to_string()))
                    })
                    .collect();
                (vacation_type.clone(), costs)
            })
            .collect()
    }
}

/// Most frequent item; ties go to the one seen first
fn most_common<'a>(items: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(seen, _)| *seen == item) {
            Some((_, count)) => *count += 1,
            None => counts.push((item, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (item, count) in counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((item, count));
        }
    }
    best.map(|(item, _)| item)
}

fn top_counts(counts: &BTreeMap<String, u32>, n: usize) -> Vec<(String, u32)> {
    let mut sorted: Vec<(&String, &u32)> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(a.1));
    sorted
        .into_iter()
        .take(n)
        .map(|(name, count)| (name.clone(), *count))
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
