use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::{
    error::{AppError, AppResult},
    models::{Field, Profile, SurveyResponse},
};

/// One indicator column: a feature and one of its observed values
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Column {
    pub field: Field,
    pub value: String,
}

/// Indicator encoding of a record, aligned to a [`Vocabulary`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<u8>);

impl FeatureVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|v| *v == 0)
    }

    pub fn dot(&self, other: &FeatureVector) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| u32::from(*a) * u32::from(*b))
            .sum()
    }

    pub fn norm_squared(&self) -> u32 {
        self.dot(self)
    }
}

impl From<Vec<u8>> for FeatureVector {
    fn from(values: Vec<u8>) -> Self {
        Self(values)
    }
}

/// Column layout shared by the reference corpus and every query
///
/// Columns are grouped by feature in configured order; values within a
/// feature are sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "VocabularyFile", into = "VocabularyFile")]
pub struct Vocabulary {
    features: Vec<Field>,
    columns: Vec<Column>,
    index: HashMap<(Field, String), usize>,
}

impl PartialEq for Vocabulary {
    fn eq(&self, other: &Self) -> bool {
        self.features == other.features && self.columns == other.columns
    }
}

#[derive(Serialize, Deserialize)]
struct VocabularyFile {
    features: Vec<Field>,
    columns: Vec<Column>,
}

impl TryFrom<VocabularyFile> for Vocabulary {
    type Error = String;

    fn try_from(file: VocabularyFile) -> Result<Self, Self::Error> {
        if let Some(column) = file.columns.iter().find(|c| !file.features.contains(&c.field)) {
            return Err(format!(
                "column '{}={}' belongs to no configured feature",
                column.field, column.value
            ));
        }
        Vocabulary::new(file.features, file.columns)
    }
}

impl From<Vocabulary> for VocabularyFile {
    fn from(vocabulary: Vocabulary) -> Self {
        Self {
            features: vocabulary.features,
            columns: vocabulary.columns,
        }
    }
}

impl Vocabulary {
    fn new(features: Vec<Field>, columns: Vec<Column>) -> Result<Self, String> {
        let mut index = HashMap::with_capacity(columns.len());
        for (position, column) in columns.iter().enumerate() {
            if index
                .insert((column.field, column.value.clone()), position)
                .is_some()
            {
                return Err(format!(
                    "duplicate column '{}={}'",
                    column.field, column.value
                ));
            }
        }
        Ok(Self {
            features,
            columns,
            index,
        })
    }

    /// Builds the vocabulary from every value observed in the corpus
    ///
    /// Fails when none of `feature_names` is a known field answered by at
    /// least one corpus row.
    pub fn fit(corpus: &[SurveyResponse], feature_names: &[String]) -> AppResult<Self> {
        if corpus.is_empty() {
            return Err(AppError::Configuration(
                "cannot build a vocabulary from an empty corpus".to_string(),
            ));
        }

        let mut features: Vec<Field> = Vec::new();
        for name in feature_names {
            match name.parse::<Field>() {
                Ok(field) if features.contains(&field) => {}
                Ok(field) => {
                    if corpus.iter().any(|row| row.profile.get(field).is_some()) {
                        features.push(field);
                    } else {
                        tracing::warn!(feature = %field, "Feature has no values in corpus, skipping");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring configured feature"),
            }
        }

        if features.is_empty() {
            return Err(AppError::Configuration(format!(
                "none of the configured features {:?} exist in the corpus",
                feature_names
            )));
        }

        let mut columns = Vec::new();
        for field in &features {
            let values: BTreeSet<&str> = corpus.iter().map(|row| row.category(*field)).collect();
            columns.extend(values.into_iter().map(|value| Column {
                field: *field,
                value: value.to_string(),
            }));
        }

        tracing::debug!(
            features = features.len(),
            dimensions = columns.len(),
            "Vocabulary fitted"
        );

        Vocabulary::new(features, columns).map_err(AppError::Internal)
    }

    pub fn features(&self) -> &[Field] {
        &self.features
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn dimensions(&self) -> usize {
        self.columns.len()
    }

    /// Encodes one record. Missing answers encode as the "other" category;
    /// values outside the vocabulary are dropped.
    pub fn encode(&self, profile: &Profile) -> FeatureVector {
        let mut values = vec![0u8; self.columns.len()];
        for field in &self.features {
            let key = (*field, profile.category(*field).to_string());
            if let Some(position) = self.index.get(&key) {
                values[*position] = 1;
            }
        }
        FeatureVector(values)
    }

    pub fn encode_corpus(&self, corpus: &[SurveyResponse]) -> Vec<FeatureVector> {
        corpus.iter().map(|row| self.encode(&row.profile)).collect()
    }

    /// Whether the profile answers at least one encoded feature
    pub fn covers(&self, profile: &Profile) -> bool {
        self.features.iter().any(|field| profile.get(*field).is_some())
    }
}
