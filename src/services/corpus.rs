use std::path::PathBuf;

use crate::{
    error::AppResult,
    models::{Field, Profile, Satisfaction, SurveyResponse},
};

const SATISFACTION_HEADERS: [&str; 2] = ["satisfaction", "만족도"];

/// Source of the reference corpus used for training
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CorpusSource: Send + Sync {
    /// Loads every historical survey response, in corpus order
    async fn load(&self) -> AppResult<Vec<SurveyResponse>>;

    /// Source name for logging
    fn describe(&self) -> String;
}

/// CSV export of survey responses
///
/// Headers may use the snake_case field names or the Korean export headers.
/// Unknown columns are ignored and empty cells are missing answers.
pub struct CsvCorpus {
    path: PathBuf,
}

impl CsvCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

enum ColumnRole {
    Field(Field),
    Satisfaction,
    Ignored,
}

fn column_role(header: &str) -> ColumnRole {
    let header = header.trim().trim_start_matches('\u{feff}');
    if SATISFACTION_HEADERS.contains(&header) {
        return ColumnRole::Satisfaction;
    }
    match header.parse::<Field>() {
        Ok(field) => ColumnRole::Field(field),
        Err(_) => ColumnRole::Ignored,
    }
}

/// Parses survey responses from CSV bytes
pub fn parse_csv(bytes: &[u8]) -> AppResult<Vec<SurveyResponse>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let roles: Vec<ColumnRole> = reader.headers()?.iter().map(column_role).collect();

    let mut responses = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record?;
        let mut profile = Profile::default();
        let mut satisfaction = None;

        for (role, value) in roles.iter().zip(record.iter()) {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match role {
                ColumnRole::Field(field) => profile.set(*field, value),
                ColumnRole::Satisfaction => match value.parse::<Satisfaction>() {
                    Ok(parsed) => satisfaction = Some(parsed),
                    Err(e) => tracing::debug!(row = line + 1, error = %e, "Unrecognised satisfaction"),
                },
                ColumnRole::Ignored => {}
            }
        }

        responses.push(SurveyResponse::new(profile, satisfaction));
    }

    Ok(responses)
}

#[async_trait::async_trait]
impl CorpusSource for CsvCorpus {
    async fn load(&self) -> AppResult<Vec<SurveyResponse>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let responses = parse_csv(&bytes)?;
        tracing::info!(
            path = %self.path.display(),
            rows = responses.len(),
            "Survey corpus loaded"
        );
        Ok(responses)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.path.display())
    }
}

/// Corpus held in memory
pub struct InMemoryCorpus {
    responses: Vec<SurveyResponse>,
}

impl InMemoryCorpus {
    pub fn new(responses: Vec<SurveyResponse>) -> Self {
        Self { responses }
    }
}

#[async_trait::async_trait]
impl CorpusSource for InMemoryCorpus {
    async fn load(&self) -> AppResult<Vec<SurveyResponse>> {
        Ok(self.responses.clone())
    }

    fn describe(&self) -> String {
        format!("memory:{} rows", self.responses.len())
    }
}
