use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use super::{
    encoder::{FeatureVector, Vocabulary},
    model::TrainedModel,
    patterns::{CostPatterns, PatternTables, PreferencePatterns, VacationPatterns},
};
use crate::{
    error::{AppError, AppResult},
    models::{ModelMetadata, SurveyResponse},
};

pub const VOCABULARY_FILE: &str = "vocabulary.json";
pub const MATRIX_FILE: &str = "matrix.json";
pub const CORPUS_FILE: &str = "corpus.json";
pub const VACATION_PATTERNS_FILE: &str = "vacation_patterns.json";
pub const PREFERENCE_PATTERNS_FILE: &str = "preference_patterns.json";
pub const COST_PATTERNS_FILE: &str = "cost_patterns.json";
pub const METADATA_FILE: &str = "metadata.json";

/// Reads and writes trained model artifacts as JSON files in one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Writes all artifacts. Each file lands via a temporary sibling and a rename.
    ///
    /// The previous `metadata.json` is removed first and the new one written
    /// last, so an interrupted save leaves a set that fails to load.
    pub fn save(&self, model: &TrainedModel) -> AppResult<()> {
        fs::create_dir_all(&self.dir)?;

        match fs::remove_file(self.path(METADATA_FILE)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(AppError::Io(e)),
        }

        self.write_json(VOCABULARY_FILE, &model.vocabulary)?;
        self.write_json(MATRIX_FILE, &model.matrix)?;
        self.write_json(CORPUS_FILE, &model.corpus)?;
        self.write_json(VACATION_PATTERNS_FILE, &model.patterns.vacation)?;
        self.write_json(PREFERENCE_PATTERNS_FILE, &model.patterns.preference)?;
        self.write_json(COST_PATTERNS_FILE, &model.patterns.cost)?;
        self.write_json(METADATA_FILE, &model.metadata)?;

        tracing::info!(
            dir = %self.dir.display(),
            corpus_size = model.metadata.corpus_size,
            "Model artifacts saved"
        );

        Ok(())
    }

    /// Loads a model from disk
    ///
    /// Returns [`AppError::ArtifactMissing`] when a file is absent and
    /// [`AppError::ArtifactCorrupt`] when one cannot be parsed or the files
    /// disagree with each other.
    pub fn load(&self) -> AppResult<TrainedModel> {
        let metadata: ModelMetadata = self.read_json(METADATA_FILE)?;
        let vocabulary: Vocabulary = self.read_json(VOCABULARY_FILE)?;
        let matrix: Vec<FeatureVector> = self.read_json(MATRIX_FILE)?;
        let corpus: Vec<SurveyResponse> = self.read_json(CORPUS_FILE)?;
        let vacation: VacationPatterns = self.read_json(VACATION_PATTERNS_FILE)?;
        let preference: PreferencePatterns = self.read_json(PREFERENCE_PATTERNS_FILE)?;
        let cost: CostPatterns = self.read_json(COST_PATTERNS_FILE)?;

        let patterns = PatternTables {
            vacation,
            preference,
            cost,
        };

        let model = TrainedModel::from_parts(vocabulary, matrix, corpus, patterns, metadata)
            .map_err(|reason| AppError::ArtifactCorrupt {
                path: self.dir.clone(),
                reason,
            })?;

        tracing::info!(
            dir = %self.dir.display(),
            corpus_size = model.metadata().corpus_size,
            trained_at = %model.metadata().trained_at,
            "Model artifacts loaded"
        );

        Ok(model)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> AppResult<()> {
        let path = self.path(file);
        let tmp = self.path(&format!("{}.tmp", file));

        let json = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;

        tracing::debug!(path = %path.display(), "Artifact written");
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, file: &str) -> AppResult<T> {
        let path = self.path(file);

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::ArtifactMissing(path));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| AppError::ArtifactCorrupt {
            path,
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, Profile};
    use crate::services::model::tests::{beach_corpus, features};
    use tempfile::TempDir;

    fn trained() -> TrainedModel {
        TrainedModel::train(beach_corpus(), &features()).unwrap()
    }

    /// Same size and width as [`trained`], different age groups
    fn retrained_older() -> TrainedModel {
        let corpus = beach_corpus()
            .into_iter()
            .enumerate()
            .map(|(i, mut row)| {
                let age = ["40대", "50대", "60대 이상", "30대"][i % 4];
                row.profile.set(Field::AgeGroup, age);
                row
            })
            .collect();
        TrainedModel::train(corpus, &features()).unwrap()
    }

    #[test]
    fn test_save_then_load_is_identical() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        let model = trained();

        store.save(&model).unwrap();
        assert!([
            VOCABULARY_FILE,
            MATRIX_FILE,
            CORPUS_FILE,
            VACATION_PATTERNS_FILE,
            PREFERENCE_PATTERNS_FILE,
            COST_PATTERNS_FILE,
            METADATA_FILE,
        ]
        .iter()
        .all(|file| dir.path().join(file).is_file()));

        let loaded = store.load().unwrap();
        assert_eq!(loaded, model);

        let query = Profile::default()
            .with(Field::Gender, "여성")
            .with(Field::VacationType, "beach");
        assert_eq!(
            loaded.recommend(&query, 5).unwrap(),
            model.recommend(&query, 5).unwrap()
        );
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("nested"));
        store.save(&trained()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_multibyte_labels_survive() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();

        let raw = fs::read_to_string(dir.path().join(CORPUS_FILE)).unwrap();
        assert!(raw.contains("부산"));

        let loaded = store.load().unwrap();
        assert_eq!(
            loaded.corpus()[0].profile.get(Field::Destination),
            Some("부산")
        );
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();
        fs::remove_file(dir.path().join(COST_PATTERNS_FILE)).unwrap();

        match store.load() {
            Err(AppError::ArtifactMissing(path)) => assert!(path.ends_with(COST_PATTERNS_FILE)),
            other => panic!("expected missing artifact, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_empty_directory_is_missing() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("never-trained"));
        assert!(matches!(store.load(), Err(AppError::ArtifactMissing(_))));
    }

    #[test]
    fn test_garbled_file_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();
        fs::write(dir.path().join(MATRIX_FILE), b"[[1, 0,").unwrap();

        assert!(matches!(store.load(), Err(AppError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_inconsistent_files_are_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();
        fs::write(dir.path().join(CORPUS_FILE), b"[]").unwrap();

        assert!(matches!(store.load(), Err(AppError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_interrupted_save_does_not_load_a_mixed_set() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();

        // the corpus rename target is blocked, so the save stops halfway
        fs::create_dir(dir.path().join(format!("{}.tmp", CORPUS_FILE))).unwrap();
        assert!(store.save(&retrained_older()).is_err());

        match store.load() {
            Err(AppError::ArtifactMissing(_)) | Err(AppError::ArtifactCorrupt { .. }) => {}
            other => panic!("expected load failure, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_corpus_from_another_model_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();

        let other = TempDir::new().unwrap();
        ArtifactStore::new(other.path())
            .save(&retrained_older())
            .unwrap();
        fs::copy(other.path().join(CORPUS_FILE), dir.path().join(CORPUS_FILE)).unwrap();

        assert!(matches!(store.load(), Err(AppError::ArtifactCorrupt { .. })));
    }

    #[test]
    fn test_stale_pattern_table_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save(&trained()).unwrap();

        let other = TempDir::new().unwrap();
        ArtifactStore::new(other.path())
            .save(&retrained_older())
            .unwrap();
        fs::copy(
            other.path().join(PREFERENCE_PATTERNS_FILE),
            dir.path().join(PREFERENCE_PATTERNS_FILE),
        )
        .unwrap();

        assert!(matches!(store.load(), Err(AppError::ArtifactCorrupt { .. })));
    }
}
