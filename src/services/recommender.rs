use std::sync::Arc;

use tokio::sync::RwLock;

use super::{artifacts::ArtifactStore, corpus::CorpusSource, model::TrainedModel};
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        ModelMetadata, ModelPhase, ModelStatus, Profile, RecommendationResult, SurveyResponse,
    },
};

/// Lifecycle of the trained model
#[derive(Debug, Clone)]
enum ModelState {
    Untrained { last_error: Option<String> },
    Training,
    Loading,
    Trained(Arc<TrainedModel>),
}

impl ModelState {
    fn phase(&self) -> ModelPhase {
        match self {
            ModelState::Untrained { .. } => ModelPhase::Untrained,
            ModelState::Training => ModelPhase::Training,
            ModelState::Loading => ModelPhase::Loading,
            ModelState::Trained(_) => ModelPhase::Trained,
        }
    }

    fn failed(error: &AppError) -> Self {
        ModelState::Untrained {
            last_error: Some(error.to_string()),
        }
    }
}

/// Owns the trained recommender and its lifecycle
///
/// Queries share a read lock only long enough to clone the model handle.
/// Training, loading and incorporating hold the write lock for the whole
/// rebuild and swap in a new model, or fall back to untrained on error.
pub struct RecommenderService {
    state: RwLock<ModelState>,
    store: ArtifactStore,
    features: Vec<String>,
    top_k: usize,
}

impl RecommenderService {
    pub fn new(store: ArtifactStore, features: Vec<String>, top_k: usize) -> Self {
        Self {
            state: RwLock::new(ModelState::Untrained { last_error: None }),
            store,
            features,
            top_k: top_k.max(1),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ArtifactStore::new(config.model_dir.clone()),
            config.features.clone(),
            config.similar_top_k,
        )
    }

    /// Whether a train or load cycle has completed
    pub async fn is_ready(&self) -> bool {
        matches!(*self.state.read().await, ModelState::Trained(_))
    }

    pub async fn status(&self) -> ModelStatus {
        let state = self.state.read().await;
        let (metadata, last_error) = match &*state {
            ModelState::Trained(model) => (Some(model.metadata().clone()), None),
            ModelState::Untrained { last_error } => (None, last_error.clone()),
            ModelState::Training | ModelState::Loading => (None, None),
        };
        ModelStatus {
            phase: state.phase(),
            ready: matches!(*state, ModelState::Trained(_)),
            metadata,
            last_error,
        }
    }

    async fn current(&self) -> AppResult<Arc<TrainedModel>> {
        match &*self.state.read().await {
            ModelState::Trained(model) => Ok(Arc::clone(model)),
            _ => Err(AppError::NotTrained),
        }
    }

    /// Recommendations for a profile. Never fails; errors become a failed result.
    pub async fn recommend(&self, profile: &Profile) -> RecommendationResult {
        let outcome = match self.current().await {
            Ok(model) => model.recommend(profile, self.top_k),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(recommendation) => {
                tracing::info!(
                    recommendations = recommendation.recommendations.len(),
                    similar_users = recommendation.similar_users.len(),
                    "Recommendation generated"
                );
                recommendation.into()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recommendation failed");
                RecommendationResult::failure(&e)
            }
        }
    }

    /// Restores the model from saved artifacts
    pub async fn load(&self) -> AppResult<ModelMetadata> {
        let mut state = self.state.write().await;
        *state = ModelState::Loading;

        let store = self.store.clone();
        let loaded = match tokio::task::spawn_blocking(move || store.load()).await {
            Ok(outcome) => outcome,
            Err(e) => Err(AppError::Internal(format!("artifact load task failed: {}", e))),
        };

        match loaded {
            Ok(model) => {
                let metadata = model.metadata().clone();
                *state = ModelState::Trained(Arc::new(model));
                Ok(metadata)
            }
            Err(e) => {
                tracing::warn!(error = %e, dir = %self.store.dir().display(), "Model load failed");
                *state = ModelState::failed(&e);
                Err(e)
            }
        }
    }

    /// Rebuilds the model from a full corpus and persists it
    pub async fn retrain(&self, source: &dyn CorpusSource) -> AppResult<ModelMetadata> {
        let mut state = self.state.write().await;
        *state = ModelState::Training;
        tracing::info!(source = %source.describe(), "Training started");

        let outcome = match source.load().await {
            Ok(corpus) => {
                let features = self.features.clone();
                self.build_and_save(move || TrainedModel::train(corpus, &features))
                    .await
            }
            Err(e) => Err(e),
        };

        self.settle(&mut *state, outcome)
    }

    /// Appends one response to the corpus, retrains and persists
    pub async fn incorporate(&self, response: SurveyResponse) -> AppResult<ModelMetadata> {
        let mut state = self.state.write().await;
        let current = match &*state {
            ModelState::Trained(model) => Arc::clone(model),
            _ => return Err(AppError::NotTrained),
        };
        *state = ModelState::Training;
        tracing::info!(corpus_size = current.corpus().len(), "Incorporating new response");

        let features = self.features.clone();
        let outcome = self
            .build_and_save(move || current.with_response(response, &features))
            .await;

        self.settle(&mut *state, outcome)
    }

    /// Loads saved artifacts, falling back to training from `fallback`
    pub async fn initialize(&self, fallback: Option<&dyn CorpusSource>) -> AppResult<ModelMetadata> {
        match self.load().await {
            Ok(metadata) => Ok(metadata),
            Err(load_error) => match fallback {
                Some(source) => {
                    tracing::info!(source = %source.describe(), "No usable artifacts, training from corpus");
                    self.retrain(source).await
                }
                None => Err(load_error),
            },
        }
    }

    /// Trains and persists on the blocking pool; the caller keeps the write lock
    async fn build_and_save<F>(&self, build: F) -> AppResult<TrainedModel>
    where
        F: FnOnce() -> AppResult<TrainedModel> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || -> AppResult<TrainedModel> {
            let model = build()?;
            store.save(&model)?;
            Ok(model)
        })
        .await
        .map_err(|e| AppError::Internal(format!("training task failed: {}", e)))?
    }

    fn settle(
        &self,
        state: &mut ModelState,
        outcome: AppResult<TrainedModel>,
    ) -> AppResult<ModelMetadata> {
        match outcome {
            Ok(model) => {
                let metadata = model.metadata().clone();
                *state = ModelState::Trained(Arc::new(model));
                tracing::info!(corpus_size = metadata.corpus_size, "Model ready");
                Ok(metadata)
            }
            Err(e) => {
                tracing::error!(error = %e, "Training failed, model is untrained");
                *state = ModelState::failed(&e);
                Err(e)
            }
        }
    }
}
