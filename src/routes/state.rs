use std::sync::Arc;

use crate::services::{CorpusSource, RecommenderService};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<RecommenderService>,
    /// Corpus used by `POST /api/v1/model/retrain`
    pub corpus: Arc<dyn CorpusSource>,
}

impl AppState {
    pub fn new(recommender: Arc<RecommenderService>, corpus: Arc<dyn CorpusSource>) -> Self {
        Self {
            recommender,
            corpus,
        }
    }
}
