use axum::{extract::State, Extension, Json};

use crate::{error::AppResult, middleware::RequestId, models::ModelStatus};

use super::AppState;

/// Handler for model status endpoint
pub async fn status(State(state): State<AppState>) -> Json<ModelStatus> {
    Json(state.recommender.status().await)
}

/// Handler for retrain endpoint; rebuilds from the configured corpus
pub async fn retrain(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<ModelStatus>> {
    tracing::info!(request_id = %request_id, source = %state.corpus.describe(), "Retrain requested");

    state.recommender.retrain(state.corpus.as_ref()).await?;

    Ok(Json(state.recommender.status().await))
}
