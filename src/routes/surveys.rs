use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::{ModelStatus, SurveySubmission},
};

use super::AppState;

/// Handler for survey submission endpoint
pub async fn submit(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(submission): Json<SurveySubmission>,
) -> AppResult<(StatusCode, Json<ModelStatus>)> {
    let response = submission.into_response()?;
    let metadata = state.recommender.incorporate(response).await?;

    tracing::info!(
        request_id = %request_id,
        corpus_size = metadata.corpus_size,
        "Survey incorporated"
    );

    Ok((StatusCode::CREATED, Json(state.recommender.status().await)))
}
