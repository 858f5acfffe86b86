use axum::{extract::State, http::StatusCode, Extension, Json};

use crate::{
    middleware::RequestId,
    models::{Profile, RecommendationResult},
};

use super::AppState;

/// Handler for recommendations endpoint
///
/// Always answers with a [`RecommendationResult`]; failures set the status
/// from the error kind.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(profile): Json<Profile>,
) -> (StatusCode, Json<RecommendationResult>) {
    tracing::debug!(request_id = %request_id, "Recommendation requested");

    let result = state.recommender.recommend(&profile).await;
    let status = result
        .error_kind
        .map(|kind| kind.status_code())
        .unwrap_or(StatusCode::OK);

    (status, Json(result))
}
