use axum::extract::{Path, State};
use axum::Json;
use domains::{TrustScore, TrustScoreReading};

use crate::web::error::ApiResult;
use crate::web::state::AppState;

pub async fn calculate_trust_score(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<TrustScore>> {
    let score = state.trust.calculate_trust_score(&user_id).await?;
    state.metrics.trust_recalculations.inc();
    Ok(Json(score))
}

pub async fn get_trust_score(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<TrustScoreReading>> {
    Ok(Json(state.trust.get_trust_score(&user_id).await?))
}
