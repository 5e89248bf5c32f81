use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::Json;
use domains::{BookmarkState, NewReview, Review, ReviewKind, VoteTally};
use serde::Deserialize;
use uuid::Uuid;

use crate::metrics::VoteLabels;
use crate::web::error::{ApiError, ApiResult};
use crate::web::extract::AuthenticatedUser;
use crate::web::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    /// Parsed by the ledger so unknown literals surface as invalid input.
    pub vote_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReviewRequest {
    pub tool_id: Uuid,
    pub overall_score: Option<f64>,
    pub value_score: Option<f64>,
    pub usage_score: Option<f64>,
    pub integration_score: Option<f64>,
    #[serde(rename = "type")]
    pub kind: Option<ReviewKind>,
    pub content: Option<String>,
}

pub async fn cast_vote(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    review_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<Json<VoteTally>> {
    let Path(review_id) = review_id?;
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let tally = state
        .ledger
        .cast_vote(review_id, &user_id, &req.vote_type)
        .await?;

    state
        .metrics
        .votes_cast
        .get_or_create(&VoteLabels {
            vote_type: tally.vote_type.as_str().to_string(),
        })
        .inc();
    Ok(Json(tally))
}

pub async fn submit_review(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    body: Result<Json<SubmitReviewRequest>, JsonRejection>,
) -> ApiResult<Json<Review>> {
    let Json(req) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let submission = NewReview {
        tool_id: req.tool_id,
        user_id,
        overall_score: req.overall_score,
        value_score: req.value_score,
        usage_score: req.usage_score,
        integration_score: req.integration_score,
        kind: req.kind.unwrap_or(ReviewKind::Community),
        content: req.content,
    };
    Ok(Json(state.ledger.submit_review(submission).await?))
}

pub async fn list_reviews(
    State(state): State<AppState>,
    tool_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<Review>>> {
    let Path(tool_id) = tool_id?;
    Ok(Json(state.ledger.list_reviews(tool_id).await?))
}

pub async fn toggle_bookmark(
    State(state): State<AppState>,
    AuthenticatedUser(user_id): AuthenticatedUser,
    review_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<BookmarkState>> {
    let Path(review_id) = review_id?;
    Ok(Json(state.ledger.toggle_bookmark(review_id, &user_id).await?))
}
