use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::Json;
use domains::{ScoreBreakdown, ToolVerdict, ToolVerdictSummary, VerdictReading};
use uuid::Uuid;

use crate::metrics::VerdictLabels;
use crate::web::error::ApiResult;
use crate::web::state::AppState;

pub async fn calculate_tool_verdict(
    State(state): State<AppState>,
    tool_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ToolVerdict>> {
    let Path(tool_id) = tool_id?;
    let verdict = state.verdicts.calculate_tool_verdict(tool_id).await?;
    state
        .metrics
        .verdict_recalculations
        .get_or_create(&VerdictLabels {
            verdict: verdict.verdict.map_or("none", |v| v.as_str()).to_string(),
        })
        .inc();
    Ok(Json(verdict))
}

pub async fn get_tool_verdict(
    State(state): State<AppState>,
    tool_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<VerdictReading>> {
    let Path(tool_id) = tool_id?;
    Ok(Json(state.verdicts.get_tool_verdict(tool_id).await?))
}

pub async fn list_tool_verdicts(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ToolVerdictSummary>>> {
    Ok(Json(state.verdicts.get_all_tool_verdicts().await?))
}

pub async fn recalculate_tool_scores(
    State(state): State<AppState>,
    tool_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ScoreBreakdown>> {
    let Path(tool_id) = tool_id?;
    Ok(Json(state.verdicts.recalculate_tool_scores(tool_id).await?))
}
