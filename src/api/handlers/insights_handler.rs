use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::insights_dto::*},
    error::AppError,
    services::insights::{build_chart, compute_statistics, validate_lengths},
};

/// 生成会诊总结和情绪统计
pub async fn generate_insights(
    State(state): State<AppState>,
    Json(request): Json<InsightsRequest>,
) -> Result<impl IntoResponse, AppError> {
    debug!(
        messages = request.conversation.len(),
        emotions = request.emotions.len(),
        "Insights request"
    );
    state.metrics.record_insights();

    validate_lengths(
        &request.emotions,
        &request.timestamps,
        state.insights.strict_lengths,
    )?;

    let summary = state.summary_service.summarize(&request.conversation).await;

    Ok(Json(InsightsResponse {
        summary,
        emotion_chart: build_chart(&request.emotions, &request.timestamps),
        emotion_stats: compute_statistics(&request.emotions),
    }))
}
