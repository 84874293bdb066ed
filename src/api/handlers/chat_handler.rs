use axum::{Json, extract::State, response::IntoResponse};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::chat_dto::*},
    error::AppError,
    services::session::resolve_session_id,
};

/// 处理一次患者发言
///
/// 空白发言也按普通一轮处理，模型失败时仍返回 200 和兜底回复。
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session_id = resolve_session_id(request.session_id.as_deref());
    debug!(
        session_id = %session_id,
        emotion = %request.emotion,
        age_category = ?request.age_category,
        "Chat request"
    );

    let reply = state
        .turn_service
        .submit_turn(&session_id, request.into())
        .await;

    Ok(Json(ChatResponse::from(reply)))
}
