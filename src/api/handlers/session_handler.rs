use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::session_dto::*},
    error::AppError,
};

pub async fn create_session(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let session_id = state.turn_service.open_session().await;
    Ok((StatusCode::CREATED, Json(CreateSessionResponse { session_id })))
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Getting session: {}", id);

    let history = state.turn_service.history(&id).await?;
    Ok(Json(SessionResponse::from(history)))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    debug!("Deleting session: {}", id);

    state.turn_service.reset(&id).await?;
    Ok(Json(DeleteSessionResponse {
        success: true,
        message: format!("Session {} deleted", id),
    }))
}
