use axum::{
    Json,
    body::Body,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Response},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::speech_dto::*},
    error::AppError,
};

fn require_text(request: &TtsRequest) -> Result<(), AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text must not be empty".to_string()));
    }
    Ok(())
}

pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_text(&request)?;
    debug!(chars = request.text.chars().count(), "TTS request");

    let audio = state
        .tts()?
        .synthesize(&request.text, request.voice_id)
        .await?;

    Ok(Json(TtsResponse {
        audio_base64: STANDARD.encode(audio),
    }))
}

pub async fn text_to_speech_stream(
    State(state): State<AppState>,
    Json(request): Json<TtsRequest>,
) -> Result<Response, AppError> {
    require_text(&request)?;
    debug!(chars = request.text.chars().count(), "Streaming TTS request");

    let stream = state
        .tts()?
        .synthesize_stream(&request.text, request.voice_id)
        .await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], Body::from_stream(stream)).into_response())
}

/// multipart 表单中音频所在的字段名
pub const AUDIO_FIELD: &str = "audio";

/// 从 multipart 表单中取出 `audio` 字段
async fn read_audio_field(multipart: &mut Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {}", e)))?
    {
        if field.name() == Some(AUDIO_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read audio field: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(AppError::Validation(format!(
        "multipart field '{}' is required",
        AUDIO_FIELD
    )))
}

/// 请求体为 multipart 表单，音频在 `audio` 字段
pub async fn speech_to_text(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let audio = read_audio_field(&mut multipart).await?;
    if audio.is_empty() {
        return Err(AppError::Validation("audio must not be empty".to_string()));
    }
    debug!(bytes = audio.len(), "STT request");

    let text = state.stt()?.transcribe(audio).await?;
    Ok(Json(SttResponse { text }))
}

pub async fn list_voices(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let voices = state.tts()?.list_voices().await?;
    Ok(Json(VoicesResponse { voices }))
}
