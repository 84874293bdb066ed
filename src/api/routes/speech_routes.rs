//! Speech Routes
//!
//! 语音合成与识别路由。

use crate::api::handlers::speech_handler::*;
use axum::{
    Router,
    routing::{get, post},
};

use crate::api::app_state::AppState;

/// 创建语音路由器
pub fn create_speech_router() -> Router<AppState> {
    Router::new()
        .route("/tts", post(text_to_speech))
        .route("/tts/stream", post(text_to_speech_stream))
        .route("/stt", post(speech_to_text))
        .route("/voices", get(list_voices))
}
