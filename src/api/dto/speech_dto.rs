//! 语音 DTO

use serde::{Deserialize, Serialize};

use crate::speech::Voice;

/// 文字转语音请求
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TtsRequest {
    pub text: String,
    /// 缺省时使用配置中的默认语音
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// 文字转语音响应
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsResponse {
    /// MP3 音频的 base64 编码
    pub audio_base64: String,
}

/// 语音转文字响应
#[derive(Debug, Serialize, Deserialize)]
pub struct SttResponse {
    pub text: String,
}

/// 语音列表响应
#[derive(Debug, Serialize, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<Voice>,
}
