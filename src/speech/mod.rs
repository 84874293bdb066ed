//! 语音模块
//!
//! 语音转文字和文字转语音的抽象，以及 ElevenLabs 实现。

pub mod elevenlabs;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;

use crate::error::Result;

pub use elevenlabs::ElevenLabsClient;

/// 音频分块流
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>>> + Send>>;

/// 合成参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

impl Default for VoiceSettings {
    /// 偏自然、平稳的医生语音
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
        }
    }
}

/// 可用语音
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// 语音转文字
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String>;
}

/// 文字转语音
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// 合成完整音频，`voice_id` 为空时使用默认语音
    async fn synthesize(&self, text: &str, voice_id: Option<String>) -> Result<Vec<u8>>;

    /// 边合成边返回音频分块
    async fn synthesize_stream(&self, text: &str, voice_id: Option<String>) -> Result<AudioStream>;

    async fn list_voices(&self) -> Result<Vec<Voice>>;
}
