//! ElevenLabs 语音客户端

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, Response, multipart};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AudioStream, SpeechToText, TextToSpeech, Voice, VoiceSettings};
use crate::config::config::SpeechConfig;
use crate::error::{AppError, Result};

const API_KEY_HEADER: &str = "xi-api-key";
const AUDIO_MPEG: &str = "audio/mpeg";

/// ElevenLabs 客户端
#[derive(Debug)]
pub struct ElevenLabsClient {
    client: Client,
    api_key: String,
    base_url: String,
    default_voice_id: String,
    model_id: String,
    stt_model_id: String,
    voice_settings: VoiceSettings,
}

impl ElevenLabsClient {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::ConfigurationMissing(
                "speech.api_key (ELEVENLABS_API_KEY)".to_string(),
            ));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_voice_id: config.default_voice_id.clone(),
            model_id: config.model_id.clone(),
            stt_model_id: config.stt_model_id.clone(),
            voice_settings: VoiceSettings::default(),
        })
    }

    fn voice_id<'a>(&'a self, voice_id: Option<&'a str>) -> &'a str {
        match voice_id {
            Some(id) if !id.trim().is_empty() => id,
            _ => &self.default_voice_id,
        }
    }

    async fn post_tts(&self, text: &str, voice_id: Option<&str>, stream: bool) -> Result<Response> {
        let voice_id = self.voice_id(voice_id);
        let url = if stream {
            format!("{}/text-to-speech/{}/stream", self.base_url, voice_id)
        } else {
            format!("{}/text-to-speech/{}", self.base_url, voice_id)
        };
        debug!(%url, chars = text.chars().count(), "Sending text-to-speech request");

        let body = TtsRequest {
            text,
            model_id: &self.model_id,
            voice_settings: self.voice_settings,
        };

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, AUDIO_MPEG)
            .json(&body)
            .send()
            .await?;

        check_status(response).await
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    warn!(%status, "ElevenLabs request failed");
    Err(AppError::UpstreamUnavailable(format!(
        "ElevenLabs API error: {} - {}",
        status, error_text
    )))
}

#[async_trait]
impl TextToSpeech for ElevenLabsClient {
    async fn synthesize(&self, text: &str, voice_id: Option<String>) -> Result<Vec<u8>> {
        let response = self.post_tts(text, voice_id.as_deref(), false).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn synthesize_stream(&self, text: &str, voice_id: Option<String>) -> Result<AudioStream> {
        let response = self.post_tts(text, voice_id.as_deref(), true).await?;
        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(AppError::from));
        Ok(Box::pin(stream))
    }

    async fn list_voices(&self) -> Result<Vec<Voice>> {
        let url = format!("{}/voices", self.base_url);
        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        let voices = check_status(response).await?.json::<VoicesResponse>().await?;
        Ok(voices.voices)
    }
}

#[async_trait]
impl SpeechToText for ElevenLabsClient {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String> {
        let url = format!("{}/speech-to-text", self.base_url);
        debug!(%url, bytes = audio.len(), "Sending speech-to-text request");

        let file = multipart::Part::bytes(audio)
            .file_name("audio.webm")
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new()
            .text("model_id", self.stt_model_id.clone())
            .part("file", file);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .multipart(form)
            .send()
            .await?;

        let transcript = check_status(response).await?.json::<SttResponse>().await?;
        Ok(transcript.text)
    }
}

// ===== Wire format =====

#[derive(Debug, Serialize)]
struct TtsRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<Voice>,
}

#[derive(Debug, Deserialize)]
struct SttResponse {
    #[serde(default)]
    text: String,
}
