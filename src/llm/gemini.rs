//! Gemini generateContent 客户端

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use super::{
    ChatMessage, ChatRole, GenerationConfig, GenerationOutcome, GenerationRequest,
    LanguageModelGateway,
};
use crate::config::config::GeminiConfig;
use crate::error::{AppError, Result};

const API_KEY_HEADER: &str = "x-goog-api-key";
const SAFETY_FINISH_REASON: &str = "SAFETY";

/// Gemini 网关
#[derive(Debug)]
pub struct GeminiGateway {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiGateway {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AppError::ConfigurationMissing(
                "gemini.api_key (GEMINI_API_KEY)".to_string(),
            ));
        }

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    async fn send(&self, request: &GenerationRequest) -> Result<GenerateContentResponse> {
        let body = GenerateContentRequest::from(request);
        let url = self.endpoint();
        debug!(%url, contents = request.contents.len(), "Sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            return Err(AppError::UpstreamUnavailable(format!(
                "Gemini API error: {} - {}",
                status, error_text
            )));
        }

        Ok(response.json::<GenerateContentResponse>().await?)
    }
}

#[async_trait]
impl LanguageModelGateway for GeminiGateway {
    async fn generate(&self, request: GenerationRequest) -> GenerationOutcome {
        match self.send(&request).await {
            Ok(response) => response.into_outcome(),
            Err(e) => {
                warn!(model = %self.model, error = %e, "Gemini request failed");
                GenerationOutcome::Error(e)
            }
        }
    }
}

// ===== Wire format =====

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: WireGenerationConfig,
    safety_settings: Vec<WireSafetySetting>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    candidate_count: u32,
}

#[derive(Debug, Serialize)]
struct WireSafetySetting {
    category: &'static str,
    threshold: super::HarmBlockThreshold,
}

impl Content {
    fn text(role: Option<&str>, text: &str) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part {
                text: Some(text.to_string()),
            }],
        }
    }
}

impl From<&ChatMessage> for Content {
    fn from(message: &ChatMessage) -> Self {
        let role = match message.role {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        };
        Content::text(Some(role), &message.text)
    }
}

impl From<&GenerationConfig> for WireGenerationConfig {
    fn from(config: &GenerationConfig) -> Self {
        Self {
            temperature: config.temperature,
            top_p: config.top_p,
            top_k: config.top_k,
            max_output_tokens: config.max_output_tokens,
            candidate_count: config.candidate_count,
        }
    }
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        Self {
            system_instruction: request
                .system_instruction
                .as_deref()
                .map(|text| Content::text(None, text)),
            contents: request.contents.iter().map(Content::from).collect(),
            generation_config: WireGenerationConfig::from(&request.config),
            safety_settings: request
                .config
                .safety
                .entries()
                .into_iter()
                .map(|(category, threshold)| WireSafetySetting {
                    category: category.api_name(),
                    threshold,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn into_outcome(self) -> GenerationOutcome {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return GenerationOutcome::Blocked {
                reason: format!("prompt blocked: {}", reason),
            };
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            return GenerationOutcome::Blocked {
                reason: "no candidates returned".to_string(),
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = match candidate.finish_reason.as_deref() {
                Some(SAFETY_FINISH_REASON) => "candidate blocked by safety filter".to_string(),
                Some(other) => format!("empty candidate (finish reason {})", other),
                None => "empty candidate".to_string(),
            };
            return GenerationOutcome::Blocked { reason };
        }

        GenerationOutcome::Text(text)
    }
}
