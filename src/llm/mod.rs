//! 语言模型网关
//!
//! 定义生成请求、生成配置（含分类安全阈值）以及三态生成结果。
//! 具体实现见 [`gemini`]。

pub mod gemini;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub use gemini::GeminiGateway;

/// 对话消息角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// 发给模型的内容
    User,
    /// 模型生成的内容
    Model,
}

/// 发送给模型的一条消息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// 安全过滤类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
}

impl HarmCategory {
    /// Gemini REST API 中的类别名称
    pub fn api_name(&self) -> &'static str {
        match self {
            HarmCategory::Harassment => "HARM_CATEGORY_HARASSMENT",
            HarmCategory::HateSpeech => "HARM_CATEGORY_HATE_SPEECH",
            HarmCategory::SexuallyExplicit => "HARM_CATEGORY_SEXUALLY_EXPLICIT",
            HarmCategory::DangerousContent => "HARM_CATEGORY_DANGEROUS_CONTENT",
        }
    }
}

/// 安全过滤阈值
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    #[default]
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

/// 各类别独立的安全阈值
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct SafetySettings {
    pub harassment: HarmBlockThreshold,
    pub hate_speech: HarmBlockThreshold,
    pub sexually_explicit: HarmBlockThreshold,
    pub dangerous_content: HarmBlockThreshold,
}

impl SafetySettings {
    /// 按类别展开
    pub fn entries(&self) -> [(HarmCategory, HarmBlockThreshold); 4] {
        [
            (HarmCategory::Harassment, self.harassment),
            (HarmCategory::HateSpeech, self.hate_speech),
            (HarmCategory::SexuallyExplicit, self.sexually_explicit),
            (HarmCategory::DangerousContent, self.dangerous_content),
        ]
    }
}

/// 生成参数
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
    pub safety: SafetySettings,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 1024,
            candidate_count: 1,
            safety: SafetySettings::default(),
        }
    }
}

/// 一次生成请求
///
/// `contents` 既可以是完整的对话历史，也可以只是一条提示。
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub contents: Vec<ChatMessage>,
    pub config: GenerationConfig,
}

impl GenerationRequest {
    /// 单条提示的请求
    pub fn prompt(text: impl Into<String>, config: GenerationConfig) -> Self {
        Self {
            system_instruction: None,
            contents: vec![ChatMessage::user(text)],
            config,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// 最后一条用户消息
    pub fn last_user_text(&self) -> Option<&str> {
        self.contents
            .iter()
            .rev()
            .find(|m| m.role == ChatRole::User)
            .map(|m| m.text.as_str())
    }
}

/// 生成结果
///
/// 被安全过滤拦截和传输失败是两种不同的结果，调用方需要分别处理。
#[derive(Debug)]
pub enum GenerationOutcome {
    /// 生成成功
    Text(String),
    /// 安全过滤或空候选
    Blocked { reason: String },
    /// 网络、超时或协议错误
    Error(AppError),
}

/// 语言模型网关 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    /// 生成一次回复，从不返回 panic 或 `Err`，所有失败都编码在结果里
    async fn generate(&self, request: GenerationRequest) -> GenerationOutcome;
}
