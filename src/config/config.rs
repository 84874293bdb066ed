use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::llm::{GenerationConfig, SafetySettings};

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 允许跨域的前端地址
    pub cors_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            cors_origin: "http://localhost:3000".into(),
        }
    }
}

/// Gemini 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API 密钥（GEMINI_API_KEY）
    pub api_key: String,
    /// REST 接口根地址
    pub base_url: String,
    /// 模型名称
    pub model: String,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
    /// 各类别安全阈值
    pub safety: SafetySettings,
    /// 传输层超时（秒），未设置时不限制
    pub request_timeout_secs: Option<u64>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        let generation = GenerationConfig::default();
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            model: "gemini-1.5-flash".into(),
            temperature: generation.temperature,
            top_p: generation.top_p,
            top_k: generation.top_k,
            max_output_tokens: generation.max_output_tokens,
            candidate_count: generation.candidate_count,
            safety: generation.safety,
            request_timeout_secs: None,
        }
    }
}

impl GeminiConfig {
    /// 转换为生成参数
    pub fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_output_tokens,
            candidate_count: self.candidate_count,
            safety: self.safety.clone(),
        }
    }
}

/// 语音服务配置（ElevenLabs）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// API 密钥（ELEVENLABS_API_KEY）
    pub api_key: String,
    /// REST 接口根地址
    pub base_url: String,
    /// 默认音色（ELEVENLABS_VOICE_ID）
    pub default_voice_id: String,
    /// 语音合成模型
    pub model_id: String,
    /// 语音识别模型
    pub stt_model_id: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.elevenlabs.io/v1".into(),
            default_voice_id: "default".into(),
            model_id: "eleven_turbo_v2_5".into(),
            stt_model_id: "scribe_v1".into(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化（JSON）日志格式
    pub structured: bool,
    /// 日志文件目录，未设置时只输出到标准输出
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            structured: false,
            log_dir: None,
        }
    }
}

/// 洞察分析配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InsightsConfig {
    /// 情绪与时间戳长度不一致时直接拒绝，而不是截断
    pub strict_lengths: bool,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// Gemini 配置
    pub gemini: GeminiConfig,
    /// 语音服务配置
    pub speech: SpeechConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 洞察分析配置
    pub insights: InsightsConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::development()
    }
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig::default(),
            gemini: GeminiConfig::default(),
            speech: SpeechConfig::default(),
            logging: LoggingConfig {
                level: "debug".into(),
                ..LoggingConfig::default()
            },
            insights: InsightsConfig::default(),
            app_name: "medconsult".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.gemini.request_timeout_secs = Some(60);
        config
    }
}
