//! 问诊 DTO

use serde::{Deserialize, Serialize};

use crate::services::turn::{ReplyResult, TurnInput};

/// 问诊请求
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatRequest {
    /// 患者发言
    pub message: String,
    /// 前端检测到的表情
    pub emotion: String,
    /// 估计年龄
    #[serde(default)]
    pub age: Option<u32>,
    /// 年龄段（如 "Young Adult"、"Senior"）
    #[serde(default)]
    pub age_category: Option<String>,
    /// 会话 ID，缺省时使用默认会话
    #[serde(default)]
    pub session_id: Option<String>,
}

impl From<ChatRequest> for TurnInput {
    fn from(request: ChatRequest) -> Self {
        Self {
            message: request.message,
            emotion: request.emotion,
            age: request.age,
            age_category: request.age_category,
        }
    }
}

/// 问诊响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatResponse {
    pub response: String,
    pub followup_needed: bool,
    pub should_end_consultation: bool,
}

impl From<ReplyResult> for ChatResponse {
    fn from(reply: ReplyResult) -> Self {
        Self {
            response: reply.text,
            followup_needed: reply.followup_needed,
            should_end_consultation: reply.should_end_consultation,
        }
    }
}
