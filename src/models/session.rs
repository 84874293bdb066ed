use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::ChatMessage;
use crate::models::turn::{Role, Turn};

/// 会话状态
///
/// `Ended` 只是提示性的，已结束的会话仍然接受新的轮次。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// 尚未打开对话
    Uninitialized,
    /// 进行中
    Active,
    /// 模型已发出结束标记
    Ended,
}

/// 与模型之间的对话句柄
///
/// 保存发送给模型的提示和模型的原始回复，而不是患者看到的文本。
#[derive(Debug, Clone, Default)]
pub struct ChatHandle {
    contents: Vec<ChatMessage>,
}

impl ChatHandle {
    pub fn contents(&self) -> &[ChatMessage] {
        &self.contents
    }

    /// 历史加上新提示，作为下一次请求的内容
    pub fn request_contents(&self, prompt: &str) -> Vec<ChatMessage> {
        let mut contents = self.contents.clone();
        contents.push(ChatMessage::user(prompt));
        contents
    }

    pub fn push_exchange(&mut self, prompt: impl Into<String>, reply: impl Into<String>) {
        self.contents.push(ChatMessage::user(prompt));
        self.contents.push(ChatMessage::model(reply));
    }
}

/// 会话实体
#[derive(Debug, Clone)]
pub struct Session {
    /// 会话唯一标识
    pub id: String,
    /// 按追加顺序排列的轮次
    turns: Vec<Turn>,
    /// 首次回复请求时打开
    chat: Option<ChatHandle>,
    /// 模型是否已发出结束标记
    ended: bool,
    /// 上一轮检测到的表情
    last_emotion: Option<String>,
    /// 会话创建时间
    pub created_at: DateTime<Utc>,
    /// 最后活跃时间
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// 创建新会话
    pub fn new(id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            turns: Vec::new(),
            chat: None,
            ended: false,
            last_emotion: None,
            created_at: now,
            last_active_at: now,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.chat, self.ended) {
            (None, _) => SessionState::Uninitialized,
            (Some(_), true) => SessionState::Ended,
            (Some(_), false) => SessionState::Active,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// 已有的患者轮次数
    pub fn exchange_count(&self) -> usize {
        self.turns.iter().filter(|t| t.role == Role::Patient).count()
    }

    /// 打开（或取得已打开的）对话句柄
    pub fn open_chat(&mut self) -> &mut ChatHandle {
        self.chat.get_or_insert_with(ChatHandle::default)
    }

    pub fn chat(&self) -> Option<&ChatHandle> {
        self.chat.as_ref()
    }

    /// 追加一问一答
    pub fn record_exchange(&mut self, patient: Turn, assistant: Turn) {
        self.turns.push(patient);
        self.turns.push(assistant);
        self.touch();
    }

    /// 记录本轮表情，返回上一轮的表情
    pub fn observe_emotion(&mut self, emotion: &str) -> Option<String> {
        self.last_emotion.replace(emotion.to_string())
    }

    pub fn mark_ended(&mut self) {
        self.ended = true;
    }

    /// 更新最后活跃时间
    pub fn touch(&mut self) {
        self.last_active_at = Utc::now();
    }
}
