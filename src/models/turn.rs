use serde::{Deserialize, Serialize};

/// 说话角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 患者
    Patient,
    /// AI 医生
    Assistant,
}

impl Role {
    /// 对话记录里使用的标签
    pub fn transcript_label(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Assistant => "Doctor",
        }
    }

    /// 解析前端传来的角色名
    ///
    /// `user`/`patient` 视为患者，其余（`assistant`、`doctor`、`model` 等）视为医生。
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "user" | "patient" => Role::Patient,
            _ => Role::Assistant,
        }
    }
}

/// 对话轮次
///
/// 追加后不可修改，顺序即追加顺序。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn patient(content: impl Into<String>) -> Self {
        Self {
            role: Role::Patient,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
