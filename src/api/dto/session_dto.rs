//! 会话 DTO
//!
//! 定义会话相关的请求和响应数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::session::SessionState;
use crate::models::turn::Turn;
use crate::services::turn::SessionHistory;

/// 创建会话响应
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    /// 会话 ID
    pub session_id: String,
}

/// 会话详情响应
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub state: SessionState,
    pub turns: Vec<Turn>,
    pub turn_count: usize,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl From<SessionHistory> for SessionResponse {
    fn from(history: SessionHistory) -> Self {
        Self {
            session_id: history.session_id,
            state: history.state,
            turn_count: history.turns.len(),
            turns: history.turns,
            created_at: history.created_at,
            last_active_at: history.last_active_at,
        }
    }
}

/// 删除会话响应
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteSessionResponse {
    pub success: bool,
    pub message: String,
}
