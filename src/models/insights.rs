use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::turn::Role;

/// 情绪统计
///
/// 两个映射都按情绪第一次出现的顺序排列。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionStatistics {
    /// 样本总数，空输入时为 1
    pub total_samples: usize,
    pub emotion_counts: IndexMap<String, usize>,
    pub emotion_percentages: IndexMap<String, f64>,
    pub dominant_emotion: String,
}

/// 情绪时间线上的一个点
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmotionChartPoint {
    pub timestamp: String,
    pub emotion: String,
}

/// 会诊总结
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummaryResult {
    pub overview: String,
    pub recommendations: Vec<String>,
}

/// 洞察请求中的一条对话记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
}

impl TranscriptEntry {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
            timestamp: None,
            emotion: None,
        }
    }

    pub fn speaker(&self) -> Role {
        Role::from_label(&self.role)
    }
}
