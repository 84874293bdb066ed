//! 洞察 DTO

use serde::{Deserialize, Serialize};

use crate::models::insights::{EmotionChartPoint, EmotionStatistics, SummaryResult, TranscriptEntry};

/// 洞察请求
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InsightsRequest {
    /// 完整对话记录
    #[serde(default)]
    pub conversation: Vec<TranscriptEntry>,
    /// 会诊期间检测到的表情序列
    #[serde(default)]
    pub emotions: Vec<String>,
    /// 与表情一一对应的时间戳
    #[serde(default)]
    pub timestamps: Vec<String>,
}

/// 洞察响应
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsightsResponse {
    pub summary: SummaryResult,
    pub emotion_chart: Vec<EmotionChartPoint>,
    pub emotion_stats: EmotionStatistics,
}
