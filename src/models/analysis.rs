use serde::{Deserialize, Serialize};

/// 情感极性
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// 文本与表情不一致的类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MismatchType {
    #[default]
    None,
    /// 话说得积极，表情却是负面的
    PositiveWordsNegativeFace,
    /// 话说得消极，表情却是正面的
    NegativeWordsPositiveFace,
}

/// 文本/表情融合分析结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MismatchAnalysis {
    pub text_sentiment: Sentiment,
    pub detected_emotion: String,
    pub expected_sentiment: Sentiment,
    pub mismatch_detected: bool,
    pub mismatch_type: MismatchType,
    /// `|compound|`，表示文本情感强度，而不是不一致的把握程度
    pub confidence: f64,
    /// 原始复合情感分，范围 [-1, 1]
    pub compound: f64,
}

/// 情绪转变的显著程度
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransitionSignificance {
    None,
    Low,
    High,
}

/// 两次情绪检测之间的转变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionTransition {
    pub from: String,
    pub to: String,
    pub has_transition: bool,
    pub significance: TransitionSignificance,
}
