//! 文本/表情融合分析
//!
//! 比较患者话语的情感与面部表情通常对应的情感，标记两者方向相反的情况
//! （例如嘴上说 "I'm fine"，脸上却很难过）。无状态，可并发调用。

use crate::models::analysis::{
    EmotionTransition, MismatchAnalysis, MismatchType, Sentiment, TransitionSignificance,
};
use crate::services::sentiment::compound_score;

/// 复合分不低于该值视为积极，不高于其相反数视为消极
pub const SENTIMENT_THRESHOLD: f64 = 0.05;

/// 复合分分桶
pub fn classify_sentiment(compound: f64) -> Sentiment {
    if compound >= SENTIMENT_THRESHOLD {
        Sentiment::Positive
    } else if compound <= -SENTIMENT_THRESHOLD {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// 表情标签对应的预期情感，未知标签视为中性
pub fn expected_sentiment(emotion: &str) -> Sentiment {
    match emotion.trim().to_ascii_lowercase().as_str() {
        "happy" | "surprised" => Sentiment::Positive,
        "sad" | "angry" | "fearful" | "disgusted" => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

/// 分析文本与表情是否不一致
pub fn analyze_mismatch(message: &str, detected_emotion: &str) -> MismatchAnalysis {
    let compound = compound_score(message);
    let text_sentiment = classify_sentiment(compound);
    let expected = expected_sentiment(detected_emotion);

    let mismatch_type = match (text_sentiment, expected) {
        (Sentiment::Positive, Sentiment::Negative) => MismatchType::PositiveWordsNegativeFace,
        (Sentiment::Negative, Sentiment::Positive) => MismatchType::NegativeWordsPositiveFace,
        _ => MismatchType::None,
    };

    MismatchAnalysis {
        text_sentiment,
        detected_emotion: detected_emotion.to_string(),
        expected_sentiment: expected,
        mismatch_detected: mismatch_type != MismatchType::None,
        mismatch_type,
        confidence: compound.abs(),
        compound,
    }
}

/// 检测相邻两次表情之间的转变
///
/// 预期情感在积极与消极之间翻转时为高显著性（例如 happy -> sad）。
pub fn detect_transition(previous: &str, current: &str) -> EmotionTransition {
    let has_transition = !previous.trim().eq_ignore_ascii_case(current.trim());

    let significance = if !has_transition {
        TransitionSignificance::None
    } else {
        match (expected_sentiment(previous), expected_sentiment(current)) {
            (Sentiment::Positive, Sentiment::Negative)
            | (Sentiment::Negative, Sentiment::Positive) => TransitionSignificance::High,
            _ => TransitionSignificance::Low,
        }
    };

    EmotionTransition {
        from: previous.to_string(),
        to: current.to_string(),
        has_transition,
        significance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("happy", Sentiment::Positive)]
    #[case("Surprised", Sentiment::Positive)]
    #[case("neutral", Sentiment::Neutral)]
    #[case("SAD", Sentiment::Negative)]
    #[case("angry", Sentiment::Negative)]
    #[case("fearful", Sentiment::Negative)]
    #[case("disgusted", Sentiment::Negative)]
    #[case("confused", Sentiment::Neutral)]
    fn test_expected_sentiment_table(#[case] emotion: &str, #[case] expected: Sentiment) {
        assert_eq!(expected_sentiment(emotion), expected);
    }

    #[rstest]
    #[case(0.05, Sentiment::Positive)]
    #[case(0.049, Sentiment::Neutral)]
    #[case(-0.049, Sentiment::Neutral)]
    #[case(-0.05, Sentiment::Negative)]
    fn test_bucket_boundaries(#[case] compound: f64, #[case] expected: Sentiment) {
        assert_eq!(classify_sentiment(compound), expected);
    }

    #[test]
    fn test_negative_words_positive_face() {
        let analysis = analyze_mismatch("This is terrible", "happy");
        assert!(analysis.mismatch_detected);
        assert_eq!(analysis.mismatch_type, MismatchType::NegativeWordsPositiveFace);
        assert_eq!(analysis.text_sentiment, Sentiment::Negative);
        assert_eq!(analysis.expected_sentiment, Sentiment::Positive);
        assert!((analysis.confidence - analysis.compound.abs()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_positive_words_negative_face() {
        let analysis = analyze_mismatch("I'm fine, really good", "sad");
        assert!(analysis.mismatch_detected);
        assert_eq!(analysis.mismatch_type, MismatchType::PositiveWordsNegativeFace);
    }

    #[test]
    fn test_same_polarity_is_not_mismatch() {
        let analysis = analyze_mismatch("I'm fine", "happy");
        assert!(!analysis.mismatch_detected);
        assert_eq!(analysis.mismatch_type, MismatchType::None);
    }

    #[rstest]
    #[case("I feel great", "neutral")]
    #[case("Everything hurts", "neutral")]
    #[case("I went to work", "sad")]
    #[case("I went to work", "unknown-label")]
    fn test_neutral_pairings_never_mismatch(#[case] message: &str, #[case] emotion: &str) {
        assert!(!analyze_mismatch(message, emotion).mismatch_detected);
    }

    #[test]
    fn test_detect_transition() {
        let flip = detect_transition("happy", "sad");
        assert!(flip.has_transition);
        assert_eq!(flip.significance, TransitionSignificance::High);

        let mild = detect_transition("neutral", "sad");
        assert_eq!(mild.significance, TransitionSignificance::Low);

        let same = detect_transition("Sad", "sad");
        assert!(!same.has_transition);
        assert_eq!(same.significance, TransitionSignificance::None);
    }
}
