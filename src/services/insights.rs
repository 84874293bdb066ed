//! 情绪洞察聚合
//!
//! 纯函数：情绪直方图、占比、主导情绪和时间线。

use indexmap::IndexMap;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::models::insights::{EmotionChartPoint, EmotionStatistics};

/// 空输入时的主导情绪
pub const DEFAULT_DOMINANT_EMOTION: &str = "neutral";

/// 统计情绪分布
///
/// 计数按第一次出现的顺序排列；占比分母为 `max(len, 1)`；
/// 主导情绪取计数最大者，并列时先出现的胜出。
pub fn compute_statistics(emotions: &[String]) -> EmotionStatistics {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for emotion in emotions {
        *counts.entry(emotion.clone()).or_insert(0) += 1;
    }

    let total = emotions.len().max(1);
    let percentages = counts
        .iter()
        .map(|(emotion, count)| (emotion.clone(), 100.0 * *count as f64 / total as f64))
        .collect();

    let mut dominant: Option<(&String, usize)> = None;
    for (emotion, &count) in &counts {
        match dominant {
            Some((_, best)) if count <= best => {}
            _ => dominant = Some((emotion, count)),
        }
    }

    EmotionStatistics {
        total_samples: total,
        dominant_emotion: dominant
            .map(|(emotion, _)| emotion.clone())
            .unwrap_or_else(|| DEFAULT_DOMINANT_EMOTION.to_string()),
        emotion_counts: counts,
        emotion_percentages: percentages,
    }
}

/// 按位置配对情绪和时间戳，长度取两者较短者
pub fn build_chart(emotions: &[String], timestamps: &[String]) -> Vec<EmotionChartPoint> {
    emotions
        .iter()
        .zip(timestamps)
        .map(|(emotion, timestamp)| EmotionChartPoint {
            timestamp: timestamp.clone(),
            emotion: emotion.clone(),
        })
        .collect()
}

/// 检查两个序列长度
///
/// 严格模式下长度不等直接报错，否则只记录警告并按较短者截断。
pub fn validate_lengths(emotions: &[String], timestamps: &[String], strict: bool) -> Result<()> {
    if emotions.len() == timestamps.len() {
        return Ok(());
    }
    if strict {
        return Err(AppError::InputShapeMismatch {
            emotions: emotions.len(),
            timestamps: timestamps.len(),
        });
    }
    warn!(
        emotions = emotions.len(),
        timestamps = timestamps.len(),
        "Emotion and timestamp counts differ; chart will be truncated"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_statistics_basic() {
        let stats = compute_statistics(&labels(&["happy", "sad", "happy", "neutral"]));

        assert_eq!(stats.total_samples, 4);
        assert_eq!(stats.dominant_emotion, "happy");
        assert_eq!(stats.emotion_counts["happy"], 2);
        assert_eq!(stats.emotion_percentages["happy"], 50.0);
        assert_eq!(stats.emotion_percentages["sad"], 25.0);

        let order: Vec<&str> = stats.emotion_counts.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["happy", "sad", "neutral"]);
    }

    #[test]
    fn test_statistics_empty_input() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total_samples, 1);
        assert!(stats.emotion_counts.is_empty());
        assert!(stats.emotion_percentages.is_empty());
        assert_eq!(stats.dominant_emotion, "neutral");
    }

    #[rstest]
    #[case(&["sad", "happy"], "sad")]
    #[case(&["happy", "sad", "sad", "happy"], "happy")]
    #[case(&["neutral", "angry", "angry"], "angry")]
    fn test_dominant_first_seen_wins_ties(#[case] input: &[&str], #[case] expected: &str) {
        assert_eq!(compute_statistics(&labels(input)).dominant_emotion, expected);
    }

    #[rstest]
    #[case(&["happy"])]
    #[case(&["happy", "sad", "fearful"])]
    #[case(&["a", "b", "c", "a", "b", "a", "d"])]
    fn test_counts_and_percentages_are_consistent(#[case] input: &[&str]) {
        let stats = compute_statistics(&labels(input));

        let count_sum: usize = stats.emotion_counts.values().sum();
        assert_eq!(count_sum, input.len());

        let pct_sum: f64 = stats.emotion_percentages.values().sum();
        assert!((pct_sum - 100.0).abs() < 1e-9);

        let dominant_count = stats.emotion_counts[&stats.dominant_emotion];
        assert!(stats.emotion_counts.values().all(|&c| c <= dominant_count));
    }

    #[test]
    fn test_chart_truncates_to_shorter() {
        let chart = build_chart(
            &labels(&["happy", "sad", "neutral"]),
            &labels(&["t1", "t2"]),
        );
        assert_eq!(
            chart,
            vec![
                EmotionChartPoint { timestamp: "t1".into(), emotion: "happy".into() },
                EmotionChartPoint { timestamp: "t2".into(), emotion: "sad".into() },
            ]
        );
    }

    #[test]
    fn test_validate_lengths() {
        let emotions = labels(&["happy", "sad"]);
        let timestamps = labels(&["t1"]);

        assert!(validate_lengths(&emotions, &emotions, true).is_ok());
        assert!(validate_lengths(&emotions, &timestamps, false).is_ok());

        let err = validate_lengths(&emotions, &timestamps, true).unwrap_err();
        assert!(matches!(
            err,
            AppError::InputShapeMismatch { emotions: 2, timestamps: 1 }
        ));
    }
}
