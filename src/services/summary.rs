//! 会诊总结
//!
//! 对话记录 -> 概述 + 建议列表。两次模型调用并发进行，各自失败时各自兜底，
//! 因此总结接口本身不会失败。

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::llm::{GenerationConfig, GenerationOutcome, GenerationRequest, LanguageModelGateway};
use crate::models::insights::{SummaryResult, TranscriptEntry};
use crate::observability::AppMetrics;

pub const FALLBACK_OVERVIEW: &str = "Consultation completed. The patient discussed their health \
concerns with the AI doctor and received preliminary guidance.";

pub const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Follow up with your primary care physician for a thorough evaluation",
    "Monitor your symptoms and keep a record of any changes",
    "Seek immediate medical attention if your symptoms worsen",
];

/// 建议行的最少字符数
const MIN_RECOMMENDATION_CHARS: usize = 4;

/// 数字标记后必须跟空白，`1.5 liters` 这类数值不算列表标记
static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d+[.)]\s+|[-•*·–]\s*)").expect("valid list marker regex")
});

static EMPHASIS_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[*_]+").expect("valid emphasis regex"));

fn fallback_recommendations() -> Vec<String> {
    FALLBACK_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect()
}

/// 渲染为 `Patient: ...` / `Doctor: ...` 行
pub fn render_transcript(transcript: &[TranscriptEntry]) -> String {
    transcript
        .iter()
        .map(|entry| format!("{}: {}", entry.speaker().transcript_label(), entry.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn overview_prompt(rendered: &str) -> String {
    format!(
        "Based on the following consultation transcript between a patient and an AI doctor, \
         write a brief overview of the consultation in 2-3 sentences. \
         Focus on the patient's main concerns and the guidance given. \
         Use plain text only, no markdown.\n\nTranscript:\n{}",
        rendered
    )
}

fn recommendations_prompt(rendered: &str) -> String {
    format!(
        "Based on the following consultation transcript between a patient and an AI doctor, \
         list 3-4 specific, actionable health recommendations for the patient. \
         Put each recommendation on its own line. \
         Use plain text only: no markdown, no bold, no headings.\n\nTranscript:\n{}",
        rendered
    )
}

/// 去掉包裹文字的 `*` / `_` 强调符号
///
/// 两侧都是字母或数字的符号属于词内容（如 `cold_pack`），保留。
fn strip_emphasis(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for run in EMPHASIS_RUN.find_iter(line) {
        let before = line[..run.start()].chars().next_back();
        let after = line[run.end()..].chars().next();
        let inside_word = before.is_some_and(char::is_alphanumeric)
            && after.is_some_and(char::is_alphanumeric);
        out.push_str(&line[last..run.start()]);
        if inside_word {
            out.push_str(run.as_str());
        }
        last = run.end();
    }
    out.push_str(&line[last..]);
    out
}

/// 把模型返回的多行文本整理成建议列表
///
/// 去掉强调符号、标题符号和一个行首列表标记，丢弃过短的行，保持原顺序。
pub fn normalize_recommendations(raw: &str) -> Vec<String> {
    raw.lines()
        .filter_map(|line| {
            let line = strip_emphasis(line.trim());
            let line = line.trim().trim_start_matches('#').trim();
            let line = LIST_MARKER.replace(line, "");
            let line = line.trim();
            (line.chars().count() >= MIN_RECOMMENDATION_CHARS).then(|| line.to_string())
        })
        .collect()
}

/// 总结服务 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SummaryService: Send + Sync {
    /// 生成会诊总结，失败部分使用固定文本
    async fn summarize(&self, transcript: &[TranscriptEntry]) -> SummaryResult;
}

/// 总结服务实现
pub struct SummaryServiceImpl {
    gateway: Arc<dyn LanguageModelGateway>,
    config: GenerationConfig,
    metrics: Arc<AppMetrics>,
}

impl SummaryServiceImpl {
    pub fn new(
        gateway: Arc<dyn LanguageModelGateway>,
        config: GenerationConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            gateway,
            config,
            metrics,
        }
    }

    /// 非文本结果记为上游失败并返回 None
    fn accept(&self, part: &str, outcome: GenerationOutcome) -> Option<String> {
        match outcome {
            GenerationOutcome::Text(text) => Some(text),
            GenerationOutcome::Blocked { reason } => {
                warn!(part, reason = %reason, "Summary generation blocked");
                self.metrics.record_upstream_failure();
                None
            }
            GenerationOutcome::Error(e) => {
                warn!(part, error = %e, "Summary generation failed");
                self.metrics.record_upstream_failure();
                None
            }
        }
    }
}

#[async_trait]
impl SummaryService for SummaryServiceImpl {
    async fn summarize(&self, transcript: &[TranscriptEntry]) -> SummaryResult {
        if transcript.is_empty() {
            debug!("Empty transcript, returning canned summary");
            return SummaryResult {
                overview: FALLBACK_OVERVIEW.to_string(),
                recommendations: fallback_recommendations(),
            };
        }

        let rendered = render_transcript(transcript);
        let overview_request = GenerationRequest::prompt(overview_prompt(&rendered), self.config.clone());
        let recommendations_request =
            GenerationRequest::prompt(recommendations_prompt(&rendered), self.config.clone());

        let (overview_outcome, recommendations_outcome) = tokio::join!(
            self.gateway.generate(overview_request),
            self.gateway.generate(recommendations_request),
        );

        let overview = self
            .accept("overview", overview_outcome)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| {
                self.metrics.record_summary_fallback();
                FALLBACK_OVERVIEW.to_string()
            });

        let recommendations = self
            .accept("recommendations", recommendations_outcome)
            .map(|text| normalize_recommendations(&text))
            .filter(|items| !items.is_empty())
            .unwrap_or_else(|| {
                self.metrics.record_summary_fallback();
                fallback_recommendations()
            });

        SummaryResult {
            overview,
            recommendations,
        }
    }
}

/// 创建总结服务
pub fn create_summary_service(
    gateway: Arc<dyn LanguageModelGateway>,
    config: GenerationConfig,
    metrics: Arc<AppMetrics>,
) -> Box<dyn SummaryService> {
    Box::new(SummaryServiceImpl::new(gateway, config, metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::llm::MockLanguageModelGateway;
    use std::sync::atomic::Ordering;

    fn transcript() -> Vec<TranscriptEntry> {
        vec![
            TranscriptEntry::new("user", "I've had a headache for three days"),
            TranscriptEntry::new("assistant", "Have you taken anything for it?"),
            TranscriptEntry::new("user", "Just ibuprofen"),
        ]
    }

    /// 按提示内容区分两次调用
    fn is_overview(request: &GenerationRequest) -> bool {
        request
            .last_user_text()
            .is_some_and(|text| text.contains("brief overview"))
    }

    fn service(gateway: MockLanguageModelGateway) -> (SummaryServiceImpl, Arc<AppMetrics>) {
        let metrics = Arc::new(AppMetrics::default());
        (
            SummaryServiceImpl::new(Arc::new(gateway), GenerationConfig::default(), metrics.clone()),
            metrics,
        )
    }

    #[test]
    fn test_render_transcript_labels() {
        let rendered = render_transcript(&[
            TranscriptEntry::new("patient", "Hello"),
            TranscriptEntry::new("doctor", "Hi there"),
            TranscriptEntry::new("model", "How are you?"),
        ]);
        assert_eq!(rendered, "Patient: Hello\nDoctor: Hi there\nDoctor: How are you?");
    }

    #[test]
    fn test_normalize_recommendations() {
        let raw = "\
**Recommendations:**
1. **Rest** for at least two days
2) Drink plenty of water
- Take ibuprofen with food
• See a doctor if it persists
## Sleep well
ok
";
        assert_eq!(
            normalize_recommendations(raw),
            vec![
                "Recommendations:",
                "Rest for at least two days",
                "Drink plenty of water",
                "Take ibuprofen with food",
                "See a doctor if it persists",
                "Sleep well",
            ]
        );
    }

    #[test]
    fn test_normalize_only_strips_one_marker() {
        assert_eq!(
            normalize_recommendations("1. 2 tablets twice a day"),
            vec!["2 tablets twice a day"]
        );
    }

    #[test]
    fn test_normalize_keeps_numbers_and_inner_underscores() {
        assert_eq!(
            normalize_recommendations(
                "1.5 liters of water daily\nUse a cold_pack twice\n2. Take _one_ 2.5 mg dose"
            ),
            vec![
                "1.5 liters of water daily",
                "Use a cold_pack twice",
                "Take one 2.5 mg dose",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_transcript_skips_gateway() {
        let mut gateway = MockLanguageModelGateway::new();
        gateway.expect_generate().times(0);
        let (service, _) = service(gateway);

        let summary = service.summarize(&[]).await;
        assert_eq!(summary.overview, FALLBACK_OVERVIEW);
        assert_eq!(summary.recommendations, fallback_recommendations());
    }

    #[tokio::test]
    async fn test_both_halves_succeed() {
        let mut gateway = MockLanguageModelGateway::new();
        gateway.expect_generate().times(2).returning(|request| {
            assert!(request.system_instruction.is_none());
            if is_overview(&request) {
                GenerationOutcome::Text("  The patient reported a persistent headache.  ".into())
            } else {
                GenerationOutcome::Text("1. Rest\n2. Drink water\n3. Limit screen time".into())
            }
        });
        let (service, metrics) = service(gateway);

        let summary = service.summarize(&transcript()).await;
        assert_eq!(summary.overview, "The patient reported a persistent headache.");
        assert_eq!(
            summary.recommendations,
            vec!["Rest", "Drink water", "Limit screen time"]
        );
        assert_eq!(metrics.summary_fallbacks_total.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overview_failure_keeps_recommendations() {
        let mut gateway = MockLanguageModelGateway::new();
        gateway.expect_generate().times(2).returning(|request| {
            if is_overview(&request) {
                GenerationOutcome::Error(AppError::UpstreamUnavailable("timeout".into()))
            } else {
                GenerationOutcome::Text("- Stay hydrated\n- Rest well".into())
            }
        });
        let (service, metrics) = service(gateway);

        let summary = service.summarize(&transcript()).await;
        assert_eq!(summary.overview, FALLBACK_OVERVIEW);
        assert_eq!(summary.recommendations, vec!["Stay hydrated", "Rest well"]);
        assert_eq!(metrics.summary_fallbacks_total.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.upstream_failures_total.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_blocked_recommendations_use_canned_list() {
        let mut gateway = MockLanguageModelGateway::new();
        gateway.expect_generate().times(2).returning(|request| {
            if is_overview(&request) {
                GenerationOutcome::Text("Short visit about a headache.".into())
            } else {
                GenerationOutcome::Blocked {
                    reason: "SAFETY".into(),
                }
            }
        });
        let (service, _) = service(gateway);

        let summary = service.summarize(&transcript()).await;
        assert_eq!(summary.overview, "Short visit about a headache.");
        assert_eq!(summary.recommendations, fallback_recommendations());
    }

    #[tokio::test]
    async fn test_unusable_recommendations_use_canned_list() {
        let mut gateway = MockLanguageModelGateway::new();
        gateway.expect_generate().times(2).returning(|request| {
            if is_overview(&request) {
                GenerationOutcome::Text("Overview.".into())
            } else {
                GenerationOutcome::Text("**\n1.\n- ok".into())
            }
        });
        let (service, metrics) = service(gateway);

        let summary = service.summarize(&transcript()).await;
        assert_eq!(summary.recommendations, fallback_recommendations());
        assert_eq!(metrics.summary_fallbacks_total.load(Ordering::SeqCst), 1);
    }
}
