// Integration tests for the consultation flow
//
// Tests cover:
// - Emotion statistics and chart alignment
// - Text/face mismatch detection
// - Multi-turn consultations against a scripted language model
// - Summary normalization and fallbacks
// - The HTTP surface wired end to end

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use medconsult::api::{app_state::AppState, create_app};
use medconsult::llm::{GenerationConfig, GenerationOutcome, GenerationRequest, LanguageModelGateway};
use medconsult::models::{MismatchType, SessionState, TranscriptEntry};
use medconsult::observability::{AppMetrics, ObservabilityState};
use medconsult::services::prompt::END_CONSULTATION_TAG;
use medconsult::services::summary::{FALLBACK_OVERVIEW, normalize_recommendations};
use medconsult::services::{
    InMemorySessionStore, SummaryService, SummaryServiceImpl, TurnInput, TurnService,
    TurnServiceImpl, analyze_mismatch, build_chart, compute_statistics,
};

type Responder = Box<dyn Fn(&GenerationRequest) -> GenerationOutcome + Send + Sync>;

/// 按请求内容返回预设结果，并记录收到的请求
struct ScriptedGateway {
    responder: Responder,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGateway {
    fn new(responder: impl Fn(&GenerationRequest) -> GenerationOutcome + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> GenerationRequest {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl LanguageModelGateway for ScriptedGateway {
    async fn generate(&self, request: GenerationRequest) -> GenerationOutcome {
        let outcome = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        outcome
    }
}

fn labels(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn turn_service(gateway: Arc<ScriptedGateway>) -> TurnServiceImpl {
    TurnServiceImpl::new(
        Arc::new(InMemorySessionStore::new()),
        gateway,
        GenerationConfig::default(),
        Arc::new(AppMetrics::default()),
    )
}

mod aggregation_tests {
    use super::*;

    #[test]
    fn test_percentages_sum_to_100_and_dominant_is_max() {
        let stats = compute_statistics(&labels(&["sad", "happy", "sad", "neutral", "fearful", "sad"]));

        let total: f64 = stats.emotion_percentages.values().sum();
        assert!((total - 100.0).abs() < 1e-9);

        let dominant = stats.emotion_counts[&stats.dominant_emotion];
        assert!(stats.emotion_counts.values().all(|&c| dominant >= c));
        assert_eq!(stats.dominant_emotion, "sad");
    }

    #[test]
    fn test_empty_emotions() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total_samples, 1);
        assert!(stats.emotion_counts.is_empty());
        assert_eq!(stats.dominant_emotion, "neutral");
    }

    #[test]
    fn test_tie_goes_to_first_seen() {
        assert_eq!(compute_statistics(&labels(&["happy", "sad"])).dominant_emotion, "happy");
    }

    #[test]
    fn test_chart_zip() {
        let chart = build_chart(&labels(&["a", "b", "c"]), &labels(&["t1", "t2"]));
        let pairs: Vec<(&str, &str)> = chart
            .iter()
            .map(|p| (p.timestamp.as_str(), p.emotion.as_str()))
            .collect();
        assert_eq!(pairs, vec![("t1", "a"), ("t2", "b")]);
    }
}

mod fusion_tests {
    use super::*;

    #[test]
    fn test_terrible_with_happy_face() {
        let analysis = analyze_mismatch("This is terrible", "happy");
        assert!(analysis.mismatch_detected);
        assert_eq!(analysis.mismatch_type, MismatchType::NegativeWordsPositiveFace);
    }

    #[test]
    fn test_fine_with_happy_face() {
        let analysis = analyze_mismatch("I'm fine", "happy");
        assert!(!analysis.mismatch_detected);
        assert_eq!(analysis.mismatch_type, MismatchType::None);
    }
}

mod consultation_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_consultation_ends_with_tag() {
        let gateway = ScriptedGateway::new(|request| {
            let turns = (request.contents.len() + 1) / 2;
            let reply = match turns {
                1 => "I'm sorry to hear that. How long have you had the headache?".to_string(),
                2 => "Have you noticed anything that makes it worse?".to_string(),
                _ => format!(
                    "This sounds like a tension headache. Rest, stay hydrated and see your doctor if it persists. {}",
                    END_CONSULTATION_TAG
                ),
            };
            GenerationOutcome::Text(reply)
        });
        let service = turn_service(gateway.clone());

        let first = service
            .submit_turn("p1", TurnInput::new("I have a headache", "sad").with_age(Some(34), Some("Adult")))
            .await;
        assert!(first.followup_needed);
        assert!(!first.should_end_consultation);

        service.submit_turn("p1", TurnInput::new("Three days", "sad")).await;
        let last = service
            .submit_turn("p1", TurnInput::new("Looking at screens", "neutral"))
            .await;

        assert!(last.should_end_consultation);
        assert!(!last.text.contains(END_CONSULTATION_TAG));
        assert!(last.text.ends_with("if it persists."));

        let request = gateway.last_request();
        assert_eq!(request.contents.len(), 5);
        assert!(request.last_user_text().unwrap().contains("Do not ask any more questions"));

        let history = service.history("p1").await.unwrap();
        assert_eq!(history.turns.len(), 6);
        assert_eq!(history.state, SessionState::Ended);
    }

    #[tokio::test]
    async fn test_mismatch_note_reaches_the_model() {
        let gateway = ScriptedGateway::new(|_| GenerationOutcome::Text("Are you sure you're okay?".into()));
        let service = turn_service(gateway.clone());

        service
            .submit_turn("p1", TurnInput::new("I'm great, really good, everything is fine!", "sad"))
            .await;

        let prompt = gateway.last_request().last_user_text().unwrap().to_string();
        assert!(prompt.contains("[Facial expression: sad]"));
        assert!(prompt.contains("[Note: The patient's words sound positive"));
    }

    #[tokio::test]
    async fn test_blocked_reply_never_fails() {
        let gateway = ScriptedGateway::new(|_| GenerationOutcome::Blocked {
            reason: "SAFETY".into(),
        });
        let service = turn_service(gateway.clone());

        let reply = service.submit_turn("p1", TurnInput::new("hello", "neutral")).await;
        assert!(reply.followup_needed);
        assert!(!reply.should_end_consultation);
        assert!(!reply.text.is_empty());
        assert_eq!(gateway.calls(), 1);
    }
}

mod summary_tests {
    use super::*;

    #[test]
    fn test_normalization_examples() {
        assert_eq!(normalize_recommendations("1. **Take rest**\nok"), vec!["Take rest"]);
    }

    #[tokio::test]
    async fn test_summary_with_one_failed_half() {
        let gateway = ScriptedGateway::new(|request| {
            if request.last_user_text().unwrap_or_default().contains("brief overview") {
                GenerationOutcome::Blocked {
                    reason: "empty candidates".into(),
                }
            } else {
                GenerationOutcome::Text("1. **Sleep 8 hours**\n2. Drink water\n3. ok".into())
            }
        });
        let service = SummaryServiceImpl::new(
            gateway.clone(),
            GenerationConfig::default(),
            Arc::new(AppMetrics::default()),
        );

        let summary = service
            .summarize(&[
                TranscriptEntry::new("user", "I can't sleep"),
                TranscriptEntry::new("assistant", "How long?"),
            ])
            .await;

        assert_eq!(summary.overview, FALLBACK_OVERVIEW);
        assert_eq!(summary.recommendations, vec!["Sleep 8 hours", "Drink water"]);
        assert_eq!(gateway.calls(), 2);
    }
}

mod http_tests {
    use super::*;

    fn app(gateway: Arc<ScriptedGateway>) -> axum::Router {
        let metrics = Arc::new(AppMetrics::default());
        let turns = TurnServiceImpl::new(
            Arc::new(InMemorySessionStore::new()),
            gateway.clone(),
            GenerationConfig::default(),
            metrics.clone(),
        );
        let summary = SummaryServiceImpl::new(gateway, GenerationConfig::default(), metrics.clone());
        let state = AppState::new(Box::new(turns), Box::new(summary), metrics.clone());
        let observability = Arc::new(ObservabilityState::new("test".into(), metrics));
        create_app(state, observability, "http://localhost:3000").unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_session_lifecycle_over_http() {
        let app = app(ScriptedGateway::new(|_| {
            GenerationOutcome::Text("What symptoms are you having?".into())
        }));

        let created = app
            .clone()
            .oneshot(post_json("/api/sessions", json!({})))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let session_id = json_body(created).await["session_id"].as_str().unwrap().to_string();

        let chat = app
            .clone()
            .oneshot(post_json(
                "/api/chat",
                json!({"message": "Hi doctor", "emotion": "neutral", "session_id": session_id}),
            ))
            .await
            .unwrap();
        assert_eq!(chat.status(), StatusCode::OK);
        assert_eq!(json_body(chat).await["response"], "What symptoms are you having?");

        let uri = format!("/api/sessions/{}", session_id);
        let history = app
            .clone()
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(history).await["turn_count"], 2);

        let deleted = app
            .clone()
            .oneshot(Request::delete(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::OK);

        let missing = app
            .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_insights_over_http_with_model_down() {
        let app = app(ScriptedGateway::new(|_| {
            GenerationOutcome::Blocked {
                reason: "unavailable".into(),
            }
        }));

        let response = app
            .oneshot(post_json(
                "/api/insights",
                json!({
                    "conversation": [{"role": "user", "content": "My knee hurts", "timestamp": "2025-11-22T10:00:00Z"}],
                    "emotions": ["sad", "sad", "neutral"],
                    "timestamps": ["t1", "t2", "t3"]
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["summary"]["overview"], FALLBACK_OVERVIEW);
        assert_eq!(body["summary"]["recommendations"].as_array().unwrap().len(), 3);
        assert_eq!(body["emotion_stats"]["dominant_emotion"], "sad");
        assert_eq!(body["emotion_chart"].as_array().unwrap().len(), 3);
    }
}
