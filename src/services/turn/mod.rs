//! 问诊轮次服务
//!
//! 一次患者发言 -> 融合分析 -> 拼装提示 -> 调用模型 -> 清洗回复 -> 写入历史。
//! 模型失败时返回固定的兜底回复，不向调用方抛错。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::llm::{GenerationConfig, GenerationOutcome, GenerationRequest, LanguageModelGateway};
use crate::models::analysis::TransitionSignificance;
use crate::models::session::SessionState;
use crate::models::turn::Turn;
use crate::observability::AppMetrics;
use crate::services::fusion::{analyze_mismatch, detect_transition};
use crate::services::prompt::{PERSONA_INSTRUCTION, compose, strip_end_tag};
use crate::services::session::SessionStore;

/// 会话开头几轮总是需要追问
pub const FOLLOWUP_TURN_THRESHOLD: usize = 3;

/// 会话还没有任何历史时的兜底回复
pub const FALLBACK_GREETING: &str =
    "Hello, I'm your AI doctor. How are you feeling today, and what brings you in?";

/// 已有历史时的兜底回复
pub const FALLBACK_CLARIFICATION: &str = "I understand. Can you tell me more about that?";

/// 模型只回了结束标记时的结束语
pub const FALLBACK_CLOSING: &str = "Thank you for sharing all of this with me. \
Please follow the advice we discussed, and take care.";

/// 一次患者发言
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnInput {
    pub message: String,
    pub emotion: String,
    pub age: Option<u32>,
    pub age_category: Option<String>,
}

impl TurnInput {
    pub fn new(message: &str, emotion: &str) -> Self {
        Self {
            message: message.to_string(),
            emotion: emotion.to_string(),
            age: None,
            age_category: None,
        }
    }

    pub fn with_age(mut self, age: Option<u32>, age_category: Option<&str>) -> Self {
        self.age = age;
        self.age_category = age_category.map(str::to_string);
        self
    }
}

/// 给患者的回复
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyResult {
    pub text: String,
    pub followup_needed: bool,
    pub should_end_consultation: bool,
}

/// 会话历史快照
#[derive(Debug, Clone, Serialize)]
pub struct SessionHistory {
    pub session_id: String,
    pub state: SessionState,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

/// 问诊轮次服务 trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TurnService: Send + Sync {
    /// 创建新会话，返回会话 ID
    async fn open_session(&self) -> String;

    /// 提交一次患者发言
    async fn submit_turn(&self, session_id: &str, input: TurnInput) -> ReplyResult;

    /// 获取会话历史
    async fn history(&self, session_id: &str) -> Result<SessionHistory>;

    /// 删除会话
    async fn reset(&self, session_id: &str) -> Result<()>;
}

/// 问诊轮次服务实现
pub struct TurnServiceImpl {
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn LanguageModelGateway>,
    config: GenerationConfig,
    persona: String,
    metrics: Arc<AppMetrics>,
}

impl TurnServiceImpl {
    pub fn new(
        store: Arc<dyn SessionStore>,
        gateway: Arc<dyn LanguageModelGateway>,
        config: GenerationConfig,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            store,
            gateway,
            config,
            persona: PERSONA_INSTRUCTION.clone(),
            metrics,
        }
    }

    /// 替换默认人设
    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    fn fallback(&self, turns_so_far: usize) -> ReplyResult {
        self.metrics.record_fallback();
        self.metrics.record_upstream_failure();
        ReplyResult {
            text: canned_reply(turns_so_far).to_string(),
            followup_needed: true,
            should_end_consultation: false,
        }
    }
}

fn canned_reply(turns_so_far: usize) -> &'static str {
    if turns_so_far == 0 {
        FALLBACK_GREETING
    } else {
        FALLBACK_CLARIFICATION
    }
}

#[async_trait]
impl TurnService for TurnServiceImpl {
    async fn open_session(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        self.store.get_or_create(&id).await;
        self.metrics.set_active_sessions(self.store.count().await);
        info!(session_id = %id, "Session opened");
        id
    }

    async fn submit_turn(&self, session_id: &str, input: TurnInput) -> ReplyResult {
        self.metrics.record_chat();

        let handle = self.store.get_or_create(session_id).await;
        self.metrics.set_active_sessions(self.store.count().await);
        let mut session = handle.lock().await;
        if session.is_ended() {
            debug!(session_id, "Turn received after consultation ended");
        }

        if let Some(previous) = session.observe_emotion(&input.emotion) {
            let transition = detect_transition(&previous, &input.emotion);
            if transition.significance == TransitionSignificance::High {
                info!(
                    session_id,
                    from = %transition.from,
                    to = %transition.to,
                    "Significant emotion change"
                );
            }
        }

        let mismatch = analyze_mismatch(&input.message, &input.emotion);
        if mismatch.mismatch_detected {
            debug!(
                session_id,
                mismatch_type = ?mismatch.mismatch_type,
                confidence = mismatch.confidence,
                "Text and facial emotion disagree"
            );
        }

        let turns_so_far = session.turns().len();
        let prompt = compose(
            &input.message,
            &input.emotion,
            input.age,
            input.age_category.as_deref(),
            &mismatch,
            session.exchange_count(),
        );

        let request = GenerationRequest {
            system_instruction: Some(self.persona.clone()),
            contents: session.open_chat().request_contents(&prompt),
            config: self.config.clone(),
        };

        let reply = match self.gateway.generate(request).await {
            GenerationOutcome::Text(raw) => {
                let (mut text, ended) = strip_end_tag(&raw);
                session.open_chat().push_exchange(prompt, raw);
                if text.is_empty() {
                    warn!(session_id, ended, "Model reply empty after cleanup, using canned text");
                    self.metrics.record_fallback();
                    let canned = if ended {
                        FALLBACK_CLOSING
                    } else {
                        canned_reply(turns_so_far)
                    };
                    text = canned.to_string();
                }
                if ended {
                    session.mark_ended();
                    self.metrics.record_session_ended();
                    info!(session_id, "Consultation ended by model");
                }
                ReplyResult {
                    followup_needed: text.contains('?') || turns_so_far < FOLLOWUP_TURN_THRESHOLD,
                    should_end_consultation: ended,
                    text,
                }
            }
            GenerationOutcome::Blocked { reason } => {
                warn!(session_id, reason = %reason, "Reply blocked, using fallback");
                self.fallback(turns_so_far)
            }
            GenerationOutcome::Error(e) => {
                warn!(session_id, error = %e, "Reply generation failed, using fallback");
                self.fallback(turns_so_far)
            }
        };

        session.record_exchange(Turn::patient(input.message), Turn::assistant(reply.text.clone()));
        reply
    }

    async fn history(&self, session_id: &str) -> Result<SessionHistory> {
        let handle = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| AppError::NotFound(format!("Session not found: {}", session_id)))?;
        let session = handle.lock().await;

        Ok(SessionHistory {
            session_id: session.id.clone(),
            state: session.state(),
            turns: session.turns().to_vec(),
            created_at: session.created_at,
            last_active_at: session.last_active_at,
        })
    }

    async fn reset(&self, session_id: &str) -> Result<()> {
        if self.store.remove(session_id).await {
            self.metrics.set_active_sessions(self.store.count().await);
            info!(session_id, "Session reset");
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Session not found: {}", session_id)))
        }
    }
}

/// 创建问诊轮次服务
pub fn create_turn_service(
    store: Arc<dyn SessionStore>,
    gateway: Arc<dyn LanguageModelGateway>,
    config: GenerationConfig,
    metrics: Arc<AppMetrics>,
) -> Box<dyn TurnService> {
    Box::new(TurnServiceImpl::new(store, gateway, config, metrics))
}
