//! 服务模块

pub mod fusion;
pub mod insights;
pub mod prompt;
pub mod sentiment;
pub mod session;
pub mod summary;
pub mod turn;

pub use fusion::{analyze_mismatch, detect_transition, expected_sentiment};
pub use insights::{build_chart, compute_statistics, validate_lengths};
pub use prompt::{END_CONSULTATION_TAG, PERSONA_INSTRUCTION, compose};
pub use session::{
    DEFAULT_SESSION_ID, InMemorySessionStore, SessionHandle, SessionStore, create_session_store,
    resolve_session_id,
};
pub use summary::{SummaryService, SummaryServiceImpl, create_summary_service};
pub use turn::{ReplyResult, SessionHistory, TurnInput, TurnService, TurnServiceImpl, create_turn_service};
