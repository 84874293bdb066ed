//! 会话存储
//!
//! 按会话 ID 保存会话。每个会话包在自己的异步锁里，
//! 同一会话的轮次串行执行，不同会话互不影响。

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::session::Session;

/// 未指定会话 ID 时使用的会话
pub const DEFAULT_SESSION_ID: &str = "default";

/// 会话句柄，持锁期间独占会话
pub type SessionHandle = Arc<Mutex<Session>>;

/// 规整调用方传入的会话 ID，空值映射到默认会话
pub fn resolve_session_id(session_id: Option<&str>) -> String {
    match session_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => DEFAULT_SESSION_ID.to_string(),
    }
}

/// 会话存储 trait
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 获取会话，不存在时创建
    async fn get_or_create(&self, id: &str) -> SessionHandle;

    /// 获取已存在的会话
    async fn get(&self, id: &str) -> Option<SessionHandle>;

    /// 删除会话，返回是否存在
    async fn remove(&self, id: &str) -> bool;

    /// 会话数量
    async fn count(&self) -> usize;
}

/// 内存会话存储
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, SessionHandle>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, id: &str) -> SessionHandle {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(session_id = %id, "Creating session");
                Arc::new(Mutex::new(Session::new(id)))
            })
            .clone()
    }

    async fn get(&self, id: &str) -> Option<SessionHandle> {
        self.sessions.get(id).map(|entry| entry.value().clone())
    }

    async fn remove(&self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    async fn count(&self) -> usize {
        self.sessions.len()
    }
}

/// 创建会话存储
pub fn create_session_store() -> Arc<dyn SessionStore> {
    Arc::new(InMemorySessionStore::new())
}
