//! Insights Routes

use crate::api::handlers::insights_handler::*;
use axum::{Router, routing::post};

use crate::api::app_state::AppState;

/// 创建洞察路由器
pub fn create_insights_router() -> Router<AppState> {
    Router::new().route("/insights", post(generate_insights))
}
