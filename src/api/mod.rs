//! API 模块
//!
//! 提供 REST API 支持。

pub mod app_state;
pub mod dto;
pub mod handlers;
pub mod routes;

use std::sync::Arc;

use crate::api::app_state::AppState;
use crate::error::AppError;
use crate::observability::{ObservabilityState, create_observability_router, metrics_middleware};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// 业务路由，挂载在 `/api` 下
pub fn create_router(app_state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::chat_routes::create_chat_router())
        .merge(routes::insights_routes::create_insights_router())
        .merge(routes::session_routes::create_session_router())
        .merge(routes::speech_routes::create_speech_router());

    Router::new().nest("/api", api).with_state(app_state)
}

/// 只允许前端来源跨域访问
pub fn cors_layer(origin: &str) -> Result<CorsLayer, AppError> {
    let origin = origin
        .parse::<HeaderValue>()
        .map_err(|e| AppError::Config(format!("invalid CORS origin '{}': {}", origin, e)))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .allow_credentials(true))
}

/// 完整应用：业务路由 + 可观测性路由 + 中间件
pub fn create_app(
    app_state: AppState,
    observability: Arc<ObservabilityState>,
    cors_origin: &str,
) -> Result<Router, AppError> {
    Ok(create_router(app_state)
        .merge(create_observability_router(observability.clone()))
        .layer(axum::middleware::from_fn_with_state(
            observability,
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origin)?))
}

pub async fn initialize_api(
    app_state: AppState,
    observability: Arc<ObservabilityState>,
    cors_origin: &str,
) -> Result<Router, AppError> {
    tracing::info!("Initializing API router...");
    create_app(app_state, observability, cors_origin)
}
