use anyhow::Context;
use medconsult::api::{self, app_state::AppState};
use medconsult::config::loader::ConfigLoader;
use medconsult::error::AppError;
use medconsult::llm::{GeminiGateway, LanguageModelGateway};
use medconsult::observability::{AppMetrics, HealthCheckResult, ObservabilityState, init_tracing};
use medconsult::services::{create_session_store, create_summary_service, create_turn_service};
use medconsult::speech::ElevenLabsClient;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 本地开发时从 .env 读取密钥，文件不存在时忽略
    let _ = dotenvy::dotenv();

    let config = ConfigLoader::load().map_err(AppError::from)?;
    let _log_guard = init_tracing(&config.logging)?;

    info!("Starting {} ({})...", config.app_name, config.environment);
    ConfigLoader::validate(&config).map_err(AppError::from)?;
    info!("Configuration loaded successfully");

    let metrics = Arc::new(AppMetrics::default());
    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics.clone(),
    ));

    let gemini = GeminiGateway::new(&config.gemini)?;
    observability_state
        .set_health_check(HealthCheckResult::new(
            "gemini",
            true,
            format!("model {}", gemini.model()),
        ))
        .await;
    info!("Gemini gateway initialized: {}", gemini.model());
    let gateway: Arc<dyn LanguageModelGateway> = Arc::new(gemini);

    let generation_config = config.gemini.generation_config();
    let store = create_session_store();
    let turn_service = create_turn_service(
        store,
        gateway.clone(),
        generation_config.clone(),
        metrics.clone(),
    );
    let summary_service = create_summary_service(gateway, generation_config, metrics.clone());
    info!("Consultation services initialized");

    let mut app_state = AppState::new(turn_service, summary_service, metrics)
        .with_insights_config(config.insights.clone());

    // 语音是可选能力，缺少密钥时相关接口返回 503
    match ElevenLabsClient::new(&config.speech) {
        Ok(client) => {
            let client = Arc::new(client);
            app_state = app_state.with_speech(client.clone(), client);
            info!("Speech client initialized (voice: {})", config.speech.default_voice_id);
        }
        Err(e) => warn!("Speech endpoints disabled: {}", e),
    }

    let router =
        api::initialize_api(app_state, observability_state, &config.server.cors_origin).await?;
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
