use crate::config::InsightsConfig;
use crate::error::AppError;
use crate::observability::AppMetrics;
use crate::services::summary::SummaryService;
use crate::services::turn::TurnService;
use crate::speech::{SpeechToText, TextToSpeech};
use std::sync::Arc;

/// Application state containing all shared services
#[derive(Clone)]
pub struct AppState {
    /// Consultation turns and session lifecycle
    pub turn_service: Arc<dyn TurnService>,
    /// Post-consultation summary
    pub summary_service: Arc<dyn SummaryService>,
    /// Text-to-speech, absent when no speech API key is configured
    pub text_to_speech: Option<Arc<dyn TextToSpeech>>,
    /// Speech-to-text, absent when no speech API key is configured
    pub speech_to_text: Option<Arc<dyn SpeechToText>>,
    /// Shared counters
    pub metrics: Arc<AppMetrics>,
    /// Insights endpoint settings
    pub insights: InsightsConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("turn_service", &"Arc<dyn TurnService>")
            .field("summary_service", &"Arc<dyn SummaryService>")
            .field("text_to_speech", &self.text_to_speech.is_some())
            .field("speech_to_text", &self.speech_to_text.is_some())
            .field("insights", &self.insights)
            .finish()
    }
}

impl AppState {
    /// Create new application state
    pub fn new(
        turn_service: Box<dyn TurnService>,
        summary_service: Box<dyn SummaryService>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            turn_service: Arc::from(turn_service),
            summary_service: Arc::from(summary_service),
            text_to_speech: None,
            speech_to_text: None,
            metrics,
            insights: InsightsConfig::default(),
        }
    }

    /// Attach speech services
    pub fn with_speech(
        mut self,
        text_to_speech: Arc<dyn TextToSpeech>,
        speech_to_text: Arc<dyn SpeechToText>,
    ) -> Self {
        self.text_to_speech = Some(text_to_speech);
        self.speech_to_text = Some(speech_to_text);
        self
    }

    pub fn with_insights_config(mut self, insights: InsightsConfig) -> Self {
        self.insights = insights;
        self
    }

    pub fn tts(&self) -> Result<&Arc<dyn TextToSpeech>, AppError> {
        self.text_to_speech
            .as_ref()
            .ok_or_else(|| AppError::ConfigurationMissing("speech.api_key (ELEVENLABS_API_KEY)".into()))
    }

    pub fn stt(&self) -> Result<&Arc<dyn SpeechToText>, AppError> {
        self.speech_to_text
            .as_ref()
            .ok_or_else(|| AppError::ConfigurationMissing("speech.api_key (ELEVENLABS_API_KEY)".into()))
    }
}
