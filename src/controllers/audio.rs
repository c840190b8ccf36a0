use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    domain::audio::{StoryAudio, StoryAudioServiceApi, TtsProvider, VoiceOverride},
    error::{AppError, AppResult},
};

/// Request for POST /api/audio/story
#[derive(Debug, Serialize, Deserialize)]
pub struct StoryAudioRequest {
    /// SSML-marked-up story text
    pub text: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

pub struct AudioController {
    audio_service: Arc<dyn StoryAudioServiceApi>,
}

impl AudioController {
    pub fn new(audio_service: Arc<dyn StoryAudioServiceApi>) -> Self {
        Self { audio_service }
    }

    /// POST /api/audio/story - Voice a marked-up story and store the audio
    pub async fn make_story_audio(
        State(controller): State<Arc<AudioController>>,
        Json(request): Json<StoryAudioRequest>,
    ) -> AppResult<Json<StoryAudio>> {
        if request.text.trim().is_empty() {
            return Err(AppError::BadRequest("Text cannot be empty".to_string()));
        }

        let provider: TtsProvider = request.provider.parse().map_err(AppError::BadRequest)?;

        let voice = VoiceOverride {
            voice: request.voice,
            language_code: request.language_code,
        };

        let result = controller
            .audio_service
            .make_story_audio(&request.text, provider, voice)
            .await?;

        Ok(Json(result))
    }

    /// GET /health/ready - Report which providers are wired up
    pub async fn health_ready(
        State(controller): State<Arc<AudioController>>,
    ) -> (StatusCode, Json<Value>) {
        let providers: Vec<&'static str> = controller
            .audio_service
            .providers()
            .iter()
            .map(TtsProvider::as_str)
            .collect();

        if providers.is_empty() {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "not_ready", "providers": providers })),
            );
        }

        (
            StatusCode::OK,
            Json(json!({ "status": "ready", "providers": providers })),
        )
    }
}
