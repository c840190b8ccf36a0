use super::preview;
use super::synthesis_repository::SynthesisRepository;
use crate::domain::audio::duration::{duration_or_zero, mp3_duration_secs};
use crate::domain::audio::{SynthesisError, SynthesizedChunk, TtsProvider, VoiceOverride};
use crate::infrastructure::config::YandexConfig;
use async_trait::async_trait;

/// Yandex SpeechKit v1 accepts at most 5000 characters of SSML; stay well below
const MAX_CHUNK_SIZE: usize = 4500;

/// Yandex SpeechKit implementation of the synthesis repository
pub struct YandexSynthesisRepository {
    http: reqwest::Client,
    config: YandexConfig,
}

impl YandexSynthesisRepository {
    pub fn new(http: reqwest::Client, config: YandexConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/speech/v1/tts:synthesize",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Call SpeechKit for a single SSML chunk and return the MP3 bytes
    async fn call_speechkit(&self, ssml: &str, voice: &VoiceOverride) -> Result<Vec<u8>, SynthesisError> {
        let voice_name = voice.voice.as_deref().unwrap_or(&self.config.voice);
        let lang = voice.language_code.as_deref().unwrap_or(&self.config.lang);
        let speed = self.config.speed.to_string();
        let sample_rate = self.config.sample_rate_hertz.to_string();

        tracing::info!(
            voice = voice_name,
            lang,
            emotion = %self.config.emotion,
            output_format = "mp3",
            ssml_length = ssml.len(),
            ssml_preview = preview(ssml, 200),
            "Calling Yandex SpeechKit synthesize"
        );

        let form = [
            ("ssml", ssml),
            ("lang", lang),
            ("voice", voice_name),
            ("emotion", self.config.emotion.as_str()),
            ("speed", speed.as_str()),
            ("format", "mp3"),
            ("sampleRateHertz", sample_rate.as_str()),
            ("folderId", self.config.folder_id.as_str()),
        ];

        let response = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Api-Key {}", self.config.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, voice = voice_name, "Yandex SpeechKit request failed");
                SynthesisError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                error_body = %message,
                voice = voice_name,
                ssml_length = ssml.len(),
                "Yandex SpeechKit returned an error"
            );
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response.bytes().await?.to_vec();
        tracing::debug!(audio_size = audio.len(), "Yandex SpeechKit audio received");

        Ok(audio)
    }
}

#[async_trait]
impl SynthesisRepository for YandexSynthesisRepository {
    fn provider(&self) -> TtsProvider {
        TtsProvider::YandexSpeechKit
    }

    fn max_chunk_size(&self) -> usize {
        MAX_CHUNK_SIZE
    }

    fn content_type(&self) -> &'static str {
        "audio/mpeg"
    }

    fn file_extension(&self) -> &'static str {
        "mp3"
    }

    fn key_prefix(&self) -> &'static str {
        "yandex_tts"
    }

    async fn synthesize(
        &self,
        ssml: &str,
        voice: &VoiceOverride,
    ) -> Result<SynthesizedChunk, SynthesisError> {
        let start_time = std::time::Instant::now();

        let audio = self.call_speechkit(ssml, voice).await?;
        let duration_secs = duration_or_zero(
            mp3_duration_secs(&audio),
            self.provider().as_str(),
            audio.len(),
        );

        tracing::info!(
            provider = "yandex",
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = ssml.len(),
            audio_size_bytes = audio.len(),
            duration_secs,
            "Chunk synthesis completed"
        );

        Ok(SynthesizedChunk {
            audio,
            duration_secs,
        })
    }
}
