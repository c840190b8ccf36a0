use super::preview;
use super::staging_repository::{StagingObject, StagingRepository};
use super::synthesis_repository::SynthesisRepository;
use crate::domain::audio::duration::{duration_or_zero, wav_duration_secs};
use crate::domain::audio::{
    unique_file_name, SynthesisError, SynthesizedChunk, TtsProvider, VoiceOverride,
};
use crate::infrastructure::config::GoogleLongAudioConfig;
use crate::infrastructure::google::AccessTokenProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Long audio synthesis rejects SSML inputs much beyond this size
const MAX_CHUNK_SIZE: usize = 3500;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeLongAudioRequest<'a> {
    input: SynthesisInput<'a>,
    audio_config: AudioConfig,
    voice: VoiceSelectionParams<'a>,
    output_gcs_uri: &'a str,
}

#[derive(Debug, Serialize)]
struct SynthesisInput<'a> {
    ssml: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
    speaking_rate: f64,
    volume_gain_db: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelectionParams<'a> {
    language_code: &'a str,
    name: &'a str,
    ssml_gender: &'static str,
}

/// Long-running operation as returned by the Google APIs
#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationStatus>,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

/// Google Cloud Text-to-Speech long audio implementation of the synthesis repository.
///
/// The provider writes LINEAR16 WAV output into a staging bucket instead of
/// returning it, so every chunk goes through submit, poll, download and delete.
pub struct GoogleLongAudioRepository {
    http: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    staging: Arc<dyn StagingRepository>,
    config: GoogleLongAudioConfig,
}

impl GoogleLongAudioRepository {
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<dyn AccessTokenProvider>,
        staging: Arc<dyn StagingRepository>,
        config: GoogleLongAudioConfig,
    ) -> Self {
        Self {
            http,
            tokens,
            staging,
            config,
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.config.tts_base_url.trim_end_matches('/'), path)
    }

    async fn bearer_token(&self) -> Result<String, SynthesisError> {
        self.tokens.access_token().await.map_err(SynthesisError::Auth)
    }

    /// Start the long audio job writing to `output_uri`
    async fn submit_job(
        &self,
        ssml: &str,
        voice: &VoiceOverride,
        output_uri: &str,
    ) -> Result<Operation, SynthesisError> {
        let voice_name = voice.voice.as_deref().unwrap_or(&self.config.voice_name);
        let language_code = voice
            .language_code
            .as_deref()
            .unwrap_or(&self.config.language_code);

        let request = SynthesizeLongAudioRequest {
            input: SynthesisInput { ssml },
            audio_config: AudioConfig {
                audio_encoding: "LINEAR16",
                speaking_rate: self.config.speaking_rate,
                volume_gain_db: self.config.volume_gain_db,
            },
            voice: VoiceSelectionParams {
                language_code,
                name: voice_name,
                ssml_gender: "FEMALE",
            },
            output_gcs_uri: output_uri,
        };

        tracing::info!(
            voice = voice_name,
            language_code,
            audio_encoding = "LINEAR16",
            output_uri,
            ssml_length = ssml.len(),
            ssml_preview = preview(ssml, 200),
            "Submitting Google long audio synthesis"
        );

        let url = self.api_url(&format!(
            "projects/{}/locations/global:synthesizeLongAudio",
            self.config.project_id
        ));
        let response = self
            .http
            .post(url)
            .bearer_auth(self.bearer_token().await?)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, voice = voice_name, "Google long audio request failed");
                SynthesisError::Transport(e.to_string())
            })?;

        Self::read_operation(response).await
    }

    async fn poll_operation(&self, name: &str) -> Result<Operation, SynthesisError> {
        let response = self
            .http
            .get(self.api_url(name))
            .bearer_auth(self.bearer_token().await?)
            .send()
            .await
            .map_err(|e| SynthesisError::Transport(e.to_string()))?;

        Self::read_operation(response).await
    }

    async fn read_operation(response: reqwest::Response) -> Result<Operation, SynthesisError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                error_body = %message,
                "Google Text-to-Speech returned an error"
            );
            return Err(SynthesisError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Operation>()
            .await
            .map_err(|e| SynthesisError::Transport(format!("malformed operation: {}", e)))
    }

    /// Submit the job and wait until the operation reports done
    async fn run_job(
        &self,
        ssml: &str,
        voice: &VoiceOverride,
        output_uri: &str,
    ) -> Result<(), SynthesisError> {
        let mut operation = self.submit_job(ssml, voice, output_uri).await?;
        tracing::info!(operation = %operation.name, "Long audio job started");

        let mut polls = 0u32;
        while !operation.done {
            tokio::time::sleep(self.config.poll_interval).await;
            operation = self.poll_operation(&operation.name).await?;
            polls += 1;
            tracing::debug!(operation = %operation.name, polls, done = operation.done, "Polled long audio job");
        }

        if let Some(error) = operation.error {
            tracing::error!(
                operation = %operation.name,
                code = error.code,
                message = %error.message,
                "Long audio job failed"
            );
            return Err(SynthesisError::JobFailed(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }

        tracing::info!(operation = %operation.name, polls, "Long audio job finished");
        Ok(())
    }
}

#[async_trait]
impl SynthesisRepository for GoogleLongAudioRepository {
    fn provider(&self) -> TtsProvider {
        TtsProvider::GoogleCloudLongAudio
    }

    fn max_chunk_size(&self) -> usize {
        MAX_CHUNK_SIZE
    }

    fn content_type(&self) -> &'static str {
        "audio/wav"
    }

    fn file_extension(&self) -> &'static str {
        "wav"
    }

    fn key_prefix(&self) -> &'static str {
        "gc_long_tts"
    }

    async fn synthesize(
        &self,
        ssml: &str,
        voice: &VoiceOverride,
    ) -> Result<SynthesizedChunk, SynthesisError> {
        let start_time = std::time::Instant::now();

        // Deleted on every exit path, including a dropped future
        let object = StagingObject::new(self.staging.clone(), unique_file_name("temp_audio", "wav"));
        let output_uri = object.output_uri();

        tokio::time::timeout(self.config.job_timeout, self.run_job(ssml, voice, &output_uri))
            .await
            .map_err(|_| {
                tracing::error!(
                    staging_object = object.name(),
                    timeout_secs = self.config.job_timeout.as_secs(),
                    "Long audio job timed out"
                );
                SynthesisError::Timeout(self.config.job_timeout)
            })??;

        let downloaded = object.download().await;
        object.release().await;
        let audio = downloaded.map_err(SynthesisError::Staging)?;

        let duration_secs = duration_or_zero(
            wav_duration_secs(&audio),
            self.provider().as_str(),
            audio.len(),
        );

        tracing::info!(
            provider = "google",
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
