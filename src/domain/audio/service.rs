use super::assembler::AudioAssembler;
use super::error::AudioServiceError;
use super::provider::{StoryAudio, TtsProvider, VoiceOverride};
use super::segmenter::{split_into_chunks, strip_root, wrap};
use super::unique_file_name;
use crate::infrastructure::repositories::{BlobRepository, SynthesisRepository};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// A synthesis provider together with the assembler for the audio it produces
#[derive(Clone)]
pub struct AudioBackend {
    pub synthesizer: Arc<dyn SynthesisRepository>,
    pub assembler: Arc<dyn AudioAssembler>,
}

impl AudioBackend {
    pub fn new(
        synthesizer: Arc<dyn SynthesisRepository>,
        assembler: Arc<dyn AudioAssembler>,
    ) -> Self {
        Self {
            synthesizer,
            assembler,
        }
    }
}

pub struct StoryAudioService {
    backends: HashMap<TtsProvider, AudioBackend>,
    blob_repo: Arc<dyn BlobRepository>,
}

impl StoryAudioService {
    pub fn new(blob_repo: Arc<dyn BlobRepository>) -> Self {
        Self {
            backends: HashMap::new(),
            blob_repo,
        }
    }

    /// Register a backend under the provider it reports
    pub fn with_backend(mut self, backend: AudioBackend) -> Self {
        let provider = backend.synthesizer.provider();
        tracing::info!(provider = %provider, "Audio backend registered");
        self.backends.insert(provider, backend);
        self
    }
}

#[async_trait]
pub trait StoryAudioServiceApi: Send + Sync {
    /// Voice a marked-up story and store the result
    ///
    /// This operation:
    /// - Splits the SSML into provider-sized chunks along paragraph boundaries
    /// - Synthesizes every chunk in order, aborting on the first failure
    /// - Merges the chunk audio and uploads it
    ///
    /// Returns the public URL, the total duration in seconds and the provider name
    async fn make_story_audio(
        &self,
        ssml: &str,
        provider: TtsProvider,
        voice: VoiceOverride,
    ) -> Result<StoryAudio, AudioServiceError>;

    /// Providers this service has a backend for
    fn providers(&self) -> Vec<TtsProvider>;
}

#[async_trait]
impl StoryAudioServiceApi for StoryAudioService {
    async fn make_story_audio(
        &self,
        ssml: &str,
        provider: TtsProvider,
        voice: VoiceOverride,
    ) -> Result<StoryAudio, AudioServiceError> {
        if ssml.trim().is_empty() {
            return Err(AudioServiceError::Invalid("Story text cannot be empty".to_string()));
        }

        let backend = self
            .backends
            .get(&provider)
            .ok_or_else(|| AudioServiceError::ProviderUnavailable(provider.to_string()))?;

        let start_time = std::time::Instant::now();

        // 1. Text -> audio
        let (audio, duration) = self.synthesize_story(backend, ssml, &voice).await?;

        // 2. Audio -> blob store
        let synthesizer = &backend.synthesizer;
        let key = format!(
            "audio/{}",
            unique_file_name(synthesizer.key_prefix(), synthesizer.file_extension())
        );
        let audio_size = audio.len();
        let url = self
            .blob_repo
            .upload(&key, audio, synthesizer.content_type())
            .await
            .map_err(AudioServiceError::Upload)?;

        tracing::info!(
            provider = %provider,
            latency_ms = start_time.elapsed().as_millis(),
            text_length = ssml.len(),
            audio_size_bytes = audio_size,
            duration_secs = duration,
            url = %url,
            "Story audio completed"
        );

        Ok(StoryAudio {
            url,
            duration,
            service: provider.to_string(),
        })
    }

    fn providers(&self) -> Vec<TtsProvider> {
        let mut providers: Vec<TtsProvider> = self.backends.keys().copied().collect();
        providers.sort_by_key(|p| p.as_str());
        providers
    }
}

impl StoryAudioService {
    /// Split, synthesize and merge; returns the merged audio and its total duration
    async fn synthesize_story(
        &self,
        backend: &AudioBackend,
        ssml: &str,
        voice: &VoiceOverride,
    ) -> Result<(Vec<u8>, f64), AudioServiceError> {
        let max_size = backend.synthesizer.max_chunk_size();

        let content = strip_root(ssml);
        let chunks = split_into_chunks(&content, max_size);

        tracing::info!(
            provider = %backend.synthesizer.provider(),
            text_length = ssml.len(),
            content_length = content.len(),
            chunk_count = chunks.len(),
            max_chunk_size = max_size,
            "SSML split into chunks"
        );

        // Short stories go to the provider exactly as written
        let requests: Vec<String> = if chunks.len() == 1 && ssml.len() <= max_size {
            tracing::debug!("Text fits in one request, submitting it unchanged");
            vec![ssml.to_string()]
        } else {
            chunks.iter().map(|chunk| wrap(chunk)).collect()
        };

        let total = requests.len();
        let mut audio_chunks = Vec::with_capacity(total);
        let mut total_duration = 0.0;

        for (index, request) in requests.iter().enumerate() {
            tracing::info!(
                chunk_index = index,
                chunk_count = total,
                chunk_bytes = request.len(),
                "Synthesizing chunk"
            );

            let chunk = backend
                .synthesizer
                .synthesize(request, voice)
                .await
                .map_err(|source| {
                    tracing::error!(
                        chunk_index = index,
                        chunk_count = total,
                        error = %source,
                        "Chunk synthesis failed, aborting story"
                    );
                    AudioServiceError::Synthesis {
                        chunk: index + 1,
                        total,
                        source,
                    }
                })?;

            tracing::info!(
                chunk_index = index,
                audio_size = chunk.audio.len(),
                duration_secs = chunk.duration_secs,
                "Chunk synthesized"
            );

            total_duration += chunk.duration_secs;
            audio_chunks.push(chunk.audio);
        }

        let merged = backend.assembler.assemble(audio_chunks)?;

        Ok((merged, total_duration))
    }
}
