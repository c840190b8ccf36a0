use crate::domain::audio::{SynthesisError, SynthesizedChunk, TtsProvider, VoiceOverride};
use async_trait::async_trait;

/// Repository for single-chunk speech synthesis.
/// Abstracts the underlying TTS provider (Yandex SpeechKit, Google Cloud long audio, ...)
///
/// Implementations are responsible for:
/// - Submitting one already-wrapped SSML chunk to the provider
/// - Reading the chunk's duration out of the returned container
/// - Any provider-side staging the request needs
///
/// Splitting and merging are done by the caller, which is why every implementation
/// advertises its request size ceiling and output format.
#[async_trait]
pub trait SynthesisRepository: Send + Sync {
    fn provider(&self) -> TtsProvider;

    /// Largest SSML request, in bytes, the provider accepts
    fn max_chunk_size(&self) -> usize;

    /// MIME type of the audio this provider returns
    fn content_type(&self) -> &'static str;

    fn file_extension(&self) -> &'static str;

    /// Prefix for the stored file name, e.g. `yandex_tts`
    fn key_prefix(&self) -> &'static str;

    /// Synthesize one `<speak>`-wrapped chunk
    ///
    /// # Errors
    /// Returns error if the provider rejects the request, the job fails or times out
    async fn synthesize(
        &self,
        ssml: &str,
        voice: &VoiceOverride,
    ) -> Result<SynthesizedChunk, SynthesisError>;
}
