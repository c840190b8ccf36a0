pub mod assembler;
pub mod duration;
pub mod error;
pub mod provider;
pub mod segmenter;
pub mod service;

pub use assembler::{AudioAssembler, Mp3ConcatAssembler, WavAssembler};
pub use error::{AssemblyError, AudioServiceError, SynthesisError};
pub use provider::{StoryAudio, SynthesizedChunk, TtsProvider, VoiceOverride};
pub use service::{AudioBackend, StoryAudioService, StoryAudioServiceApi};

use chrono::Utc;
use uuid::Uuid;

/// `{prefix}_{YYYYmmdd_HHMMSS}_{8 hex}.{extension}`, unique across concurrent runs
pub fn unique_file_name(prefix: &str, extension: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.{}", prefix, timestamp, &id[..8], extension)
}
