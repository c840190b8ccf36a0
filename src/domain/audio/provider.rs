use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// TTS providers a story can be voiced with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TtsProvider {
    /// Yandex SpeechKit, MP3 returned in one round trip
    #[serde(rename = "yandex_speechkit")]
    YandexSpeechKit,
    /// Google Cloud long audio synthesis, WAV staged in Cloud Storage
    #[serde(rename = "google_cloud_long_tts")]
    GoogleCloudLongAudio,
}

impl TtsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsProvider::YandexSpeechKit => "yandex_speechkit",
            TtsProvider::GoogleCloudLongAudio => "google_cloud_long_tts",
        }
    }
}

impl std::fmt::Display for TtsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yandex_speechkit" | "yandex" => Ok(TtsProvider::YandexSpeechKit),
            "google_cloud_long_tts" | "google" => Ok(TtsProvider::GoogleCloudLongAudio),
            other => Err(format!("unknown TTS provider: {}", other)),
        }
    }
}

/// Per-story voice settings that replace the provider defaults
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceOverride {
    pub voice: Option<String>,
    pub language_code: Option<String>,
}

/// Audio for one chunk, straight from the provider
#[derive(Debug, Clone)]
pub struct SynthesizedChunk {
    pub audio: Vec<u8>,
    pub duration_secs: f64,
}

/// Final result of voicing a story
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryAudio {
    pub url: String,
    /// Total length in seconds
    pub duration: f64,
    pub service: String,
}
