use crate::error::AppError;
use std::time::Duration;

/// Failure of a single chunk synthesis against a TTS provider
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("provider responded with status {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("request to provider failed: {0}")]
    Transport(String),
    #[error("synthesis job failed: {0}")]
    JobFailed(String),
    #[error("synthesis job did not finish within {0:?}")]
    Timeout(Duration),
    #[error("staging storage error: {0}")]
    Staging(String),
    #[error("provider authentication failed: {0}")]
    Auth(String),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SynthesisError::Provider {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => SynthesisError::Transport(err.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("no audio chunks to assemble")]
    Empty,
    #[error("chunk {index} format ({found}) differs from the first chunk ({expected})")]
    FormatMismatch {
        index: usize,
        expected: String,
        found: String,
    },
    #[error("chunk {index} is not a readable container: {message}")]
    InvalidContainer { index: usize, message: String },
    #[error("failed to write merged audio: {0}")]
    Write(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AudioServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error("provider {0} is not configured")]
    ProviderUnavailable(String),
    #[error("chunk {chunk}/{total} synthesis failed: {source}")]
    Synthesis {
        chunk: usize,
        total: usize,
        #[source]
        source: SynthesisError,
    },
    #[error("audio assembly failed: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("upload failed: {0}")]
    Upload(String),
}

impl From<AudioServiceError> for AppError {
    fn from(err: AudioServiceError) -> Self {
        match err {
            AudioServiceError::Invalid(msg) => AppError::BadRequest(msg),
            AudioServiceError::ProviderUnavailable(_) => AppError::BadRequest(err.to_string()),
            AudioServiceError::Synthesis { .. } | AudioServiceError::Upload(_) => {
                AppError::ExternalService(err.to_string())
            }
            AudioServiceError::Assembly(e) => AppError::Internal(e.to_string()),
        }
    }
}
