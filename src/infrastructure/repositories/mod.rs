pub mod blob_repository;
pub mod google_long_audio_repository;
pub mod staging_repository;
pub mod synthesis_repository;
pub mod yandex_synthesis_repository;

pub use blob_repository::{BlobRepository, S3BlobRepository};
pub use google_long_audio_repository::GoogleLongAudioRepository;
pub use staging_repository::{GcsStagingRepository, StagingObject, StagingRepository};
pub use synthesis_repository::SynthesisRepository;
pub use yandex_synthesis_repository::YandexSynthesisRepository;

/// First `max` bytes of `text`, cut back to a char boundary, for log lines
pub(crate) fn preview(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
