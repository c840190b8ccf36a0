use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, types::ObjectCannedAcl, Client as S3Client};
use std::sync::Arc;

/// Durable storage for finished story audio
#[async_trait]
pub trait BlobRepository: Send + Sync {
    /// Store `audio` under `key` and return its public URL
    async fn upload(&self, key: &str, audio: Vec<u8>, content_type: &str) -> Result<String, String>;
}

/// S3-compatible object storage with public-read objects
pub struct S3BlobRepository {
    s3_client: Arc<S3Client>,
    bucket: String,
    public_base_url: String,
}

impl S3BlobRepository {
    pub fn new(s3_client: Arc<S3Client>, bucket: String, public_base_url: String) -> Self {
        Self {
            s3_client,
            bucket,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

#[async_trait]
impl BlobRepository for S3BlobRepository {
    async fn upload(&self, key: &str, audio: Vec<u8>, content_type: &str) -> Result<String, String> {
        let size = audio.len();
        let start_time = std::time::Instant::now();

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(audio))
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    bucket = %self.bucket,
                    key,
                    size,
                    "S3 put_object failed"
                );
                format!("S3 upload error: {}", e)
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key,
            size,
            latency_ms = start_time.elapsed().as_millis(),
            "Audio uploaded"
        );

        Ok(self.public_url(key))
    }
}
