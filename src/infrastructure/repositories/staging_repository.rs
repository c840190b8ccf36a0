use crate::infrastructure::google::AccessTokenProvider;
use async_trait::async_trait;
use std::sync::Arc;

/// Temporary storage a long-running synthesis job writes its output into
#[async_trait]
pub trait StagingRepository: Send + Sync {
    /// Location the provider should write `name` to, e.g. `gs://bucket/name`
    fn output_uri(&self, name: &str) -> String;

    async fn download(&self, name: &str) -> Result<Vec<u8>, String>;

    async fn delete(&self, name: &str) -> Result<(), String>;
}

/// Google Cloud Storage bucket accessed through the JSON API
pub struct GcsStagingRepository {
    http: reqwest::Client,
    tokens: Arc<dyn AccessTokenProvider>,
    base_url: String,
    bucket: String,
    /// Billed project for requester-pays buckets
    user_project: String,
}

impl GcsStagingRepository {
    pub fn new(
        http: reqwest::Client,
        tokens: Arc<dyn AccessTokenProvider>,
        base_url: String,
        bucket: String,
        user_project: String,
    ) -> Self {
        Self {
            http,
            tokens,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            user_project,
        }
    }

    fn object_url(&self, name: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.base_url,
            urlencoding::encode(&self.bucket),
            urlencoding::encode(name)
        )
    }
}

#[async_trait]
impl StagingRepository for GcsStagingRepository {
    fn output_uri(&self, name: &str) -> String {
        format!("gs://{}/{}", self.bucket, name)
    }

    async fn download(&self, name: &str) -> Result<Vec<u8>, String> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .get(self.object_url(name))
            .query(&[("alt", "media"), ("userProject", self.user_project.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("GCS download request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("GCS download of {} returned {}: {}", name, status, body));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read GCS object body: {}", e))?;

        tracing::debug!(object = name, size = bytes.len(), "Staged audio downloaded");
        Ok(bytes.to_vec())
    }

    async fn delete(&self, name: &str) -> Result<(), String> {
        let token = self.tokens.access_token().await?;

        let response = self
            .http
            .delete(self.object_url(name))
            .query(&[("userProject", self.user_project.as_str())])
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| format!("GCS delete request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("GCS delete of {} returned {}", name, status));
        }

        Ok(())
    }
}

/// A staged object that must not outlive the synthesis call that created it.
///
/// Call [`StagingObject::release`] once the object has been read. If the guard is
/// dropped while still armed (early error, cancelled request) it schedules the
/// delete on the current Tokio runtime instead.
pub struct StagingObject {
    staging: Arc<dyn StagingRepository>,
    name: String,
    armed: bool,
}

impl StagingObject {
    pub fn new(staging: Arc<dyn StagingRepository>, name: String) -> Self {
        Self {
            staging,
            name,
            armed: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn output_uri(&self) -> String {
        self.staging.output_uri(&self.name)
    }

    pub async fn download(&self) -> Result<Vec<u8>, String> {
        self.staging.download(&self.name).await
    }

    /// Delete the object now. Failures are logged, never returned.
    pub async fn release(mut self) {
        self.armed = false;
        delete_logged(self.staging.as_ref(), &self.name).await;
    }
}

impl Drop for StagingObject {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let staging = self.staging.clone();
        let name = std::mem::take(&mut self.name);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    delete_logged(staging.as_ref(), &name).await;
                });
            }
            Err(_) => {
                tracing::warn!(
                    staging_object = %name,
                    "No runtime available to delete staging object, it will be left behind"
                );
            }
        }
    }
}

async fn delete_logged(staging: &dyn StagingRepository, name: &str) {
    match staging.delete(name).await {
        Ok(()) => tracing::debug!(staging_object = name, "Staging object deleted"),
        Err(e) => tracing::warn!(
            staging_object = name,
            error = %e,
            "Failed to delete staging object"
        ),
    }
}
