use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use story_audio_backend::controllers::audio::AudioController;
use story_audio_backend::domain::audio::{
    AudioBackend, Mp3ConcatAssembler, StoryAudioService, WavAssembler,
};
use story_audio_backend::infrastructure::config::{GoogleLongAudioConfig, YandexConfig};
use story_audio_backend::infrastructure::google::StaticTokenProvider;
use story_audio_backend::infrastructure::http::build_router;
use story_audio_backend::infrastructure::repositories::{
    BlobRepository, GcsStagingRepository, GoogleLongAudioRepository, YandexSynthesisRepository,
};
use test_context::AsyncTestContext;
use tokio::net::TcpListener;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};


use api_client::TestClient;

pub const TEST_TOKEN: &str = "test-access-token";
pub const TEST_PROJECT: &str = "test-project";
pub const STAGING_BUCKET: &str = "staging-bucket";
pub const PUBLIC_BASE_URL: &str = "https://cdn.test";

/// Matches any staged object in the test bucket
pub const STAGED_OBJECT_PATH: &str =
    r"^/storage/v1/b/staging-bucket/o/temp_audio_\d{8}_\d{6}_[0-9a-f]{8}\.wav$";

pub fn yandex_config(server: &MockServer) -> YandexConfig {
    let mut config = YandexConfig::new("test-api-key".to_string(), "test-folder".to_string());
    config.base_url = server.uri();
    config
}

pub fn google_config(server: &MockServer, job_timeout: Duration) -> GoogleLongAudioConfig {
    let mut config = GoogleLongAudioConfig::new(
        "{}".to_string(),
        TEST_PROJECT.to_string(),
        STAGING_BUCKET.to_string(),
    );
    config.tts_base_url = server.uri();
    config.storage_base_url = server.uri();
    config.poll_interval = Duration::from_millis(10);
    config.job_timeout = job_timeout;
    config
}

pub fn google_repository(server: &MockServer, job_timeout: Duration) -> GoogleLongAudioRepository {
    let http = reqwest::Client::new();
    let tokens = Arc::new(StaticTokenProvider(TEST_TOKEN.to_string()));
    let staging = Arc::new(GcsStagingRepository::new(
        http.clone(),
        tokens.clone(),
        server.uri(),
        STAGING_BUCKET.to_string(),
        TEST_PROJECT.to_string(),
    ));
    GoogleLongAudioRepository::new(http, tokens, staging, google_config(server, job_timeout))
}

/// Long audio job that is still running on submit and done on the first poll
pub async fn mount_google_job(server: &MockServer, audio: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/v1/projects/{}/locations/global:synthesizeLongAudio",
            TEST_PROJECT
        )))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op-1", "done": false})),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/operations/op-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op-1", "done": true})),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio))
        .mount(server)
        .await;

    Mock::given(method("DELETE"))
        .and(path_regex(STAGED_OBJECT_PATH))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

pub async fn mount_yandex_audio(server: &MockServer, audio: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path("/speech/v1/tts:synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(audio))
        .mount(server)
        .await;
}

/// Requests with the given method that reached the mock server so far
pub async fn count_requests(server: &MockServer, http_method: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == http_method)
        .count()
}

/// Decoded value of `name` in an `application/x-www-form-urlencoded` body
pub fn form_field(body: &[u8], name: &str) -> Option<String> {
    String::from_utf8_lossy(body).split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key != name {
            return None;
        }
        urlencoding::decode(&value.replace('+', " "))
            .ok()
            .map(|value| value.into_owned())
    })
}

#[derive(Debug, Clone)]
pub struct Upload {
    pub key: String,
    pub audio: Vec<u8>,
    pub content_type: String,
}

/// Blob store that keeps uploads in memory
#[derive(Default)]
pub struct RecordingBlobRepository {
    uploads: Mutex<Vec<Upload>>,
}

impl RecordingBlobRepository {
    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().clone()
    }
}

#[async_trait]
impl BlobRepository for RecordingBlobRepository {
    async fn upload(&self, key: &str, audio: Vec<u8>, content_type: &str) -> Result<String, String> {
        self.uploads.lock().push(Upload {
            key: key.to_string(),
            audio,
            content_type: content_type.to_string(),
        });
        Ok(format!("{}/{}", PUBLIC_BASE_URL, key))
    }
}

/// The full router served on a random port, with both providers pointed at mocks
pub struct TestContext {
    pub client: TestClient,
    pub yandex: MockServer,
    pub google: MockServer,
    pub blob: Arc<RecordingBlobRepository>,
}

impl TestContext {
    pub async fn new() -> Result<Self> {
        let yandex = MockServer::start().await;
        let google = MockServer::start().await;
        let blob = Arc::new(RecordingBlobRepository::default());

        let audio_service = StoryAudioService::new(blob.clone())
            .with_backend(AudioBackend::new(
                Arc::new(YandexSynthesisRepository::new(
                    reqwest::Client::new(),
                    yandex_config(&yandex),
                )),
                Arc::new(Mp3ConcatAssembler),
            ))
            .with_backend(AudioBackend::new(
                Arc::new(google_repository(&google, Duration::from_secs(5))),
                Arc::new(WavAssembler),
            ));

        let app = build_router(Arc::new(AudioController::new(Arc::new(audio_service))));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Ok(Self {
            client: TestClient::new(&base_url),
            yandex,
            google,
            blob,
        })
    }
}

impl AsyncTestContext for TestContext {
    fn setup() -> impl std::future::Future<Output = Self> + Send {
        async {
            TestContext::new()
                .await
                .expect("Failed to create test context")
        }
    }

    fn teardown(self) -> impl std::future::Future<Output = ()> + Send {
        async {}
    }
}
