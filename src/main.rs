use anyhow::Context;
use aws_sdk_s3::config::{Credentials, Region};
use std::sync::Arc;
use story_audio_backend::controllers::audio::AudioController;
use story_audio_backend::domain::audio::{
    AudioBackend, Mp3ConcatAssembler, StoryAudioService, WavAssembler,
};
use story_audio_backend::infrastructure::config::{Config, LogFormat};
use story_audio_backend::infrastructure::google::ServiceAccountTokenProvider;
use story_audio_backend::infrastructure::http::start_http_server;
use story_audio_backend::infrastructure::repositories::{
    GcsStagingRepository, GoogleLongAudioRepository, S3BlobRepository, YandexSynthesisRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Story Audio Backend on {}:{}",
        config.host,
        config.port
    );

    if config.is_development() {
        tracing::debug!(
            yandex_configured = config.yandex.is_some(),
            google_configured = config.google.is_some(),
            "Running in development mode"
        );
    }

    // Object storage for finished stories (S3-compatible)
    let blob = &config.blob_store;
    tracing::info!(
        endpoint = %blob.endpoint,
        region = %blob.region,
        bucket = %blob.bucket,
        "Initializing S3 client"
    );

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(blob.region.clone()))
        .endpoint_url(&blob.endpoint)
        .credentials_provider(Credentials::new(
            &blob.access_key,
            &blob.secret_key,
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();
    let s3_client = Arc::new(aws_sdk_s3::Client::from_conf(s3_config));
    tracing::info!("S3 client initialized successfully");

    let http = reqwest::Client::builder()
        .user_agent(concat!("story-audio-backend/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories
    tracing::info!("Instantiating repositories...");
    let blob_repo = Arc::new(S3BlobRepository::new(
        s3_client,
        blob.bucket.clone(),
        blob.public_base_url.clone(),
    ));

    // 2. Instantiate services, one backend per configured provider
    tracing::info!("Instantiating services...");
    let mut audio_service = StoryAudioService::new(blob_repo);

    if let Some(yandex) = config.yandex.clone() {
        let synthesizer = Arc::new(YandexSynthesisRepository::new(http.clone(), yandex));
        audio_service = audio_service
            .with_backend(AudioBackend::new(synthesizer, Arc::new(Mp3ConcatAssembler)));
    } else {
        tracing::warn!("YANDEX_API_KEY not set, Yandex SpeechKit disabled");
    }

    if let Some(google) = config.google.clone() {
        let tokens = Arc::new(
            ServiceAccountTokenProvider::from_json(&google.credentials_json, http.clone())
                .map_err(anyhow::Error::msg)
                .context("Invalid GOOGLE_CLOUD_CREDENTIALS")?,
        );
        let staging = Arc::new(GcsStagingRepository::new(
            http.clone(),
            tokens.clone(),
            google.storage_base_url.clone(),
            google.staging_bucket.clone(),
            google.project_id.clone(),
        ));
        let synthesizer = Arc::new(GoogleLongAudioRepository::new(
            http.clone(),
            tokens,
            staging,
            google,
        ));
        audio_service =
            audio_service.with_backend(AudioBackend::new(synthesizer, Arc::new(WavAssembler)));
    } else {
        tracing::warn!("GOOGLE_CLOUD_CREDENTIALS not set, Google long audio disabled");
    }

    // 3. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let audio_controller = Arc::new(AudioController::new(Arc::new(audio_service)));

    // Start HTTP server with all routes
    start_http_server(Arc::new(config), audio_controller)
        .await
        .map_err(|e| anyhow::anyhow!("HTTP server failed: {}", e))?;

    Ok(())
}

fn init_logging(config: &Config) {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "story_audio_backend=debug,tower_http=debug".into())
    };

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter())
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
