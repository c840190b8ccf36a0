use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
    pub log_format: LogFormat,
    // Providers are optional; a missing key disables the provider
    pub yandex: Option<YandexConfig>,
    pub google: Option<GoogleLongAudioConfig>,
    // Final audio storage
    pub blob_store: BlobStoreConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub struct YandexConfig {
    pub api_key: String,
    pub folder_id: String,
    pub base_url: String,
    pub lang: String,
    pub voice: String,
    pub emotion: String,
    pub speed: f32,
    pub sample_rate_hertz: u32,
}

impl YandexConfig {
    pub fn new(api_key: String, folder_id: String) -> Self {
        Self {
            api_key,
            folder_id,
            base_url: "https://tts.api.cloud.yandex.net".to_string(),
            lang: "ru-RU".to_string(),
            voice: "zahar".to_string(),
            emotion: "neutral".to_string(),
            speed: 1.0,
            sample_rate_hertz: 48000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoogleLongAudioConfig {
    /// Service-account key file contents (JSON)
    pub credentials_json: String,
    pub project_id: String,
    pub staging_bucket: String,
    pub tts_base_url: String,
    pub storage_base_url: String,
    pub voice_name: String,
    pub language_code: String,
    pub speaking_rate: f64,
    pub volume_gain_db: f64,
    pub job_timeout: Duration,
    pub poll_interval: Duration,
}

impl GoogleLongAudioConfig {
    pub fn new(credentials_json: String, project_id: String, staging_bucket: String) -> Self {
        Self {
            credentials_json,
            project_id,
            staging_bucket,
            tts_base_url: "https://texttospeech.googleapis.com".to_string(),
            storage_base_url: "https://storage.googleapis.com".to_string(),
            voice_name: "en-US-Studio-O".to_string(),
            language_code: "en-US".to_string(),
            speaking_rate: 0.9,
            volume_gain_db: -2.0,
            job_timeout: Duration::from_secs(1800),
            poll_interval: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlobStoreConfig {
    pub endpoint: String,
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Public domain the bucket is served from
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let config = Config {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT").as_deref() {
                Ok("production") => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
            yandex: Self::yandex_from_env()?,
            google: Self::google_from_env()?,
            blob_store: BlobStoreConfig {
                endpoint: env::var("SELECTEL_ENDPOINT")
                    .unwrap_or_else(|_| "https://s3.ru-1.storage.selcloud.ru".to_string()),
                region: env::var("SELECTEL_REGION").unwrap_or_else(|_| "ru-1".to_string()),
                access_key: env::var("SELECTEL_ACCESS_KEY")?,
                secret_key: env::var("SELECTEL_SECRET_KEY")?,
                bucket: env::var("SELECTEL_BUCKET_NAME")?,
                public_base_url: env::var("SELECTEL_DOMAIN")?,
            },
        };

        Ok(config)
    }

    fn yandex_from_env() -> Result<Option<YandexConfig>, Box<dyn std::error::Error>> {
        let Ok(api_key) = env::var("YANDEX_API_KEY") else {
            return Ok(None);
        };

        let mut yandex = YandexConfig::new(api_key, env::var("YANDEX_FOLDER_ID")?);
        if let Ok(url) = env::var("YANDEX_TTS_URL") {
            yandex.base_url = url;
        }
        if let Ok(lang) = env::var("YANDEX_LANG") {
            yandex.lang = lang;
        }
        if let Ok(voice) = env::var("YANDEX_VOICE") {
            yandex.voice = voice;
        }
        if let Ok(emotion) = env::var("YANDEX_EMOTION") {
            yandex.emotion = emotion;
        }
        if let Ok(speed) = env::var("YANDEX_SPEED") {
            yandex.speed = speed.parse()?;
        }
        if let Ok(rate) = env::var("YANDEX_SAMPLE_RATE") {
            yandex.sample_rate_hertz = rate.parse()?;
        }

        Ok(Some(yandex))
    }

    fn google_from_env() -> Result<Option<GoogleLongAudioConfig>, Box<dyn std::error::Error>> {
        let Ok(credentials_json) = env::var("GOOGLE_CLOUD_CREDENTIALS") else {
            return Ok(None);
        };

        let mut google = GoogleLongAudioConfig::new(
            credentials_json,
            env::var("GOOGLE_CLOUD_PROJECT_ID")?,
            env::var("TEMP_GCS_BUCKET_NAME")
                .map_err(|_| "TEMP_GCS_BUCKET_NAME environment variable not found")?,
        );
        if let Ok(url) = env::var("GOOGLE_TTS_URL") {
            google.tts_base_url = url;
        }
        if let Ok(url) = env::var("GOOGLE_STORAGE_URL") {
            google.storage_base_url = url;
        }
        if let Ok(voice) = env::var("GOOGLE_VOICE_NAME") {
            google.voice_name = voice;
        }
        if let Ok(language) = env::var("GOOGLE_LANGUAGE_CODE") {
            google.language_code = language;
        }
        if let Ok(secs) = env::var("GOOGLE_JOB_TIMEOUT_SECS") {
            google.job_timeout = Duration::from_secs(secs.parse()?);
        }
        if let Ok(secs) = env::var("GOOGLE_POLL_INTERVAL_SECS") {
            google.poll_interval = Duration::from_secs(secs.parse()?);
        }

        Ok(Some(google))
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
