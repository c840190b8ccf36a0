use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
// Refresh a little before Google expires the token (tokens live one hour)
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(50 * 60);

/// Source of OAuth2 bearer tokens for Google APIs
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String, String>;
}

/// Fields of a service-account key file this client needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchanges a signed service-account assertion for an access token and caches it
pub struct ServiceAccountTokenProvider {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    http: reqwest::Client,
    cache: Cache<&'static str, String>,
}

impl ServiceAccountTokenProvider {
    pub fn from_json(credentials_json: &str, http: reqwest::Client) -> Result<Self, String> {
        let key: ServiceAccountKey = serde_json::from_str(credentials_json)
            .map_err(|e| format!("Invalid service account JSON: {}", e))?;
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| format!("Invalid service account private key: {}", e))?;

        Ok(Self {
            key,
            encoding_key,
            http,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(TOKEN_CACHE_TTL)
                .build(),
        })
    }

    fn signed_assertion(&self) -> Result<String, String> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| format!("Failed to sign service account assertion: {}", e))
    }

    async fn fetch_token(&self) -> Result<String, String> {
        let assertion = self.signed_assertion()?;

        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| format!("Token request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                client_email = %self.key.client_email,
                "Google token exchange rejected"
            );
            return Err(format!("Token endpoint returned {}: {}", status, body));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Malformed token response: {}", e))?;

        tracing::debug!(client_email = %self.key.client_email, "Google access token refreshed");
        Ok(token.access_token)
    }
}

#[async_trait]
impl AccessTokenProvider for ServiceAccountTokenProvider {
    async fn access_token(&self) -> Result<String, String> {
        self.cache
            .try_get_with(CLOUD_PLATFORM_SCOPE, self.fetch_token())
            .await
            .map_err(|e| e.to_string())
    }
}

/// Fixed token, for emulators and tests
pub struct StaticTokenProvider(pub String);

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String, String> {
        Ok(self.0.clone())
    }
}
