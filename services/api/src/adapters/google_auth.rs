//! services/api/src/adapters/google_auth.rs
//!
//! Obtains OAuth2 access tokens for the Google Cloud Speech API from a
//! service-account key, using the JWT bearer grant.

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use menu_finder_core::ports::{PortError, PortResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

//=========================================================================================
// Token Source Port
//=========================================================================================

/// Anything able to hand out a bearer token for the speech API.
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> PortResult<String>;
}

//=========================================================================================
// Service-Account Key
//=========================================================================================

/// The subset of a service-account JSON key needed for the JWT grant.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> PortResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| PortError::Provider(format!("Invalid service-account credentials: {}", e)))
    }
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

//=========================================================================================
// The Main Token Source
//=========================================================================================

/// Resolves credentials on every call: the inline JSON blob wins, otherwise the key
/// file at `credentials_path` is read.
#[derive(Clone)]
pub struct ServiceAccountTokenSource {
    client: reqwest::Client,
    inline_json: Option<String>,
    credentials_path: PathBuf,
}

impl ServiceAccountTokenSource {
    pub fn new(
        client: reqwest::Client,
        inline_json: Option<String>,
        credentials_path: PathBuf,
    ) -> Self {
        Self {
            client,
            inline_json,
            credentials_path,
        }
    }

    /// Loads the service-account key, preferring the inline blob.
    pub async fn load_key(&self) -> PortResult<ServiceAccountKey> {
        if let Some(json) = self.inline_json.as_deref().filter(|j| !j.trim().is_empty()) {
            debug!("Using speech credentials from environment variable");
            return ServiceAccountKey::from_json(json);
        }

        debug!(path = %self.credentials_path.display(), "Using speech credentials from file");
        let json = tokio::fs::read_to_string(&self.credentials_path)
            .await
            .map_err(|e| {
                PortError::Provider(format!(
                    "No credentials in GOOGLE_CREDENTIALS_JSON and could not read {}: {}",
                    self.credentials_path.display(),
                    e
                ))
            })?;
        ServiceAccountKey::from_json(&json)
    }

    fn sign_assertion(key: &ServiceAccountKey) -> PortResult<String> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: CLOUD_PLATFORM_SCOPE,
            aud: &key.token_uri,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| PortError::Provider(format!("Invalid service-account private key: {}", e)))?;

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key)
            .map_err(|e| PortError::Provider(format!("Failed to sign token assertion: {}", e)))
    }
}

#[async_trait]
impl AccessTokenSource for ServiceAccountTokenSource {
    async fn access_token(&self) -> PortResult<String> {
        let key = self.load_key().await?;
        let assertion = Self::sign_assertion(&key)?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PortError::Provider(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Provider(format!(
                "Token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PortError::Provider(format!("Malformed token response: {}", e)))?;

        info!(client_email = %key.client_email, "Obtained speech API access token");
        Ok(token.access_token)
    }
}
