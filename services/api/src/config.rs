//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. The resulting `Config` is immutable and
//! handed to every component that needs it.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Placeholder shipped in sample configuration files; never a real key.
const PLACEHOLDER_API_KEY: &str = "YOUR_PERPLEXITY_API_KEY_HERE";
const MIN_API_KEY_LEN: usize = 10;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub google_credentials_json: Option<String>,
    pub google_credentials_path: PathBuf,
    pub speech_api_url: String,
    pub speech_language_code: String,
    pub perplexity_api_key: Option<String>,
    pub perplexity_api_url: String,
    pub perplexity_model: String,
    pub perplexity_max_tokens: u32,
    pub perplexity_temperature: f32,
    pub default_location: String,
    pub upstream_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server Settings ---
        let bind_address = parse_var("BIND_ADDRESS", &var_or("BIND_ADDRESS", "0.0.0.0:8080"))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Speech Provider Settings ---
        let google_credentials_json = lookup("GOOGLE_CREDENTIALS_JSON");
        let google_credentials_path = PathBuf::from(var_or(
            "GOOGLE_APPLICATION_CREDENTIALS",
            "./credentials/google-credentials.json",
        ));
        let speech_api_url = var_or("SPEECH_API_URL", "https://speech.googleapis.com");
        let speech_language_code = var_or("SPEECH_LANGUAGE_CODE", "en-US");

        // --- Search Provider Settings (the API key is optional: mock mode) ---
        let perplexity_api_key = lookup("PERPLEXITY_API_KEY");
        let perplexity_api_url = var_or(
            "PERPLEXITY_API_URL",
            "https://api.perplexity.ai/chat/completions",
        );
        let perplexity_model = var_or("PERPLEXITY_MODEL", "llama-3.1-sonar-small-128k-online");
        let perplexity_max_tokens =
            parse_var("PERPLEXITY_MAX_TOKENS", &var_or("PERPLEXITY_MAX_TOKENS", "2000"))?;
        let perplexity_temperature =
            parse_var("PERPLEXITY_TEMPERATURE", &var_or("PERPLEXITY_TEMPERATURE", "0.2"))?;

        // --- Request Handling ---
        let default_location = var_or("DEFAULT_LOCATION", "San Francisco, CA");
        let upstream_timeout = Duration::from_secs(parse_var(
            "UPSTREAM_TIMEOUT_SECS",
            &var_or("UPSTREAM_TIMEOUT_SECS", "30"),
        )?);
        let max_upload_bytes =
            parse_var("MAX_UPLOAD_BYTES", &var_or("MAX_UPLOAD_BYTES", "10485760"))?;

        Ok(Self {
            bind_address,
            log_level,
            google_credentials_json,
            google_credentials_path,
            speech_api_url,
            speech_language_code,
            perplexity_api_key,
            perplexity_api_url,
            perplexity_model,
            perplexity_max_tokens,
            perplexity_temperature,
            default_location,
            upstream_timeout,
            max_upload_bytes,
        })
    }

    /// Returns the search provider key only if it looks usable.
    /// `None` switches the service into mock mode.
    ///
    /// Surrounding whitespace is trimmed before the placeholder and length checks,
    /// and the trimmed key is what gets sent upstream.
    pub fn valid_perplexity_api_key(&self) -> Option<&str> {
        self.perplexity_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| {
                !key.is_empty() && *key != PLACEHOLDER_API_KEY && key.len() > MIN_API_KEY_LEN
            })
    }
}

/// Shortens a secret for logging, e.g. `pplx...9f2c`.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 8 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}
