//! services/api/src/adapters/sst.rs
//!
//! This module contains the adapter for Google Cloud Speech-to-Text.
//! It implements the `SpeechToTextService` port from the `core` crate.

use crate::adapters::google_auth::AccessTokenSource;
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use menu_finder_core::{
    audio_format::detect_encoding,
    domain::AudioEncoding,
    ports::{PortError, PortResult, SpeechToTextService},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Returned when the provider recognised no speech at all.
pub const NO_SPEECH_DETECTED: &str = "No speech detected";

//=========================================================================================
// Provider Wire Types
//=========================================================================================

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: AudioEncoding,
    sample_rate_hertz: u32,
    language_code: &'a str,
}

#[derive(Serialize)]
struct RecognitionAudio {
    content: String,
}

// The provider omits empty lists entirely, hence the defaults.
#[derive(Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<RecognitionAlternative>,
}

#[derive(Deserialize)]
struct RecognitionAlternative {
    #[serde(default)]
    transcript: String,
}

impl RecognizeResponse {
    /// Concatenates the top alternative of each result, in provider order.
    fn into_transcript(self) -> String {
        if self.results.is_empty() {
            return NO_SPEECH_DETECTED.to_string();
        }
        self.results
            .into_iter()
            .enumerate()
            .filter_map(|(index, result)| {
                let top = result.alternatives.into_iter().next();
                if top.is_none() {
                    debug!(result_index = index, "Skipping recognition result without alternatives");
                }
                top
            })
            .map(|alternative| alternative.transcript)
            .collect()
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `SpeechToTextService` port using the Google
/// Cloud Speech `speech:recognize` REST endpoint.
#[derive(Clone)]
pub struct GoogleSstAdapter {
    client: reqwest::Client,
    endpoint: String,
    language_code: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl GoogleSstAdapter {
    /// Creates a new `GoogleSstAdapter` talking to `base_url`.
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        language_code: String,
        tokens: Arc<dyn AccessTokenSource>,
    ) -> Self {
        let endpoint = format!("{}/v1/speech:recognize", base_url.trim_end_matches('/'));
        Self {
            client,
            endpoint,
            language_code,
            tokens,
        }
    }
}

//=========================================================================================
// `SpeechToTextService` Trait Implementation
//=========================================================================================

#[async_trait]
impl SpeechToTextService for GoogleSstAdapter {
    /// Sends the whole upload in one request and returns the joined transcript.
    async fn transcribe_audio(
        &self,
        audio_data: &[u8],
        content_type: Option<&str>,
    ) -> PortResult<String> {
        let format = detect_encoding(audio_data, content_type);
        info!(
            content_type = ?content_type,
            encoding = %format.encoding,
            sample_rate_hz = format.sample_rate_hz,
            "Selected recognition encoding"
        );

        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: format.encoding,
                sample_rate_hertz: format.sample_rate_hz,
                language_code: &self.language_code,
            },
            audio: RecognitionAudio {
                content: general_purpose::STANDARD.encode(audio_data),
            },
        };

        let token = self.tokens.access_token().await?;

        debug!(endpoint = %self.endpoint, bytes = audio_data.len(), "Sending audio to speech provider");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| PortError::Provider(format!("Error recognizing speech: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(PortError::Provider(format!(
                "Error recognizing speech: status {}: {}",
                status, body
            )));
        }

        let recognized: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| PortError::Provider(format!("Malformed recognition response: {}", e)))?;

        let transcript = recognized.into_transcript();
        info!(chars = transcript.len(), "Speech transcription completed");
        Ok(transcript)
    }
}
