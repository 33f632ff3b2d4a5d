//! services/api/src/adapters/search_llm.rs
//!
//! This module contains the adapter for the Perplexity search LLM.
//! It implements the `RecommendationProvider` port from the `core` crate.

use async_trait::async_trait;
use menu_finder_core::ports::{PortError, PortResult, RecommendationProvider};
use serde::Serialize;
use tracing::debug;

const TOP_P: f32 = 0.9;

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RecommendationProvider` against an
/// OpenAI-compatible chat-completions endpoint (Perplexity by default).
#[derive(Clone)]
pub struct PerplexitySearchAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl PerplexitySearchAdapter {
    /// Creates a new `PerplexitySearchAdapter`.
    pub fn new(
        client: reqwest::Client,
        endpoint: String,
        api_key: String,
        model: String,
        max_tokens: u32,
        temperature: f32,
    ) -> Self {
        Self {
            client,
            endpoint,
            api_key,
            model,
            max_tokens,
            temperature,
        }
    }
}

//=========================================================================================
// `RecommendationProvider` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecommendationProvider for PerplexitySearchAdapter {
    /// Posts the prompt as a single user message and returns the raw reply body.
    async fn search(&self, prompt: &str) -> PortResult<String> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            top_p: TOP_P,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, "Calling search provider");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| PortError::Provider(format!("Failed to call search API: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PortError::Provider(format!(
                "Search API returned {}: {}",
                status, body
            )));
        }

        response
            .text()
            .await
            .map_err(|e| PortError::Provider(format!("Failed to read search API reply: {}", e)))
    }
}
