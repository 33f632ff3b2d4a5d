//! crates/menu_finder_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the core
//! independent of the concrete speech and search providers.

use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// The caller sent something unusable (empty or missing upload).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// An upstream provider call could not be completed (network, auth, rejection).
    #[error("Provider error: {0}")]
    Provider(String),
    /// A provider reply could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait SpeechToTextService: Send + Sync {
    /// Transcribes a complete audio upload into text.
    ///
    /// `content_type` is the MIME type declared by the uploader, if any.
    async fn transcribe_audio(
        &self,
        audio_data: &[u8],
        content_type: Option<&str>,
    ) -> PortResult<String>;
}

#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Sends a prompt to the search provider and returns the raw reply body.
    async fn search(&self, prompt: &str) -> PortResult<String>;
}
