pub mod audio_format;
pub mod domain;
pub mod ports;
pub mod recommendation;

pub use audio_format::detect_encoding;
pub use domain::{AudioEncoding, AudioFormat, MenuRecommendation, RecommendationResponse};
pub use ports::{PortError, PortResult, RecommendationProvider, SpeechToTextService};
pub use recommendation::{
    build_prompt, fallback_recommendations, parse_recommendations, recommend, FallbackReason,
    RecommendationOutcome,
};
