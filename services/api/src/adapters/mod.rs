pub mod google_auth;
pub mod search_llm;
pub mod sst;

pub use google_auth::{AccessTokenSource, ServiceAccountTokenSource};
pub use search_llm::PerplexitySearchAdapter;
pub use sst::GoogleSstAdapter;
