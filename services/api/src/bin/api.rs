//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{GoogleSstAdapter, PerplexitySearchAdapter, ServiceAccountTokenSource},
    config::{mask_api_key, Config},
    error::ApiError,
    web::{create_router, rest::ApiDoc, AppState},
};
use menu_finder_core::ports::RecommendationProvider;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Build the Outbound HTTP Client ---
    // A single attempt per upstream call, bounded by the configured timeout.
    let http_client = reqwest::Client::builder()
        .timeout(config.upstream_timeout)
        .build()?;

    // --- 3. Initialize Service Adapters ---
    if config.google_credentials_json.is_some() {
        info!("Using Google credentials from environment variable GOOGLE_CREDENTIALS_JSON");
    } else {
        info!(
            "Using Google credentials from file: {}",
            config.google_credentials_path.display()
        );
    }
    let token_source = Arc::new(ServiceAccountTokenSource::new(
        http_client.clone(),
        config.google_credentials_json.clone(),
        config.google_credentials_path.clone(),
    ));
    let sst_adapter = Arc::new(GoogleSstAdapter::new(
        http_client.clone(),
        &config.speech_api_url,
        config.speech_language_code.clone(),
        token_source,
    ));

    let search_adapter: Option<Arc<dyn RecommendationProvider>> =
        match config.valid_perplexity_api_key() {
            Some(api_key) => {
                info!(
                    api_url = %config.perplexity_api_url,
                    api_key = %mask_api_key(api_key),
                    "Perplexity API key configured successfully"
                );
                let adapter: Arc<dyn RecommendationProvider> =
                    Arc::new(PerplexitySearchAdapter::new(
                        http_client.clone(),
                        config.perplexity_api_url.clone(),
                        api_key.to_string(),
                        config.perplexity_model.clone(),
                        config.perplexity_max_tokens,
                        config.perplexity_temperature,
                    ));
                Some(adapter)
            }
            None => {
                warn!(
                    "Perplexity API key is not configured. Set PERPLEXITY_API_KEY \
                     (https://www.perplexity.ai/settings/api); serving mock recommendations until then."
                );
                None
            }
        };

    // --- 4. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        sst_adapter,
        search_adapter,
    });

    // --- 5. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = create_router(app_state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
