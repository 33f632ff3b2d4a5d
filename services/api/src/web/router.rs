//! services/api/src/web/router.rs
//!
//! Builds the Axum router for the menu API.

use crate::web::{
    rest::{
        hello_handler, speech_to_menu_recommendations_handler, speech_to_text_handler,
        text_to_menu_recommendations_handler,
    },
    state::AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Creates the `/api/menu` routes with CORS, tracing and the upload size limit applied.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // Browser clients are served from anywhere.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    let menu_routes = Router::new()
        .route("/hello", get(hello_handler))
        .route("/speech-to-text", post(speech_to_text_handler))
        .route(
            "/speech-to-menu-recommendations",
            post(speech_to_menu_recommendations_handler),
        )
        .route(
            "/text-to-menu-recommendations",
            post(text_to_menu_recommendations_handler),
        );

    Router::new()
        .nest("/api/menu", menu_routes)
        .layer(DefaultBodyLimit::max(app_state.config.max_upload_bytes))
        .layer(trace_layer)
        .layer(cors)
        .with_state(app_state)
}
