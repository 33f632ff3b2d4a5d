//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the menu REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::{FormRejection, QueryRejection},
        Form, Multipart, Query, State,
    },
    http::StatusCode,
    response::Json,
};
use bytes::Bytes;
use menu_finder_core::{
    domain::{MenuRecommendation, RecommendationResponse},
    ports::PortError,
    recommendation::recommend,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use utoipa::{OpenApi, ToSchema};

pub const HELLO_MESSAGE: &str = "Hello from Menu Recommendation Service!";
pub const SPEECH_PROCESSED_MESSAGE: &str = "Speech processed successfully for menu search";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        hello_handler,
        speech_to_text_handler,
        speech_to_menu_recommendations_handler,
        text_to_menu_recommendations_handler,
    ),
    components(
        schemas(MenuRecommendationBody, RecommendationResponseBody, TextQueryForm)
    ),
    tags(
        (name = "Menu Finder API", description = "Meal recommendations from a spoken or typed craving.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// One meal suggestion as sent to the caller.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MenuRecommendationBody {
    name: String,
    description: String,
    menu_link: String,
    image_url: String,
    cuisine: String,
}

impl From<MenuRecommendation> for MenuRecommendationBody {
    fn from(r: MenuRecommendation) -> Self {
        Self {
            name: r.name,
            description: r.description,
            menu_link: r.menu_link,
            image_url: r.image_url,
            cuisine: r.cuisine,
        }
    }
}

/// The response payload for both recommendation endpoints.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponseBody {
    query: String,
    recommendations: Vec<MenuRecommendationBody>,
    total_found: usize,
    search_location: Option<String>,
    timestamp: String,
}

impl From<RecommendationResponse> for RecommendationResponseBody {
    fn from(r: RecommendationResponse) -> Self {
        Self {
            query: r.query,
            recommendations: r.recommendations.into_iter().map(Into::into).collect(),
            total_found: r.total_found,
            search_location: r.search_location,
            timestamp: r.timestamp,
        }
    }
}

/// Form fields accepted by the text endpoint.
#[derive(Deserialize, ToSchema)]
pub struct TextQueryForm {
    query: String,
    location: Option<String>,
}

/// An audio upload pulled out of a multipart form.
struct AudioUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
    location: Option<String>,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Reads the `file` part (required, non-empty) and the optional `location` part.
async fn read_audio_upload(multipart: &mut Multipart) -> Result<AudioUpload, PortError> {
    let mut file = None;
    let mut location = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PortError::InvalidInput(format!("Failed to read multipart data: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    PortError::InvalidInput(format!("Failed to read file bytes: {}", e))
                })?;
                file = Some((file_name, content_type, data));
            }
            Some("location") => {
                let text = field.text().await.map_err(|e| {
                    PortError::InvalidInput(format!("Failed to read location: {}", e))
                })?;
                location = Some(text);
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) = file.ok_or_else(|| {
        PortError::InvalidInput("Multipart form must include a file".to_string())
    })?;

    info!(
        file_name = ?file_name,
        size = data.len(),
        content_type = ?content_type,
        "Received speech file"
    );

    if data.is_empty() {
        return Err(PortError::InvalidInput("File is empty".to_string()));
    }

    Ok(AudioUpload {
        file_name,
        content_type,
        data,
        location,
    })
}

/// Looks up recommendations and converts them into the response body.
async fn recommendations_for(
    app_state: &AppState,
    query: &str,
    location: &str,
) -> RecommendationResponseBody {
    let outcome = recommend(app_state.search_adapter.as_deref(), query, Some(location)).await;
    info!(
        count = outcome.recommendations().len(),
        fallback = outcome.is_fallback(),
        "Generated menu recommendations"
    );

    let body: RecommendationResponseBody = outcome.into_response(query, Some(location)).into();
    match serde_json::to_string(&body) {
        Ok(json) => debug!(%json, "Final menu recommendations sent to client"),
        Err(e) => error!("Error serializing menu recommendations to JSON: {}", e),
    }
    body
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Liveness check.
#[utoipa::path(
    get,
    path = "/api/menu/hello",
    responses(
        (status = 200, description = "Service is up", body = String, content_type = "text/plain")
    )
)]
pub async fn hello_handler() -> &'static str {
    HELLO_MESSAGE
}

/// Transcribe an uploaded recording and log the transcript.
///
/// Accepts a multipart/form-data request with a `file` part.
#[utoipa::path(
    post,
    path = "/api/menu/speech-to-text",
    request_body(content_type = "multipart/form-data", description = "The audio recording to transcribe."),
    responses(
        (status = 200, description = "Speech processed", body = String, content_type = "text/plain"),
        (status = 400, description = "Empty or missing file, or transcription failed", body = String, content_type = "text/plain")
    )
)]
pub async fn speech_to_text_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, (StatusCode, String)> {
    let mut multipart = multipart.map_err(|e| (StatusCode::BAD_REQUEST, e.body_text()))?;

    let upload = read_audio_upload(&mut multipart).await.map_err(|e| {
        warn!("Rejected speech upload: {}", e);
        let message = match e {
            PortError::InvalidInput(message) => message,
            other => other.to_string(),
        };
        (StatusCode::BAD_REQUEST, message)
    })?;

    let transcript = app_state
        .sst_adapter
        .transcribe_audio(&upload.data, upload.content_type.as_deref())
        .await
        .map_err(|e| {
            error!(file_name = ?upload.file_name, "Error processing speech file: {}", e);
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to process speech file: {}", e),
            )
        })?;

    info!(%transcript, "Transcribed speech for menu search");
    Ok(SPEECH_PROCESSED_MESSAGE.to_string())
}

/// Transcribe a recording, then search for meals matching it.
///
/// Accepts a multipart/form-data request with a `file` part and an optional `location` part.
#[utoipa::path(
    post,
    path = "/api/menu/speech-to-menu-recommendations",
    request_body(content_type = "multipart/form-data", description = "The audio recording and an optional `location` field."),
    responses(
        (status = 200, description = "Recommendations found", body = RecommendationResponseBody),
        (status = 400, description = "Empty or missing file, or transcription failed")
    )
)]
pub async fn speech_to_menu_recommendations_handler(
    State(app_state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RecommendationResponseBody>, StatusCode> {
    let mut multipart = multipart.map_err(|_| StatusCode::BAD_REQUEST)?;

    let upload = read_audio_upload(&mut multipart).await.map_err(|e| {
        warn!("Rejected speech upload: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let transcript = app_state
        .sst_adapter
        .transcribe_audio(&upload.data, upload.content_type.as_deref())
        .await
        .map_err(|e| {
            error!("Error processing speech to menu recommendations: {}", e);
            StatusCode::BAD_REQUEST
        })?;
    info!(%transcript, "Transcribed speech for menu search");

    let location = app_state.location_or_default(upload.location);
    let body = recommendations_for(&app_state, &transcript, &location).await;
    Ok(Json(body))
}

/// Search for meals matching a typed craving.
///
/// Fields may be sent as an urlencoded form body or in the query string.
#[utoipa::path(
    post,
    path = "/api/menu/text-to-menu-recommendations",
    request_body(content = TextQueryForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Recommendations found", body = RecommendationResponseBody),
        (status = 400, description = "Missing `query` field")
    )
)]
pub async fn text_to_menu_recommendations_handler(
    State(app_state): State<Arc<AppState>>,
    query_string: Result<Query<TextQueryForm>, QueryRejection>,
    form: Result<Form<TextQueryForm>, FormRejection>,
) -> Result<Json<RecommendationResponseBody>, StatusCode> {
    let TextQueryForm { query, location } = match (form, query_string) {
        (Ok(Form(fields)), _) => fields,
        (Err(_), Ok(Query(fields))) => fields,
        (Err(rejection), Err(_)) => {
            warn!("Rejected text query: {}", rejection.body_text());
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    info!(%query, "Received text query for menu recommendations");

    let location = app_state.location_or_default(location);
    let body = recommendations_for(&app_state, &query, &location).await;
    Ok(Json(body))
}
