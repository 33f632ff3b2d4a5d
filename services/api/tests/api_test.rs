use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use api_lib::config::Config;
use api_lib::web::{create_router, AppState};
use menu_finder_core::ports::{
    PortError, PortResult, RecommendationProvider, SpeechToTextService,
};
use menu_finder_core::recommendation::fallback_recommendations;
use menu_finder_core::RecommendationResponse;

const BOUNDARY: &str = "menu-finder-test-boundary";
const WEBM_HEADER: [u8; 16] = [
    0x1A, 0x45, 0xDF, 0xA3, 0x9F, 0x42, 0x86, 0x81, 0x01, 0x42, 0xF7, 0x81, 0x01, 0x42, 0xF2, 0x81,
];

//=========================================================================================
// Test Doubles
//=========================================================================================

struct FakeSst {
    reply: Result<String, String>,
    calls: Mutex<Vec<(usize, Option<String>)>>,
}

impl FakeSst {
    fn transcribing(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl SpeechToTextService for FakeSst {
    async fn transcribe_audio(
        &self,
        audio_data: &[u8],
        content_type: Option<&str>,
    ) -> PortResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((audio_data.len(), content_type.map(str::to_string)));
        self.reply.clone().map_err(PortError::Provider)
    }
}

struct FakeSearch {
    reply: Result<String, String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeSearch {
    fn replying(body: String) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(body),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl RecommendationProvider for FakeSearch {
    async fn search(&self, prompt: &str) -> PortResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(PortError::Provider)
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

fn app(
    sst: Arc<dyn SpeechToTextService>,
    search: Option<Arc<dyn RecommendationProvider>>,
) -> Router {
    let config = Config::from_lookup(|_| None).unwrap();
    create_router(Arc::new(AppState {
        config: Arc::new(config),
        sst_adapter: sst,
        search_adapter: search,
    }))
}

fn envelope(content: &str) -> String {
    serde_json::json!({ "choices": [ { "message": { "role": "assistant", "content": content } } ] })
        .to_string()
}

enum Part<'a> {
    File(&'a str, &'a [u8]),
    Text(&'a str, &'a str),
}

fn multipart_request(uri: &str, parts: &[Part]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File(content_type, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"craving\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn form_request(form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/menu/text-to-menu-recommendations")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_text(response: axum::response::Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

async fn body_json(response: axum::response::Response) -> RecommendationResponse {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

//=========================================================================================
// Liveness
//=========================================================================================

#[tokio::test]
async fn given_running_service_when_calling_hello_then_returns_liveness_text() {
    let response = app(FakeSst::transcribing("unused"), None)
        .oneshot(
            Request::builder()
                .uri("/api/menu/hello")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "Hello from Menu Recommendation Service!"
    );
}

//=========================================================================================
// Text Queries
//=========================================================================================

#[tokio::test]
async fn given_mock_mode_when_text_query_then_returns_fixed_fallback_set() {
    let response = app(FakeSst::transcribing("unused"), None)
        .oneshot(form_request("query=spicy+noodles"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.query, "spicy noodles");
    assert_eq!(body.recommendations.len(), 5);
    assert_eq!(body.total_found, 5);
    assert_eq!(body.recommendations, fallback_recommendations());
    assert_eq!(body.search_location.as_deref(), Some("San Francisco, CA"));
}

#[tokio::test]
async fn given_provider_reply_when_text_query_then_returns_parsed_recommendations() {
    let search = FakeSearch::replying(envelope(
        r#"Here you go: [{"name":"A","description":"d","menuLink":"l","imageUrl":"i","cuisine":"c"}] enjoy!"#,
    ));

    let response = app(FakeSst::transcribing("unused"), Some(search.clone()))
        .oneshot(form_request("query=spicy+noodles&location=Tokyo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.recommendations.len(), 1);
    assert_eq!(body.recommendations[0].name, "A");
    assert_eq!(body.total_found, 1);
    assert_eq!(body.search_location.as_deref(), Some("Tokyo"));

    let prompts = search.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("\"spicy noodles\""));
    assert!(prompts[0].contains("Tokyo"));
}

#[tokio::test]
async fn given_provider_failure_when_text_query_then_still_ok_with_fallback_set() {
    let search = FakeSearch::failing("401 Unauthorized");

    let response = app(FakeSst::transcribing("unused"), Some(search))
        .oneshot(form_request("query=dumplings"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await.recommendations,
        fallback_recommendations()
    );
}

#[tokio::test]
async fn given_unparseable_reply_when_text_query_then_still_ok_with_fallback_set() {
    let search = FakeSearch::replying(envelope("I have no idea, sorry."));

    let response = app(FakeSst::transcribing("unused"), Some(search))
        .oneshot(form_request("query=dumplings"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await.recommendations,
        fallback_recommendations()
    );
}

#[tokio::test]
async fn given_query_in_url_when_text_query_then_returns_recommendations() {
    let response = app(FakeSst::transcribing("unused"), None)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/menu/text-to-menu-recommendations?query=pho&location=Hanoi")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.query, "pho");
    assert_eq!(body.search_location.as_deref(), Some("Hanoi"));
}

#[tokio::test]
async fn given_missing_query_when_text_query_then_bad_request() {
    let response = app(FakeSst::transcribing("unused"), None)
        .oneshot(form_request("location=Tokyo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

//=========================================================================================
// Speech To Text
//=========================================================================================

#[tokio::test]
async fn given_audio_when_speech_to_text_then_confirms_and_forwards_content_type() {
    let sst = FakeSst::transcribing("I want ramen");

    let response = app(sst.clone(), None)
        .oneshot(multipart_request(
            "/api/menu/speech-to-text",
            &[Part::File("audio/webm", &WEBM_HEADER)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_text(response).await,
        "Speech processed successfully for menu search"
    );
    let calls = sst.calls.lock().unwrap();
    assert_eq!(
        calls.as_slice(),
        [(WEBM_HEADER.len(), Some("audio/webm".to_string()))]
    );
}

#[tokio::test]
async fn given_empty_file_when_speech_to_text_then_bad_request_without_transcribing() {
    let sst = FakeSst::transcribing("unused");

    let response = app(sst.clone(), None)
        .oneshot(multipart_request(
            "/api/menu/speech-to-text",
            &[Part::File("audio/wav", &[])],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "File is empty");
    assert!(sst.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn given_no_file_part_when_speech_to_text_then_bad_request() {
    let response = app(FakeSst::transcribing("unused"), None)
        .oneshot(multipart_request(
            "/api/menu/speech-to-text",
            &[Part::Text("location", "Tokyo")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("must include a file"));
}

#[tokio::test]
async fn given_transcription_failure_when_speech_to_text_then_bad_request_with_error_text() {
    let response = app(FakeSst::failing("invalid credentials"), None)
        .oneshot(multipart_request(
            "/api/menu/speech-to-text",
            &[Part::File("audio/webm", &WEBM_HEADER)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let text = body_text(response).await;
    assert!(text.starts_with("Failed to process speech file:"));
    assert!(text.contains("invalid credentials"));
}

//=========================================================================================
// Speech To Menu Recommendations
//=========================================================================================

#[tokio::test]
async fn given_audio_and_location_when_speech_to_menu_then_transcript_becomes_the_query() {
    let search = FakeSearch::replying(envelope(
        r#"[{"name":"Tonkotsu Ramen","description":"rich","menuLink":"l","imageUrl":"i","cuisine":"Japanese"}]"#,
    ));

    let response = app(FakeSst::transcribing("I want ramen"), Some(search.clone()))
        .oneshot(multipart_request(
            "/api/menu/speech-to-menu-recommendations",
            &[
                Part::File("audio/webm", &WEBM_HEADER),
                Part::Text("location", "Tokyo"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.query, "I want ramen");
    assert_eq!(body.search_location.as_deref(), Some("Tokyo"));
    assert_eq!(body.recommendations[0].cuisine, "Japanese");
    assert!(search.prompts.lock().unwrap()[0].contains("\"I want ramen\""));
}

#[tokio::test]
async fn given_audio_without_location_when_speech_to_menu_then_uses_default_location() {
    let response = app(FakeSst::transcribing("something warm"), None)
        .oneshot(multipart_request(
            "/api/menu/speech-to-menu-recommendations",
            &[Part::File("audio/ogg", &WEBM_HEADER)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.search_location.as_deref(), Some("San Francisco, CA"));
    assert_eq!(body.recommendations, fallback_recommendations());
}

#[tokio::test]
async fn given_empty_file_when_speech_to_menu_then_bad_request_with_empty_body() {
    let response = app(FakeSst::transcribing("unused"), None)
        .oneshot(multipart_request(
            "/api/menu/speech-to-menu-recommendations",
            &[Part::File("audio/webm", &[]), Part::Text("location", "Tokyo")],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn given_transcription_failure_when_speech_to_menu_then_bad_request_without_searching() {
    let search = FakeSearch::replying(envelope("[]"));

    let response = app(FakeSst::failing("deadline exceeded"), Some(search.clone()))
        .oneshot(multipart_request(
            "/api/menu/speech-to-menu-recommendations",
            &[Part::File("audio/webm", &WEBM_HEADER)],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_bytes(response).await.is_empty());
    assert!(search.prompts.lock().unwrap().is_empty());
}
