use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone)]
struct MockState {
    reply: (StatusCode, Value),
    seen: Arc<Mutex<Vec<(String, String, Value)>>>,
}

#[derive(Deserialize)]
struct KeyQuery {
    key: String,
}

async fn generate(
    State(state): State<MockState>,
    Path(call): Path<String>,
    Query(query): Query<KeyQuery>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.seen.lock().await.push((call, query.key, body));
    let (status, reply) = state.reply.clone();
    (status, Json(reply))
}

async fn spawn_mock(status: StatusCode, reply: Value) -> (String, MockState) {
    let state = MockState {
        reply: (status, reply),
        seen: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/v1beta/models/:call", post(generate))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });

    (format!("http://{addr}"), state)
}

fn service(base_url: String) -> HttpCaptionService {
    HttpCaptionService::new(CaptionConfig {
        base_url,
        model: "test-model".into(),
        api_key: "secret".into(),
    })
    .expect("service")
}

fn text_reply(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "parts": [{ "text": text }] }
        }]
    })
}

#[tokio::test]
async fn caption_posts_inline_image_and_hint() {
    let (base_url, state) =
        spawn_mock(StatusCode::OK, text_reply("  \"Golden hour vibes\"  ")).await;
    let service = service(base_url);

    let media = CaptionMedia::Inline {
        mime_type: "image/png".into(),
        bytes: vec![1, 2, 3],
    };
    let caption = service
        .caption(&media, Some("beach day"))
        .await
        .expect("caption");
    assert_eq!(caption, "Golden hour vibes");

    let seen = state.seen.lock().await;
    let (call, key, body) = &seen[0];
    assert_eq!(call, "test-model:generateContent");
    assert_eq!(key, "secret");

    let parts = &body["contents"][0]["parts"];
    assert!(parts[0]["text"]
        .as_str()
        .expect("prompt")
        .ends_with("Context: beach day"));
    assert_eq!(parts[1]["inline_data"]["mime_type"], "image/png");
    assert_eq!(parts[1]["inline_data"]["data"], STANDARD.encode([1u8, 2, 3]));
}

#[tokio::test]
async fn empty_candidates_are_an_error() {
    let (base_url, _) = spawn_mock(StatusCode::OK, json!({ "candidates": [] })).await;
    let err = service(base_url)
        .caption(&CaptionMedia::Url("https://cdn.example/a.jpg".into()), None)
        .await
        .expect_err("empty");
    assert!(matches!(err, CaptionError::EmptyResponse));
}

#[tokio::test]
async fn provider_errors_are_decoded() {
    let (base_url, _) = spawn_mock(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "code": 429, "message": "quota", "status": "RESOURCE_EXHAUSTED" } }),
    )
    .await;

    let err = service(base_url)
        .trending_topics(3)
        .await
        .expect_err("provider error");
    match err {
        CaptionError::Provider(api) => {
            assert_eq!(api.code, ErrorCode::RateLimited);
            assert_eq!(api.message, "RESOURCE_EXHAUSTED: quota");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn trending_topics_strip_list_markers() {
    let (base_url, _) = spawn_mock(
        StatusCode::OK,
        text_reply("1. #SolarEclipse\n- Street food week\n\n* Indie game jam\n4) Marathon"),
    )
    .await;

    let topics = service(base_url).trending_topics(3).await.expect("topics");
    assert_eq!(
        topics,
        vec!["SolarEclipse", "Street food week", "Indie game jam"]
    );
}

#[tokio::test]
async fn fallback_caption_when_service_is_unavailable() {
    let service = UnavailableCaptionService::new("no api key configured");
    let media = CaptionMedia::Url("https://cdn.example/a.jpg".into());

    let err = service.caption(&media, None).await.expect_err("unavailable");
    assert!(matches!(err, CaptionError::Unavailable(_)));
    assert_eq!(
        caption_or_fallback(&service, &media, None).await,
        FALLBACK_CAPTION
    );
}

#[test]
fn endpoint_keeps_base_path_and_appends_key() {
    let endpoint = generate_endpoint(&CaptionConfig {
        base_url: "https://proxy.example/ai".into(),
        model: "gemini-1.5-flash".into(),
        api_key: "k".into(),
    })
    .expect("endpoint");
    assert_eq!(
        endpoint.as_str(),
        "https://proxy.example/ai/v1beta/models/gemini-1.5-flash:generateContent?key=k"
    );

    let mut config = CaptionConfig::new("k");
    config.base_url = "not a url".into();
    assert!(matches!(
        generate_endpoint(&config),
        Err(CaptionError::InvalidEndpoint(_))
    ));
}
