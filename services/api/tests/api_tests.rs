//! services/api/tests/api_tests.rs
//!
//! End-to-end tests for the HTTP surface, driving the router directly with
//! an in-memory SQLite database and stub gateway adapters.

use api_lib::adapters::{DbAdapter, InMemorySessionStore};
use api_lib::config::Config;
use api_lib::web::{router, state::AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use somnova_core::domain::DreamFragment;
use somnova_core::ports::{
    DreamCompletionService, PortError, PortResult, VoiceSynthesisService,
};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;
use tracing::Level;

//=========================================================================================
// Stub Gateway Adapters
//=========================================================================================

/// Completes any fragment with a deterministic narrative.
struct StubCompletion;

#[async_trait]
impl DreamCompletionService for StubCompletion {
    async fn complete_dream(&self, fragment: &DreamFragment) -> PortResult<String> {
        let seed = fragment.text.as_deref().unwrap_or("a wordless dream");
        Ok(format!("You dreamed: {}. The night carried you further.", seed))
    }
}

/// Produces no narration audio, like a voice service with nothing to say.
struct SilentVoice;

#[async_trait]
impl VoiceSynthesisService for SilentVoice {
    async fn synthesize_voice(&self, _completed_text: &str) -> PortResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// Always returns the same narration bytes.
struct HummingVoice;

#[async_trait]
impl VoiceSynthesisService for HummingVoice {
    async fn synthesize_voice(&self, _completed_text: &str) -> PortResult<Option<Vec<u8>>> {
        Ok(Some(b"dream-voice".to_vec()))
    }
}

/// Fails every synthesis call, like an unreachable voice service.
struct BrokenVoice;

#[async_trait]
impl VoiceSynthesisService for BrokenVoice {
    async fn synthesize_voice(&self, _completed_text: &str) -> PortResult<Option<Vec<u8>>> {
        Err(PortError::Upstream("speech endpoint unreachable".to_string()))
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

struct TestApp {
    router: Router,
    pool: SqlitePool,
}

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_path: PathBuf::from(":memory:"),
        log_level: Level::INFO,
        openai_api_key: None,
        completion_model: "gpt-4o".to_string(),
        transcription_model: "whisper-1".to_string(),
        tts_voice: "alloy".to_string(),
        session_ttl_days: 30,
        upstream_timeout_secs: 5,
        allowed_origin: "http://localhost:3000".to_string(),
    }
}

async fn spawn_app_with_voice(voice: Arc<dyn VoiceSynthesisService>) -> TestApp {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory sqlite");
    let db = Arc::new(DbAdapter::new(pool.clone()));
    db.run_migrations().await.expect("migrations failed");

    let state = Arc::new(AppState {
        config: Arc::new(test_config()),
        identity: db.clone(),
        dreams: db,
        sessions: Arc::new(InMemorySessionStore::new(Duration::days(30))),
        completion: Arc::new(StubCompletion),
        voice,
    });

    TestApp {
        router: router(state),
        pool,
    }
}

async fn spawn_app() -> TestApp {
    spawn_app_with_voice(Arc::new(SilentVoice)).await
}

async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, headers, value)
}

/// Logs in and returns the `session=<token>` cookie pair plus the response body.
async fn login(app: &TestApp, email: &str) -> (String, Value) {
    let (status, headers, body) = send(
        app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": email })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let set_cookie = headers
        .get(header::SET_COOKIE)
        .expect("login must set a session cookie")
        .to_str()
        .unwrap();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("session="));
    (cookie, body)
}

async fn user_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
        .unwrap()
}

//=========================================================================================
// Login & Identity
//=========================================================================================

#[tokio::test]
async fn login_twice_with_same_email_yields_same_user() {
    let app = spawn_app().await;

    let (_, first) = login(&app, "a@example.com").await;
    let (_, second) = login(&app, "a@example.com").await;

    assert_eq!(first["success"], json!(true));
    assert_eq!(first["user"]["email"], json!("a@example.com"));
    assert_eq!(first["user"]["id"], second["user"]["id"]);
    assert_eq!(user_count(&app.pool).await, 1);
}

#[tokio::test]
async fn login_without_email_is_rejected_and_creates_no_user() {
    let app = spawn_app().await;

    let (status, _, body) = send(&app, Method::POST, "/login", None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "email": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(user_count(&app.pool).await, 0);
}

#[tokio::test]
async fn me_returns_the_session_user() {
    let app = spawn_app().await;
    let (cookie, login_body) = login(&app, "a@example.com").await;

    let (status, _, body) = send(&app, Method::GET, "/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], login_body["user"]["id"]);
    assert_eq!(body["email"], json!("a@example.com"));
}

//=========================================================================================
// Session Gate
//=========================================================================================

#[tokio::test]
async fn protected_operations_without_a_session_are_unauthorized() {
    let app = spawn_app().await;

    for (method, uri) in [
        (Method::GET, "/me"),
        (Method::GET, "/dreams"),
        (Method::POST, "/dreams"),
        (Method::POST, "/dreams/complete"),
    ] {
        let (status, _, body) = send(&app, method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "a@example.com").await;

    let (status, _, _) = send(&app, Method::GET, "/dreams", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, headers, body) = send(&app, Method::POST, "/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.contains("Max-Age=0"));

    let (status, _, _) = send(&app, Method::GET, "/dreams", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Logout is idempotent: ending an already-ended session still succeeds.
    let (status, _, body) = send(&app, Method::POST, "/logout", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));

    // So does logging out with no session at all.
    let (status, _, _) = send(&app, Method::POST, "/logout", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

//=========================================================================================
// Dream Persistence & History
//=========================================================================================

#[tokio::test]
async fn history_starts_empty() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "a@example.com").await;

    let (status, _, body) = send(&app, Method::GET, "/dreams", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn created_dreams_are_listed_newest_first() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "a@example.com").await;
    let before = Utc::now();

    for i in 1..=3 {
        let (status, _, body) = send(
            &app,
            Method::POST,
            "/dreams",
            Some(&cookie),
            Some(json!({
                "content": format!("dream {}", i),
                "completed_text": format!("narrative {}", i),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["id"].is_i64());
    }

    let (status, _, body) = send(&app, Method::GET, "/dreams", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let dreams = body.as_array().unwrap();
    assert_eq!(dreams.len(), 3);
    let contents: Vec<&str> = dreams
        .iter()
        .map(|d| d["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["dream 3", "dream 2", "dream 1"]);

    let ids: Vec<i64> = dreams.iter().map(|d| d["id"].as_i64().unwrap()).collect();
    assert!(ids.windows(2).all(|pair| pair[0] > pair[1]));

    for dream in dreams {
        let created_at: DateTime<Utc> =
            dream["created_at"].as_str().unwrap().parse().unwrap();
        assert!(created_at >= before);
    }
}

#[tokio::test]
async fn create_dream_requires_content_and_completed_text() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "a@example.com").await;

    let (status, _, _) = send(&app, Method::POST, "/dreams", Some(&cookie), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/dreams",
        Some(&cookie),
        Some(json!({ "content": "I flew over a city" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, _, listing) = send(&app, Method::GET, "/dreams", Some(&cookie), None).await;
    assert_eq!(listing, json!([]));
}

#[tokio::test]
async fn dreams_are_scoped_to_their_owner() {
    let app = spawn_app().await;
    let (cookie_a, _) = login(&app, "a@example.com").await;
    let (cookie_b, _) = login(&app, "b@example.com").await;

    for (cookie, content) in [(&cookie_a, "a's dream"), (&cookie_b, "b's dream")] {
        let (status, _, _) = send(
            &app,
            Method::POST,
            "/dreams",
            Some(cookie),
            Some(json!({ "content": content, "completed_text": "You soared..." })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (_, _, listing_a) = send(&app, Method::GET, "/dreams", Some(&cookie_a), None).await;
    let (_, _, listing_b) = send(&app, Method::GET, "/dreams", Some(&cookie_b), None).await;

    let dreams_a = listing_a.as_array().unwrap();
    let dreams_b = listing_b.as_array().unwrap();
    assert_eq!(dreams_a.len(), 1);
    assert_eq!(dreams_b.len(), 1);
    assert_eq!(dreams_a[0]["content"], json!("a's dream"));
    assert_eq!(dreams_b[0]["content"], json!("b's dream"));
}

#[tokio::test]
async fn create_then_list_round_trip_preserves_fields() {
    let app = spawn_app().await;
    let (cookie, login_body) = login(&app, "a@example.com").await;
    let before = Utc::now();

    let (status, _, created) = send(
        &app,
        Method::POST,
        "/dreams",
        Some(&cookie),
        Some(json!({
            "content": "I flew over a city",
            "completed_text": "You soared...",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, listing) = send(&app, Method::GET, "/dreams", Some(&cookie), None).await;
    let dreams = listing.as_array().unwrap();
    assert_eq!(dreams.len(), 1);

    let dream = &dreams[0];
    assert_eq!(dream["id"], created["id"]);
    assert_eq!(dream["user_id"], login_body["user"]["id"]);
    assert_eq!(dream["content"], json!("I flew over a city"));
    assert_eq!(dream["completed_text"], json!("You soared..."));

    let created_at: DateTime<Utc> = dream["created_at"].as_str().unwrap().parse().unwrap();
    assert!(created_at >= before);
}

//=========================================================================================
// Dream Completion
//=========================================================================================

#[tokio::test]
async fn completing_a_text_fragment_returns_a_narrative() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "a@example.com").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/dreams/complete",
        Some(&cookie),
        Some(json!({ "text": "I flew over a city" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], json!("I flew over a city"));
    assert!(body["completed_text"]
        .as_str()
        .unwrap()
        .contains("I flew over a city"));
    assert_eq!(body["voice_audio"], Value::Null);
}

#[tokio::test]
async fn image_only_fragments_fall_back_to_the_placeholder_label() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "a@example.com").await;
    let image = format!("data:image/jpeg;base64,{}", STANDARD.encode(b"jpegbytes"));

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/dreams/complete",
        Some(&cookie),
        Some(json!({ "images": [image] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], json!("Voice/Image Dream"));
}

#[tokio::test]
async fn completing_an_empty_fragment_is_rejected() {
    let app = spawn_app().await;
    let (cookie, _) = login(&app, "a@example.com").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/dreams/complete",
        Some(&cookie),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/dreams/complete",
        Some(&cookie),
        Some(json!({ "images": ["not base64!"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn narration_audio_is_returned_base64_encoded() {
    let app = spawn_app_with_voice(Arc::new(HummingVoice)).await;
    let (cookie, _) = login(&app, "a@example.com").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/dreams/complete",
        Some(&cookie),
        Some(json!({ "text": "I flew over a city" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["voice_audio"],
        json!(STANDARD.encode(b"dream-voice"))
    );
}

#[tokio::test]
async fn voice_synthesis_failure_never_blocks_the_narrative() {
    let app = spawn_app_with_voice(Arc::new(BrokenVoice)).await;
    let (cookie, _) = login(&app, "a@example.com").await;

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/dreams/complete",
        Some(&cookie),
        Some(json!({ "text": "I flew over a city" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["completed_text"].as_str().unwrap().len() > 0);
    assert_eq!(body["voice_audio"], Value::Null);
}
