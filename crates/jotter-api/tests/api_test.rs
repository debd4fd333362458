//! End-to-end API tests against a real server and database.
//!
//! Run with a migrated database:
//! `DATABASE_URL=postgres://... cargo test -p jotter-api -- --ignored`

use std::time::Duration;

use jotter_api::{router, ApiConfig, AppState};
use jotter_db::test_fixtures::{test_database_url, TestDatabase};
use jotter_db::{ChangeNotifier, SessionRepository};
use serde_json::{json, Value};

struct TestServer {
    base_url: String,
    t: TestDatabase,
}

impl TestServer {
    async fn start() -> Self {
        let t = TestDatabase::new().await;
        let notifier = ChangeNotifier::start(&test_database_url()).await.unwrap();
        let config = ApiConfig::from_lookup(|key| match key {
            "SYNC_KEEPALIVE_SECS" => Some("1".to_string()),
            _ => None,
        });
        let app = router(
            AppState::new(t.db.clone(), notifier, &config),
            config.allowed_origins,
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            base_url: format!("http://{}", addr),
            t,
        }
    }

    async fn token(&self) -> String {
        self.t
            .db
            .sessions
            .issue(self.t.user.id, chrono::Duration::hours(1))
            .await
            .unwrap()
            .token
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Read from an SSE response until `needle` shows up or `timeout` passes.
async fn read_until(response: &mut reqwest::Response, needle: &str, timeout: Duration) -> String {
    let mut collected = String::new();
    let deadline = tokio::time::Instant::now() + timeout;
    while !collected.contains(needle) && tokio::time::Instant::now() < deadline {
        let remaining =
            (deadline - tokio::time::Instant::now()).max(Duration::from_millis(1));
        match tokio::time::timeout(remaining, response.chunk()).await {
            Ok(Ok(Some(chunk))) => collected.push_str(&String::from_utf8_lossy(&chunk)),
            _ => break,
        }
    }
    collected
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_toggle_in_one_session_reaches_another() {
    let server = TestServer::start().await;
    let watcher = server.token().await;
    let actor = server.token().await;
    let client = reqwest::Client::new();

    let mut stream = client
        .get(server.url("/api/sync"))
        .bearer_auth(&watcher)
        .send()
        .await
        .unwrap();
    assert_eq!(stream.status(), 200);
    assert_eq!(stream.headers()["content-type"], "text/event-stream");

    let greeting = read_until(&mut stream, "event: connected", Duration::from_secs(2)).await;
    assert!(greeting.contains(r#"data: {"type":"connected"}"#));

    let todo: Value = client
        .post(server.url("/api/v1/todos"))
        .bearer_auth(&actor)
        .json(&json!({"date": "2026-10-16", "content": "sync me"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = todo["id"].as_str().unwrap().to_string();

    let created = read_until(&mut stream, &id, Duration::from_secs(5)).await;
    assert!(created.contains("event: change"));
    assert!(created.contains(r#""operation":"INSERT""#));
    assert!(created.contains(r#""table":"todos""#));
    assert!(created.contains(r#""date":"2026-10-16""#));

    let toggled = client
        .post(server.url(&format!("/api/v1/todos/{}/toggle", id)))
        .bearer_auth(&actor)
        .send()
        .await
        .unwrap();
    assert_eq!(toggled.status(), 200);

    let updated = read_until(&mut stream, r#""operation":"UPDATE""#, Duration::from_secs(5)).await;
    assert!(updated.contains(&id));

    drop(stream);
    server.t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_sync_stream_sends_keepalive() {
    let server = TestServer::start().await;
    let token = server.token().await;

    let mut stream = reqwest::Client::new()
        .get(server.url("/api/sync"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let body = read_until(&mut stream, ": ping", Duration::from_secs(3)).await;
    assert!(body.contains(": ping"));

    drop(stream);
    server.t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_sync_accepts_session_cookie() {
    let server = TestServer::start().await;
    let token = server.token().await;

    let response = reqwest::Client::new()
        .get(server.url("/api/sync"))
        .header("cookie", format!("jotter_session={}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    drop(response);
    server.t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_todo_and_day_endpoints() {
    let server = TestServer::start().await;
    let token = server.token().await;
    let client = reqwest::Client::new();

    let blank = client
        .post(server.url("/api/v1/todos"))
        .bearer_auth(&token)
        .json(&json!({"date": "2026-10-16", "content": "  "}))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), 400);
    let body: Value = blank.json().await.unwrap();
    assert!(body["error"].is_string());

    let mut ids = Vec::new();
    for content in ["first", "second [[errands]]"] {
        let response = client
            .post(server.url("/api/v1/todos"))
            .bearer_auth(&token)
            .json(&json!({"date": "2026-10-16", "content": content, "priority": "high"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let todo: Value = response.json().await.unwrap();
        ids.push(todo["id"].as_str().unwrap().to_string());
    }

    let reorder = client
        .put(server.url("/api/v1/days/2026-10-16/order"))
        .bearer_auth(&token)
        .json(&json!({"ids": [ids[1], ids[0]]}))
        .send()
        .await
        .unwrap();
    assert_eq!(reorder.status(), 204);

    let day: Value = client
        .get(server.url("/api/v1/days/2026-10-16"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let todos = day["todos"].as_array().unwrap();
    assert_eq!(todos.len(), 2);
    assert_eq!(todos[0]["id"], ids[1].as_str());
    assert_eq!(todos[0]["tags"], json!(["errands"]));

    let carry: Value = client
        .get(server.url("/api/v1/days/2026-10-17/carry-over"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(carry.as_array().unwrap().len(), 2);

    let missing = client
        .get(server.url(&format!("/api/v1/todos/{}", uuid::Uuid::now_v7())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);

    server.t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_duplicate_project_is_conflict() {
    let server = TestServer::start().await;
    let token = server.token().await;
    let client = reqwest::Client::new();
    let body = json!({"name": "Garden", "color": "#22c55e"});

    let first = client
        .post(server.url("/api/v1/projects"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);

    let second = client
        .post(server.url("/api/v1/projects"))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);

    server.t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_settings_round_trip_and_validation() {
    let server = TestServer::start().await;
    let token = server.token().await;
    let client = reqwest::Client::new();

    let defaults: Value = client
        .get(server.url("/api/v1/settings"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(defaults["time_format"], "24h");
    assert!(defaults["accent"].is_null());

    let invalid = client
        .put(server.url("/api/v1/settings"))
        .bearer_auth(&token)
        .json(&json!({"accent": {"lightness": 2.0, "chroma": 0.1, "hue": 10.0}}))
        .send()
        .await
        .unwrap();
    assert_eq!(invalid.status(), 400);

    let saved: Value = client
        .put(server.url("/api/v1/settings"))
        .bearer_auth(&token)
        .json(&json!({"time_format": "12h"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(saved["time_format"], "12h");

    server.t.cleanup().await;
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_sign_out_revokes_session() {
    let server = TestServer::start().await;
    let token = server.token().await;
    let client = reqwest::Client::new();

    let me: Value = client
        .get(server.url("/api/v1/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], server.t.user.email.as_str());

    let signed_out = client
        .delete(server.url("/api/v1/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(signed_out.status(), 204);

    let after = client
        .get(server.url("/api/v1/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(after.status(), 401);

    server.t.cleanup().await;
}
