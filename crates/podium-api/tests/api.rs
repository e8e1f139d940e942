//! End-to-end tests against the assembled router, driven through
//! tower::ServiceExt::oneshot.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use podium_api::content::EventContent;
use podium_api::rate_limit::RateLimiter;
use podium_api::routes;
use podium_api::state::{AppState, AppStateInner};
use podium_db::Database;
use podium_types::models::{ProgramItem, ProgramSession, Speaker};

fn test_content() -> EventContent {
    EventContent {
        speakers: vec![Speaker {
            id: 1,
            name: "Lala Mammadova".into(),
            title: "Neuroscientist".into(),
            bio: "Studies bilingual memory.".into(),
            topic: "The plastic brain".into(),
            image: "lala.jpg".into(),
        }],
        sessions: vec![ProgramSession {
            id: "morning".into(),
            title: "Morning Session".into(),
            time: "10:00 - 13:00".into(),
        }],
        items: vec![
            ProgramItem {
                id: 1,
                time: "10:00".into(),
                title: "Opening".into(),
                description: String::new(),
                session: "morning".into(),
                speaker_id: None,
                order: 1,
            },
            ProgramItem {
                id: 2,
                time: "10:30".into(),
                title: "The plastic brain".into(),
                description: String::new(),
                session: "morning".into(),
                speaker_id: Some(1),
                order: 2,
            },
        ],
    }
}

fn test_state(name: &str) -> AppState {
    let path = std::env::temp_dir().join(format!(
        "podium_api_test_{}_{}.sqlite",
        name,
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);
    let _ = std::fs::remove_file(path.with_extension("sqlite-wal"));
    let _ = std::fs::remove_file(path.with_extension("sqlite-shm"));

    Arc::new(AppStateInner {
        db: Database::open(&path).unwrap(),
        content: test_content(),
        session_secret: "test-secret".into(),
        production: false,
    })
}

fn app_for(state: AppState) -> Router {
    routes::router(state, RateLimiter::new(10_000, Duration::from_secs(60)))
}

fn test_app(name: &str) -> Router {
    app_for(test_state(name))
}

/// Sends one request; returns (status, first Set-Cookie pair, parsed body).
async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let set_cookie = res
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(';').next())
        .map(str::to_string);

    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, set_cookie, body)
}

async fn signup(app: &Router, username: &str) -> String {
    let (status, cookie, _) = send(
        app,
        "POST",
        "/api/signup",
        None,
        Some(json!({ "username": username, "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    cookie.expect("signup sets a session cookie")
}

fn registration_body(email: &str) -> Value {
    json!({
        "firstName": "Aysel",
        "lastName": "Quliyeva",
        "email": email,
        "phone": "0501234567",
        "occupation": "Student",
        "topics": ["ai", "design"],
        "terms": true
    })
}

#[tokio::test]
async fn register_creates_record_and_rejects_duplicate_email() {
    let app = test_app("register_dup");

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(registration_body("aysel@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["id"].as_i64().unwrap() >= 1);
    assert_eq!(body["email"], "aysel@example.com");
    assert_eq!(body["topics"], json!(["ai", "design"]));

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(registration_body("aysel@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "This email is already registered");
}

#[tokio::test]
async fn register_missing_field_never_persists() {
    let app = test_app("register_missing");

    let mut body = registration_body("leyla@example.com");
    body.as_object_mut().unwrap().remove("phone");
    let (status, _, response) = send(&app, "POST", "/api/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "All fields are required");

    // Nothing was written: the same email registers cleanly afterwards.
    let (status, _, _) = send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(registration_body("leyla@example.com")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn register_requires_accepted_terms() {
    let app = test_app("register_terms");

    let mut body = registration_body("rauf@example.com");
    body["terms"] = json!(false);
    let (status, _, _) = send(&app, "POST", "/api/register", None, Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn contact_missing_subject_is_rejected() {
    let app = test_app("contact_missing");

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/contact",
        None,
        Some(json!({
            "name": "Nigar",
            "email": "nigar@example.com",
            "message": "Any tickets left?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "All fields are required");
}

#[tokio::test]
async fn contact_starts_unread_and_mark_read_is_idempotent() {
    let app = test_app("contact_read");

    let (status, _, created) = send(
        &app,
        "POST",
        "/api/contact",
        None,
        Some(json!({
            "name": "Nigar",
            "email": "nigar@example.com",
            "subject": "Tickets",
            "message": "Any left?"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["isRead"], json!(false));
    let id = created["id"].as_i64().unwrap();

    let cookie = signup(&app, "admin").await;
    let uri = format!("/api/admin/contacts/{id}/read");

    let (status, _, body) = send(&app, "PATCH", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isRead"], json!(true));

    let (status, _, body) = send(&app, "PATCH", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isRead"], json!(true));
}

#[tokio::test]
async fn admin_endpoints_require_a_session() {
    let app = test_app("admin_guard");

    for (method, uri) in [
        ("GET", "/api/admin/registrations"),
        ("GET", "/api/admin/contacts"),
        ("DELETE", "/api/admin/registrations/1"),
        ("PATCH", "/api/admin/contacts/1/read"),
        ("GET", "/api/user"),
    ] {
        let (status, _, body) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["message"], "Unauthorized");
        assert_eq!(body["path"], uri);
        assert!(body["timestamp"].is_string());
    }
}

#[tokio::test]
async fn signup_login_logout_flow() {
    let app = test_app("auth_flow");

    let cookie = signup(&app, "admin").await;

    let (status, _, body) = send(&app, "GET", "/api/user", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");

    let (status, _, _) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "admin", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login_cookie, body) = send(
        &app,
        "POST",
        "/api/login",
        None,
        Some(json!({ "username": "admin", "password": "hunter2hunter2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "admin");
    let login_cookie = login_cookie.unwrap();

    let (status, _, _) = send(&app, "POST", "/api/logout", Some(&login_cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    // The server-side session is gone; the old cookie no longer authenticates.
    let (status, _, _) = send(&app, "GET", "/api/user", Some(&login_cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = test_app("dup_username");

    signup(&app, "admin").await;
    let (status, _, body) = send(
        &app,
        "POST",
        "/api/signup",
        None,
        Some(json!({ "username": "admin", "password": "another-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Username already taken");
}

#[tokio::test]
async fn tampered_session_cookie_is_rejected() {
    let app = test_app("tampered_cookie");

    let cookie = signup(&app, "admin").await;
    let mut forged = cookie.clone();
    let last = forged.pop().unwrap();
    forged.push(if last == '0' { '1' } else { '0' });

    let (status, _, _) = send(&app, "GET", "/api/user", Some(&forged), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn delete_missing_registration_is_404() {
    let app = test_app("delete_missing");
    let cookie = signup(&app, "admin").await;

    let (status, _, body) = send(
        &app,
        "DELETE",
        "/api/admin/registrations/999999",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Qeydiyyat tapılmadı");
}

#[tokio::test]
async fn admin_lists_and_deletes_registrations() {
    let app = test_app("admin_crud");

    send(
        &app,
        "POST",
        "/api/register",
        None,
        Some(registration_body("aysel@example.com")),
    )
    .await;

    let cookie = signup(&app, "admin").await;

    let (status, _, body) = send(&app, "GET", "/api/admin/registrations", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    let id = rows[0]["id"].as_i64().unwrap();

    let uri = format!("/api/admin/registrations/{id}");
    let (status, _, _) = send(&app, "DELETE", &uri, Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(&app, "GET", "/api/admin/registrations", Some(&cookie), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn public_content_endpoints() {
    let app = test_app("content");

    let (status, _, body) = send(&app, "GET", "/api/speakers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _, body) = send(&app, "GET", "/api/program/sessions", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "morning");

    let (status, _, body) = send(&app, "GET", "/api/program/items", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items[0]["speaker"].is_null());
    assert_eq!(items[1]["speaker"]["name"], "Lala Mammadova");
}

#[tokio::test]
async fn malformed_json_body_gets_the_error_envelope() {
    let app = test_app("bad_json");

    let req = Request::builder()
        .method("POST")
        .uri("/api/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let res = app.clone().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).expect("envelope, not parser plain text");
    assert_eq!(body["message"], "Invalid request body");
    assert_eq!(body["path"], "/api/register");
    assert!(body["timestamp"].is_string());
    // Parser internals stay out of the message.
    assert!(!body["message"].as_str().unwrap().contains("line"));
}

#[tokio::test]
async fn unmatched_route_error_is_enveloped() {
    let app = test_app("enveloped_404");

    let (status, _, body) = send(&app, "GET", "/api/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["path"], "/api/nope");
}

#[tokio::test]
async fn deleted_user_session_is_unauthorized() {
    let state = test_state("deleted_user");
    let app = app_for(state.clone());

    let cookie = signup(&app, "admin").await;

    // Remove the user but keep the session row alive, so the lookup walks
    // the stale-identity path rather than the missing-session one.
    state
        .db
        .write(|conn| {
            conn.pragma_update(None, "foreign_keys", "OFF")?;
            conn.execute("DELETE FROM users WHERE username = ?1", ["admin"])?;
            conn.pragma_update(None, "foreign_keys", "ON")?;
            Ok(())
        })
        .unwrap();

    let (status, _, body) = send(&app, "GET", "/api/user", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn rate_limited_request_gets_429() {
    let state = test_state("rate_limited");
    let app = routes::router(state, RateLimiter::new(1, Duration::from_secs(60)));

    for expected in [StatusCode::OK, StatusCode::TOO_MANY_REQUESTS] {
        let req = Request::builder()
            .method("GET")
            .uri("/api/speakers")
            .header("x-forwarded-for", "203.0.113.9")
            .body(Body::empty())
            .unwrap();
        let res = app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), expected);
    }
}

#[tokio::test]
async fn submitted_text_is_sanitized() {
    let app = test_app("sanitized");

    let (status, _, body) = send(
        &app,
        "POST",
        "/api/contact",
        None,
        Some(json!({
            "name": "<b>Nigar</b>",
            "email": "nigar@example.com",
            "subject": "Hello",
            "message": "1 < 2"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "&lt;b&gt;Nigar&lt;/b&gt;");
    assert_eq!(body["message"], "1 &lt; 2");
}
