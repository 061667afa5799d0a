mod common;

use chrono::{Duration, Utc};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use racha_core::api::{ApiError, GroupForm, HttpAdapter, RachaClient};
use racha_core::auth::{ExpiryPolicy, SessionStore};
use racha_core::models::LoginPayload;
use racha_core::storage::{KeyValueStore, SharedStore};
use racha_core::Config;

use common::{fake_jwt, memory_store};

const LAST_GROUP_KEY: &str = "lastSessionGroupId";

struct Harness {
    server: MockServer,
    storage: SharedStore,
    session: SessionStore,
    client: RachaClient,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let config = Config {
        backend_url: server.uri(),
        ..Config::default()
    };
    let (_, storage) = memory_store();
    let session = SessionStore::open(storage.clone(), &config, ExpiryPolicy::Tracked).await;
    let client = RachaClient::new(HttpAdapter::new(&config, storage.clone()).unwrap());
    Harness {
        server,
        storage,
        session,
        client,
    }
}

fn group_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "ownerId": "u1",
        "ownerName": "Ana",
        "createdAt": "2024-05-01T12:00:00Z"
    })
}

#[tokio::test]
async fn test_login_and_sign_in_stores_issued_token() {
    let h = harness().await;
    let token = fake_jwt(Utc::now() + Duration::hours(1));
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "email": "ana@example.com", "password": "s3gredo" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": &token })))
        .expect(1)
        .mount(&h.server)
        .await;

    // A stale token must not ride along on the login call
    h.storage.set("racha_access_token", "stale").await.unwrap();

    let payload = LoginPayload {
        email: "ana@example.com".to_string(),
        password: "s3gredo".to_string(),
    };
    h.client.login_and_sign_in(&h.session, &payload).await.unwrap();

    assert!(h.session.is_authenticated());
    assert_eq!(h.session.token().as_deref(), Some(token.as_str()));
    assert_eq!(
        h.storage.get("racha_access_token").await.unwrap().as_deref(),
        Some(token.as_str())
    );

    let received = h.server.received_requests().await.unwrap();
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_login_with_undecodable_token_leaves_session_signed_out() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "accessToken": "garbage" })))
        .mount(&h.server)
        .await;

    let payload = LoginPayload {
        email: "ana@example.com".to_string(),
        password: "s3gredo".to_string(),
    };
    let err = h.client.login_and_sign_in(&h.session, &payload).await.unwrap_err();

    assert!(matches!(err, ApiError::Session(_)));
    assert!(!h.session.is_authenticated());
    assert_eq!(h.storage.get("racha_access_token").await.unwrap(), None);
}

#[tokio::test]
async fn test_backend_message_is_surfaced() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Credenciais inválidas" })),
        )
        .mount(&h.server)
        .await;

    let payload = LoginPayload {
        email: "ana@example.com".to_string(),
        password: "errada".to_string(),
    };
    let err = h.client.login(&payload).await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.to_string(), "Credenciais inválidas");
}

#[tokio::test]
async fn test_non_json_error_falls_back_to_fixed_message() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/groups"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&h.server)
        .await;

    let err = h.client.get_groups().await.unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(err.to_string(), "Não foi possível buscar os grupos.");
}

#[tokio::test]
async fn test_unauthorized_is_distinguished() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/user"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Token expirado" })))
        .mount(&h.server)
        .await;

    let err = h.client.get_user().await.unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Token expirado");
}

#[tokio::test]
async fn test_get_groups_sends_bearer_and_decodes() {
    let h = harness().await;
    let token = fake_jwt(Utc::now() + Duration::hours(1));
    h.session.sign_in(&token).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/api/groups"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            group_json("g1", "Viagem"),
            group_json("g2", "Casa"),
        ])))
        .expect(1)
        .mount(&h.server)
        .await;

    let groups = h.client.get_groups().await.unwrap();

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].id, "g1");
    assert_eq!(groups[1].owner_name, "Ana");
    assert_eq!(groups[1].description, None);
}

#[tokio::test]
async fn test_join_and_leave_manage_remembered_group() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/groups/join/ABC123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "groupId": "g7" })))
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/groups/g1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/groups/g7"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let joined = h.client.join_and_remember(&h.session, " ABC123 ").await.unwrap();
    assert_eq!(joined.group_id, "g7");
    assert_eq!(h.session.last_group().await.unwrap().as_deref(), Some("g7"));

    // Leaving some other group keeps the remembered one
    h.client.leave_and_forget(&h.session, "g1").await.unwrap();
    assert_eq!(
        h.storage.get(LAST_GROUP_KEY).await.unwrap().as_deref(),
        Some("g7")
    );

    h.client.leave_and_forget(&h.session, "g7").await.unwrap();
    assert_eq!(h.storage.get(LAST_GROUP_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_failed_join_does_not_remember() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/groups/join/NOPE"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&h.server)
        .await;

    let err = h.client.join_and_remember(&h.session, "NOPE").await.unwrap_err();

    assert_eq!(err.to_string(), "Não foi possível entrar no grupo.");
    assert_eq!(h.session.last_group().await.unwrap(), None);
}

#[tokio::test]
async fn test_health_check_returns_text() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/check"))
        .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
        .mount(&h.server)
        .await;

    assert_eq!(h.client.health_check().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_create_group_uploads_multipart() {
    let h = harness().await;
    Mock::given(method("POST"))
        .and(path("/api/groups"))
        .respond_with(ResponseTemplate::new(201).set_body_json(group_json("g9", "Churrasco")))
        .mount(&h.server)
        .await;

    let form = GroupForm {
        name: "Churrasco".to_string(),
        description: Some("Sábado".to_string()),
        thumbnail: None,
    };
    let group = h.client.create_group(form).await.unwrap();
    assert_eq!(group.id, "g9");

    let received = h.server.received_requests().await.unwrap();
    let content_type = received[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&received[0].body);
    assert!(body.contains("name=\"name\""));
    assert!(body.contains("Churrasco"));
    assert!(body.contains("name=\"description\""));
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let h = harness().await;
    Mock::given(method("GET"))
        .and(path("/api/expense/g1/summary"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&h.server)
        .await;

    let err = h.client.get_expense_summary("g1").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}
