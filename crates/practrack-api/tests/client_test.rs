#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use practrack_api::{
    ApiClient, Credentials, Error, ListParams, Practice, PracticeResult, PracticeSession,
    TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn ts(raw: &str) -> DateTime<Utc> {
    raw.parse().unwrap()
}

// ── Authentication ──────────────────────────────────────────────────

#[tokio::test]
async fn test_authenticate_returns_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .and(body_json(json!({
            "username": "user",
            "password": "user",
            "rememberMe": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id_token": "jwt-abc" })))
        .mount(&server)
        .await;

    let token = client
        .authenticate("user", &SecretString::from("user"), false)
        .await
        .unwrap();
    assert_eq!(token.expose_secret(), "jwt-abc");
}

#[tokio::test]
async fn test_authenticate_bad_credentials() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "title": "Unauthorized",
            "status": 401,
            "detail": "Bad credentials"
        })))
        .mount(&server)
        .await;

    let result = client
        .authenticate("user", &SecretString::from("nope"), false)
        .await;
    assert!(
        matches!(result, Err(Error::Authentication { ref message }) if message == "Bad credentials"),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_credentials_attach_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id_token": "jwt-xyz" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions"))
        .and(header("authorization", "Bearer jwt-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::Login {
        username: "admin".into(),
        password: SecretString::from("admin"),
        remember_me: true,
    };
    let client = ApiClient::connect(&server.uri(), &credentials, &TransportConfig::default())
        .await
        .unwrap();

    let sessions: Vec<PracticeSession> = client.list(&ListParams::default()).await.unwrap();
    assert!(sessions.is_empty());
}

// ── Practice sessions ───────────────────────────────────────────────

#[tokio::test]
async fn test_create_session_then_list_contains_it() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/practice-sessions"))
        .and(body_json(json!({ "start": "2022-09-04T07:30:08.891Z" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1001,
            "start": "2022-09-04T07:30:08.891Z",
            "end": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1000, "start": null, "end": null },
            { "id": 1001, "start": "2022-09-04T07:30:08.891Z", "end": null }
        ])))
        .mount(&server)
        .await;

    let draft = PracticeSession {
        start: Some(ts("2022-09-04T07:30:08.891Z")),
        ..PracticeSession::default()
    };
    let created = client.create(&draft).await.unwrap();
    assert_eq!(created.id, Some(1001));
    assert_eq!(created.start, draft.start);

    let all: Vec<PracticeSession> = client.list(&ListParams::default()).await.unwrap();
    assert!(all.iter().any(|s| s.id == Some(1001)));
}

#[tokio::test]
async fn test_list_sends_sort_and_cache_buster() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions"))
        .and(query_param("sort", "id,desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let params = ListParams::default().sorted_by("id,desc");
    let _: Vec<PracticeSession> = client.list(&params).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(
        requests[0]
            .url
            .query_pairs()
            .any(|(k, _)| k == "cacheBuster")
    );
}

#[tokio::test]
async fn test_get_missing_session_is_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions/9999"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "title": "Not Found",
            "status": 404,
            "message": "error.http.404"
        })))
        .mount(&server)
        .await;

    let err = client.get_one::<PracticeSession>(9999).await.unwrap_err();
    assert!(err.is_not_found(), "expected not-found, got: {err:?}");
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_patch_session_sends_only_present_fields() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/practice-sessions/4"))
        .and(body_json(json!({ "id": 4, "end": "2022-09-04T14:50:02.456Z" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "start": "2022-09-04T07:05:39.902Z",
            "end": "2022-09-04T14:50:02.456Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let patch = PracticeSession {
        id: Some(4),
        end: Some(ts("2022-09-04T14:50:02.456Z")),
        ..PracticeSession::default()
    };
    let merged = client.partial_update(&patch).await.unwrap();
    assert_eq!(merged.start, Some(ts("2022-09-04T07:05:39.902Z")));
}

// ── Practices ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_then_delete_practice() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/practices"))
        .and(body_json(json!({
            "problemName": "Landing Hills Bacon",
            "problemLink": "deposit Account",
            "practiceSession": { "id": 1001 }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 55,
            "problemName": "Landing Hills Bacon",
            "problemLink": "deposit Account",
            "start": null,
            "end": null,
            "result": null,
            "practiceSession": { "id": 1001, "start": null, "end": null }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/practices/55"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/practices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let draft = Practice {
        problem_name: "Landing Hills Bacon".into(),
        problem_link: "deposit Account".into(),
        practice_session: Some(PracticeSession::reference(1001)),
        ..Practice::default()
    };
    let created = client.create(&draft).await.unwrap();
    assert_eq!(created.id, Some(55));
    assert_eq!(
        created.practice_session.and_then(|s| s.id),
        Some(1001)
    );

    client.delete::<Practice>(55).await.unwrap();

    let remaining: Vec<Practice> = client.list(&ListParams::default()).await.unwrap();
    assert!(remaining.iter().all(|p| p.id != Some(55)));
}

#[tokio::test]
async fn test_create_with_existing_id_is_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/practices"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "title": "A new practice cannot already have an ID",
            "status": 400,
            "entityName": "practice",
            "errorKey": "idexists",
            "message": "error.idexists"
        })))
        .mount(&server)
        .await;

    let draft = Practice {
        id: Some(1),
        problem_name: "x".into(),
        problem_link: "y".into(),
        ..Practice::default()
    };
    let err = client.create(&draft).await.unwrap_err();
    assert_eq!(err.error_key(), Some("idexists"));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_update_without_id_never_reaches_server() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.update(&Practice::default()).await.unwrap_err();
    assert!(matches!(err, Error::MissingId { entity: "practice" }));
}

#[tokio::test]
async fn test_update_practice_puts_full_body() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/practices/8"))
        .and(body_json(json!({
            "id": 8,
            "problemName": "renamed",
            "problemLink": "https://example.com",
            "result": "PASS",
            "practiceSession": { "id": 2 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 8,
            "problemName": "renamed",
            "problemLink": "https://example.com",
            "result": "PASS",
            "practiceSession": { "id": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let practice = Practice {
        id: Some(8),
        problem_name: "renamed".into(),
        problem_link: "https://example.com".into(),
        result: Some(PracticeResult::Pass),
        practice_session: Some(PracticeSession::reference(2)),
        ..Practice::default()
    };
    let updated = client.update(&practice).await.unwrap();
    assert_eq!(updated, practice);
}

#[tokio::test]
async fn test_list_ndjson_parses_each_line() {
    let (server, client) = setup().await;

    let body = "{\"id\":1,\"problemName\":\"a\",\"problemLink\":\"b\"}\n\
                {\"id\":2,\"problemName\":\"c\",\"problemLink\":\"d\"}\n";

    Mock::given(method("GET"))
        .and(path("/api/practices"))
        .and(header("accept", "application/x-ndjson"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/x-ndjson")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let practices: Vec<Practice> = client.list_ndjson(&ListParams::default()).await.unwrap();
    let ids: Vec<Option<i64>> = practices.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![Some(1), Some(2)]);
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practices/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.get_one::<Practice>(3).await;
    assert!(
        matches!(result, Err(Error::Deserialization { ref body, .. }) if body.contains("oops")),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practices"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client
        .list::<Practice>(&ListParams::default())
        .await
        .unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.status(), Some(503));
}
