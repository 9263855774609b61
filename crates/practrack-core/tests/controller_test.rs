#![allow(clippy::unwrap_used)]
// Integration tests for `Controller` against a wiremock server.

use std::time::Duration;

use chrono::Utc;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use practrack_core::{
    ControllerConfig, Controller, CoreError, EntityForm, EntityId, ListParams, Practice,
    PracticeSession, SlicePhase, SliceState,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, Controller) {
    let server = MockServer::start().await;
    let config = ControllerConfig::new(server.uri().parse().unwrap());
    let controller = Controller::new(config);
    controller.connect().await.unwrap();
    (server, controller)
}

/// Wait until `E`'s slice satisfies `pred`, failing after a second.
async fn wait_for<E, F>(controller: &Controller, pred: F) -> SliceState<E>
where
    E: practrack_core::Entity,
    F: FnMut(&SliceState<E>) -> bool,
{
    let mut rx = controller.subscribe::<E>();
    tokio::time::timeout(Duration::from_secs(1), rx.wait_for(pred))
        .await
        .expect("slice did not reach expected state")
        .unwrap()
        .clone()
}

// ── Create / list ───────────────────────────────────────────────────

#[tokio::test]
async fn test_created_session_appears_in_next_list() {
    let (server, controller) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/practice-sessions"))
        .and(body_json(json!({ "start": "2022-09-04T07:30:08.891Z" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 1001,
            "start": "2022-09-04T07:30:08.891Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1001, "start": "2022-09-04T07:30:08.891Z" }
        ])))
        .mount(&server)
        .await;

    let draft = PracticeSession {
        start: Some("2022-09-04T07:30:08.891Z".parse().unwrap()),
        ..PracticeSession::default()
    };
    let created = controller.create(draft).await.unwrap();
    assert_eq!(created.id, Some(1001));

    let state = controller.state::<PracticeSession>();
    assert!(state.update_success);
    assert!(!state.updating);
    assert_eq!(state.entity.id, Some(1001));

    let state = wait_for::<PracticeSession, _>(&controller, |s| {
        !s.loading && s.entities.iter().any(|e| e.id == Some(1001))
    })
    .await;
    assert!(state.update_success, "background re-list must keep the success flag");
    assert_eq!(state.phase(), SlicePhase::Succeeded);
}

#[tokio::test]
async fn test_list_sets_and_clears_loading() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "problemName": "a", "problemLink": "b" },
            { "id": 2, "problemName": "c", "problemLink": "d", "result": "PASS" }
        ])))
        .mount(&server)
        .await;

    let mut rx = controller.subscribe::<Practice>();
    let items = controller
        .list::<Practice>(&ListParams::default())
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert_eq!(state.error_message, None);
    assert_eq!(state.phase(), SlicePhase::Ready);
}

// ── Delete ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_deleted_practice_is_absent_from_next_list() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 55, "problemName": "Landing Hills Bacon", "problemLink": "deposit Account" }
        ])))
        .up_to_n_times(1)
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

    let before = controller
        .list::<Practice>(&ListParams::default())
        .await
        .unwrap();
    assert_eq!(before.len(), 1);

    controller.delete::<Practice>(EntityId::new(55)).await.unwrap();
    assert_eq!(*controller.state::<Practice>().entity, Practice::default());

    let state = wait_for::<Practice, _>(&controller, |s| !s.loading && s.entities.is_empty()).await;
    assert!(state.update_success);
}

// ── Forms ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_practice_form_without_session_sends_nothing() {
    let (server, controller) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/practices"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let mut form = EntityForm::<Practice>::create(&Utc::now());
    form.set_named("problemName", "Landing Hills Bacon");
    form.set_named("problemLink", "deposit Account");

    let err = controller.save(&mut form, &Utc).await.unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }), "got: {err:?}");

    let state = controller.state::<Practice>();
    assert!(!state.updating);
    assert_eq!(state.error_message, None);
}

#[tokio::test]
async fn test_practice_form_posts_resolved_session() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1001 }])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/practices"))
        .and(body_json(json!({
            "problemName": "Landing Hills Bacon",
            "problemLink": "deposit Account",
            "result": "PASS",
            "practiceSession": { "id": 1001 }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 56,
            "problemName": "Landing Hills Bacon",
            "problemLink": "deposit Account",
            "result": "PASS",
            "practiceSession": { "id": 1001 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/practices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let options = controller.preload_references::<Practice>().await.unwrap();
    assert_eq!(
        options.get(practrack_core::EntityKind::PracticeSession).len(),
        1
    );

    let mut form = EntityForm::<Practice>::create(&Utc::now());
    form.set_named("problemName", "Landing Hills Bacon");
    form.set_named("problemLink", "deposit Account");
    form.set_named("start", "");
    form.set_named("end", "");
    form.set_named("practiceSession", "1001");

    let saved = controller.save(&mut form, &Utc).await.unwrap();
    assert_eq!(saved.id, Some(56));
}

#[tokio::test]
async fn test_edit_form_puts_merged_entity() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions/4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "start": "2022-09-04T07:05:39.902Z"
        })))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/api/practice-sessions/4"))
        .and(body_json(json!({
            "id": 4,
            "start": "2022-09-04T07:05:00Z",
            "end": "2022-09-04T14:50:00Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "start": "2022-09-04T07:05:00Z",
            "end": "2022-09-04T14:50:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let session = controller
        .get_one::<PracticeSession>(EntityId::new(4))
        .await
        .unwrap();
    let mut form = EntityForm::edit(EntityId::new(4), &session, &Utc);
    form.set_named("end", "2022-09-04T14:50");

    let saved = controller.save(&mut form, &Utc).await.unwrap();
    assert!(saved.end.is_some());
    assert!(controller.state::<PracticeSession>().update_success);
}

// ── Failures ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_rejected_create_sets_error_and_keeps_cache() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practice-sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 1 }])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/practice-sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "title": "A new practiceSession cannot already have an ID",
            "status": 400,
            "errorKey": "idexists"
        })))
        .mount(&server)
        .await;

    controller
        .list::<PracticeSession>(&ListParams::default())
        .await
        .unwrap();

    let err = controller
        .create(PracticeSession {
            id: Some(1),
            ..PracticeSession::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Api { ref code, .. } if code.as_deref() == Some("idexists")));

    let state = controller.state::<PracticeSession>();
    assert!(!state.updating);
    assert!(!state.loading);
    assert!(!state.update_success);
    assert!(state.error_message.is_some());
    assert_eq!(state.entities.len(), 1);
    assert_eq!(state.phase(), SlicePhase::Failed);
}

#[tokio::test]
async fn test_missing_entity_is_not_found() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practices/404"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = controller
        .get_one::<Practice>(EntityId::new(404))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Practice not found: 404");
}

#[tokio::test]
async fn test_operations_fail_when_disconnected() {
    let server = MockServer::start().await;
    let controller = Controller::new(ControllerConfig::new(server.uri().parse().unwrap()));

    let err = controller
        .list::<Practice>(&ListParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ControllerDisconnected));
    assert!(controller.state::<Practice>().error_message.is_some());
}

#[tokio::test]
async fn test_reset_clears_slice() {
    let (server, controller) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/practices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(
        controller
            .list::<Practice>(&ListParams::default())
            .await
            .is_err()
    );
    controller.reset::<Practice>();
    assert_eq!(controller.state::<Practice>(), SliceState::default());
}

#[tokio::test]
async fn test_login_returns_token_without_connecting() {
    use secrecy::{ExposeSecret, SecretString};

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/authenticate"))
        .and(body_json(json!({
            "username": "admin",
            "password": "admin",
            "rememberMe": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id_token": "jwt-abc" })))
        .expect(1)
        .mount(&server)
        .await;

    let config = ControllerConfig::new(server.uri().parse().unwrap());
    let token = Controller::login(&config, "admin", &SecretString::from("admin"), true)
        .await
        .unwrap();
    assert_eq!(token.expose_secret(), "jwt-abc");
}
