//! Lifecycle controller tests: generate, attach, poll, teardown.

use httpmock::prelude::*;
use mailtm_client::{Client, Error, PollPolicy, SessionController, SessionState, UsernamePolicy};
use serde_json::json;
use std::time::Duration;

fn controller_for(server: &MockServer) -> SessionController {
    let client = Client::builder()
        .base_url(server.base_url())
        .build()
        .unwrap();
    let policy = PollPolicy {
        interval: Duration::from_millis(25),
        ..PollPolicy::default()
    };
    SessionController::with_policy(client, policy)
}

async fn mock_domains(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/domains");
            then.status(200)
                .json_body(json!({"hydra:member": [{"id": "d1", "domain": "temp.io"}]}));
        })
        .await
}

async fn mock_token(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(200).json_body(json!({"token": "tok123"}));
        })
        .await
}

async fn mock_empty_inbox(server: &MockServer) -> httpmock::Mock<'_> {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/messages");
            then.status(200)
                .json_body(json!({"hydra:member": [], "hydra:totalItems": 0}));
        })
        .await
}

fn taken_body() -> serde_json::Value {
    json!({
        "type": "https://symfony.com/errors/validation",
        "title": "An error occurred",
        "detail": "address: This value is already used."
    })
}

async fn wait_until<F: Fn() -> bool>(cond: F, what: &str) {
    for _ in 0..200 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("timed out waiting for {what}");
}

#[tokio::test]
async fn start_registers_on_the_fetched_domain() {
    let server = MockServer::start_async().await;
    let domains = mock_domains(&server).await;
    let register = server
        .mock_async(|when, then| {
            when.method(POST).path("/accounts");
            then.status(201)
                .json_body(json!({"id": "acc1", "address": "ignored@temp.io"}));
        })
        .await;
    mock_token(&server).await;
    mock_empty_inbox(&server).await;

    let mut controller = controller_for(&server);
    let address = controller.start(UsernamePolicy::Random).await.unwrap();

    assert!(address.ends_with("@temp.io"), "got {address}");
    assert_eq!(controller.address(), Some(address.as_str()));
    assert_eq!(controller.state(), SessionState::Polling);
    domains.assert_async().await;
    register.assert_async().await;
    controller.stop().await;
    assert_eq!(controller.state(), SessionState::Stopped);
}

#[tokio::test]
async fn custom_username_is_used_verbatim() {
    let server = MockServer::start_async().await;
    mock_domains(&server).await;
    let register = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/accounts")
                .body_contains("bob@temp.io");
            then.status(201)
                .json_body(json!({"id": "acc1", "address": "bob@temp.io"}));
        })
        .await;
    mock_token(&server).await;
    mock_empty_inbox(&server).await;

    let mut controller = controller_for(&server);
    let address = controller
        .start(UsernamePolicy::Custom("bob".into()))
        .await
        .unwrap();
    assert_eq!(address, "bob@temp.io");
    register.assert_async().await;
    controller.stop().await;
}

#[tokio::test]
async fn invalid_custom_username_is_rejected_before_any_request() {
    let server = MockServer::start_async().await;
    let domains = mock_domains(&server).await;

    let mut controller = controller_for(&server);
    for name in ["ab", "1bob", "bob!"] {
        let err = controller
            .start(UsernamePolicy::Custom(name.into()))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidUsername(_)), "{name}");
    }
    assert_eq!(domains.hits_async().await, 0);
}

#[tokio::test]
async fn taken_random_address_retries_a_bounded_number_of_times() {
    let server = MockServer::start_async().await;
    let domains = mock_domains(&server).await;
    let register = server
        .mock_async(|when, then| {
            when.method(POST).path("/accounts");
            then.status(422).json_body(taken_body());
        })
        .await;

    let mut controller = controller_for(&server);
    let err = controller.start(UsernamePolicy::Random).await.unwrap_err();
    assert!(matches!(err, Error::AddressTaken));
    assert_eq!(register.hits_async().await, 5);
    assert_eq!(domains.hits_async().await, 1);
}

#[tokio::test]
async fn taken_custom_address_is_not_retried() {
    let server = MockServer::start_async().await;
    mock_domains(&server).await;
    let register = server
        .mock_async(|when, then| {
            when.method(POST).path("/accounts");
            then.status(422).json_body(taken_body());
        })
        .await;

    let mut controller = controller_for(&server);
    let err = controller
        .start(UsernamePolicy::Custom("bob".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AddressTaken));
    assert_eq!(register.hits_async().await, 1);
}

#[tokio::test]
async fn full_session_scenario() {
    let server = MockServer::start_async().await;
    mock_domains(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/accounts");
            then.status(201)
                .json_body(json!({"id": "acc1", "address": "alice@temp.io"}));
        })
        .await;
    mock_token(&server).await;
    let list = server
        .mock_async(|when, then| {
            when.method(GET).path("/messages");
            then.status(200).json_body(json!({"hydra:member": [{
                "id": "m1",
                "from": {"address": "sender@example.com"},
                "subject": "Welcome",
                "intro": "Welcome to..."
            }]}));
        })
        .await;
    let fetch = server
        .mock_async(|when, then| {
            when.method(GET).path("/messages/m1");
            then.status(200).json_body(json!({
                "id": "m1",
                "from": {"address": "sender@example.com"},
                "subject": "Welcome",
                "text": "Welcome to your new inbox."
            }));
        })
        .await;

    let mut controller = controller_for(&server);
    let address = controller
        .start(UsernamePolicy::Custom("alice".into()))
        .await
        .unwrap();
    assert_eq!(address, "alice@temp.io");

    wait_until(|| controller.message_count() == 1, "first message").await;
    let messages = controller.messages();
    assert_eq!(messages[0].subject, "Welcome");
    assert_eq!(messages[0].text.as_deref(), Some("Welcome to your new inbox."));

    // Further polls keep reporting m1; nothing is duplicated.
    for _ in 0..200 {
        if list.hits_async().await >= 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(controller.message_count(), 1);
    assert_eq!(fetch.hits_async().await, 1);

    controller.stop().await;
}

#[tokio::test]
async fn teardown_deletes_the_account_and_clears_state() {
    let server = MockServer::start_async().await;
    mock_domains(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/accounts");
            then.status(201)
                .json_body(json!({"id": "acc1", "address": "alice@temp.io"}));
        })
        .await;
    let token = mock_token(&server).await;
    mock_empty_inbox(&server).await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/accounts/acc1")
                .header("authorization", "Bearer tok123");
            then.status(204);
        })
        .await;

    let mut controller = controller_for(&server);
    controller.start(UsernamePolicy::Random).await.unwrap();

    controller.teardown().await.unwrap();
    delete.assert_async().await;
    // One exchange for the session, one fresh exchange for teardown.
    assert_eq!(token.hits_async().await, 2);
    assert_eq!(controller.address(), None);
    assert_eq!(controller.state(), SessionState::Stopped);
    assert!(controller.messages().is_empty());
}

#[tokio::test]
async fn attached_mailbox_resolves_account_id_via_me() {
    let server = MockServer::start_async().await;
    mock_token(&server).await;
    mock_empty_inbox(&server).await;
    let me = server
        .mock_async(|when, then| {
            when.method(GET).path("/me");
            then.status(200)
                .json_body(json!({"id": "acc9", "address": "alice@temp.io"}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/accounts/acc9");
            then.status(204);
        })
        .await;

    let mut controller = controller_for(&server);
    controller
        .attach("alice@temp.io", "s3cret-pass")
        .await
        .unwrap();
    assert_eq!(controller.state(), SessionState::Polling);

    controller.teardown().await.unwrap();
    me.assert_async().await;
    delete.assert_async().await;
}

#[tokio::test]
async fn attach_with_wrong_password_reports_the_rejection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/token");
            then.status(401)
                .json_body(json!({"code": 401, "message": "Invalid credentials."}));
        })
        .await;

    let mut controller = controller_for(&server);
    let err = controller
        .attach("alice@temp.io", "wrong")
        .await
        .unwrap_err();
    match err {
        Error::Auth(detail) => assert_eq!(detail, "Invalid credentials."),
        other => panic!("expected Auth error, got {other:?}"),
    }
    assert_eq!(controller.state(), SessionState::Stopped);
    assert_eq!(controller.address(), None);
}

#[tokio::test]
async fn teardown_without_a_mailbox_is_an_error() {
    let server = MockServer::start_async().await;
    let mut controller = controller_for(&server);
    let err = controller.teardown().await.unwrap_err();
    assert!(matches!(err, Error::NoMailbox));
}

#[tokio::test]
async fn failed_deletion_still_discards_local_state() {
    let server = MockServer::start_async().await;
    mock_domains(&server).await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/accounts");
            then.status(201)
                .json_body(json!({"id": "acc1", "address": "alice@temp.io"}));
        })
        .await;
    mock_token(&server).await;
    mock_empty_inbox(&server).await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/accounts/acc1");
            then.status(404).json_body(json!({"detail": "Not Found"}));
        })
        .await;

    let mut controller = controller_for(&server);
    controller.start(UsernamePolicy::Random).await.unwrap();

    let err = controller.teardown().await.unwrap_err();
    assert!(matches!(err, Error::Status { status, .. } if status.as_u16() == 404));
    assert_eq!(controller.address(), None);
    assert_eq!(controller.state(), SessionState::Stopped);
}
