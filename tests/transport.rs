//! Transport-level behavior: headers, error statuses, connectivity failures.

use httpmock::prelude::*;
use mailtm_client::Transport;
use reqwest::Method;

#[tokio::test]
async fn sets_json_content_type_and_bearer_when_supplied() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/echo")
                .header("authorization", "Bearer tok123")
                .header("content-type", "application/json")
                .body(r#"{"k":"v"}"#);
            then.status(200).body("ok");
        })
        .await;

    let transport = Transport::new(reqwest::Client::new());
    let response = transport
        .send(
            Method::POST,
            &server.url("/echo"),
            Some("tok123"),
            Some(r#"{"k":"v"}"#),
        )
        .await
        .unwrap();
    assert!(response.is_success());
    assert_eq!(response.body, "ok");
    mock.assert_async().await;
}

#[tokio::test]
async fn http_error_statuses_are_normal_responses() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/teapot");
            then.status(418).body("short and stout");
        })
        .await;

    let transport = Transport::new(reqwest::Client::new());
    let response = transport
        .send(Method::GET, &server.url("/teapot"), None, None)
        .await
        .unwrap();
    assert!(!response.is_success());
    assert_eq!(response.status.as_u16(), 418);
    assert_eq!(response.body, "short and stout");
}

#[tokio::test]
async fn connection_failure_is_a_transient_error() {
    let transport = Transport::new(reqwest::Client::new());
    let err = transport
        .send(Method::GET, "http://127.0.0.1:1/unreachable", None, None)
        .await
        .unwrap_err();
    assert!(err.is_transient());
}
