//! Integration tests for `LinkedinClient` using wiremock HTTP mocks.

use postpilot_core::LinkedinConfig;
use postpilot_linkedin::{LinkedinClient, LinkedinError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config() -> LinkedinConfig {
    LinkedinConfig {
        access_token: Some("test-token".to_string()),
        author_urn: Some("urn:li:person:42".to_string()),
        base_url: "http://unused.invalid".to_string(),
        request_timeout_secs: 5,
    }
}

fn test_client(base_url: &str) -> LinkedinClient {
    LinkedinClient::with_base_url(&test_config(), base_url).expect("client construction")
}

#[tokio::test]
async fn share_post_returns_platform_id_from_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(serde_json::json!({
            "author": "urn:li:person:42",
            "lifecycleState": "PUBLISHED"
        })))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(serde_json::json!({"id": "urn:li:share:9001"})),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let id = client
        .share_post("Big news today", &["ai".to_string()])
        .await
        .expect("share should succeed");

    assert_eq!(id, "urn:li:share:9001");
}

#[tokio::test]
async fn share_post_falls_back_to_restli_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("x-restli-id", "urn:li:share:7")
                .set_body_string(""),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let id = client.share_post("Post body", &[]).await.expect("share");
    assert_eq!(id, "urn:li:share:7");
}

#[tokio::test]
async fn api_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v2/ugcPosts"))
        .respond_with(ResponseTemplate::new(401).set_body_string("expired token"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let err = client.share_post("Post body", &[]).await.unwrap_err();

    match err {
        LinkedinError::Api { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("expired token"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}
