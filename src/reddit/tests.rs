//! Tests for the Reddit client against a stubbed Reddit API.

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{RedditClient, RedditEndpoints, UploadLease};
use crate::error::GatewayError;
use crate::oauth::{Credentials, Token};

fn test_credentials() -> Credentials {
    Credentials::new("id", "secret", "user", "pass", Some("redpost-tests/1.0"))
}

fn test_client(server: &MockServer) -> RedditClient {
    RedditClient::with_endpoints(
        test_credentials(),
        RedditEndpoints {
            token_url: format!("{}/api/v1/access_token", server.uri()),
            api_base: server.uri(),
            upload_scheme: "http:".to_string(),
        },
    )
}

/// Protocol-relative upload action pointing at the stub server.
fn upload_action(server: &MockServer, path: &str) -> String {
    format!("{}{}", server.uri().trim_start_matches("http:"), path)
}

async fn mount_token(server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .and(header("authorization", "Basic aWQ6c2VjcmV0"))
        .and(header("user-agent", "redpost-tests/1.0"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "bearer",
            "expires_in": 86400,
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn submit_success() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "json": {
            "errors": [],
            "data": {
                "id": "abc",
                "name": "t3_abc",
                "permalink": "/r/test/abc",
                "url": "https://reddit.com/r/test/abc"
            }
        }
    }))
}

async fn mount_lease(server: &MockServer, action: &str) {
    Mock::given(method("POST"))
        .and(path("/api/media/asset"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "args": {
                "action": action,
                "fields": [{"name": "a", "value": "1"}, {"name": "key", "value": "uploads/x"}]
            },
            "asset": {"asset_id": "xyz"}
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_authenticate_stores_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    let client = test_client(&server);

    assert!(!client.tokens().is_authenticated().await);
    assert!(client.authenticate().await);

    let token = client.tokens().current().await.unwrap();
    assert_eq!(token.access_token, "tok");
    assert_eq!(token.token_type, "bearer");

    let headers = client.tokens().headers().await.unwrap();
    assert_eq!(headers["authorization"], "Bearer tok");
    assert_eq!(headers["user-agent"], "redpost-tests/1.0");
}

#[tokio::test]
async fn test_authenticate_defaults_token_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "tok"})))
        .mount(&server)
        .await;
    let client = test_client(&server);

    assert!(client.authenticate().await);
    assert_eq!(client.tokens().current().await.unwrap().token_type, "bearer");
}

#[tokio::test]
async fn test_authenticate_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthorized", "error": 401})))
        .mount(&server)
        .await;
    let client = test_client(&server);

    assert!(!client.authenticate().await);
    assert!(!client.tokens().is_authenticated().await);
}

#[tokio::test]
async fn test_authenticate_failure_keeps_previous_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;
    let client = test_client(&server);
    client.tokens().replace(Token::new("old", "bearer")).await;

    assert!(!client.authenticate().await);
    assert_eq!(client.tokens().current().await.unwrap().access_token, "old");
}

#[tokio::test]
async fn test_headers_require_token() {
    let server = MockServer::start().await;
    let client = test_client(&server);

    assert!(matches!(
        client.tokens().headers().await,
        Err(GatewayError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_post_text_after_authenticate_does_not_reauthenticate() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .and(header("authorization", "Bearer tok"))
        .and(body_string_contains("api_type=json"))
        .and(body_string_contains("kind=self"))
        .and(body_string_contains("sr=test"))
        .and(body_string_contains("title=T"))
        .and(body_string_contains("text=hi"))
        .respond_with(submit_success())
        .expect(1)
        .mount(&server)
        .await;
    let client = test_client(&server);

    assert!(client.authenticate().await);
    let result = client.post_text("test", "T", "hi", None).await;

    assert!(result.success);
    assert_eq!(result.post_id.as_deref(), Some("abc"));
    assert_eq!(result.post_name.as_deref(), Some("t3_abc"));
    assert_eq!(result.permalink.as_deref(), Some("/r/test/abc"));
    assert_eq!(result.error, None);
}

#[tokio::test]
async fn test_post_text_authenticates_lazily() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .respond_with(submit_success())
        .expect(2)
        .mount(&server)
        .await;
    let client = test_client(&server);

    assert!(client.post_text("test", "first", "one", None).await.success);
    assert!(client.post_text("test", "second", "two", None).await.success);
}

#[tokio::test]
async fn test_failed_authentication_aborts_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/access_token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .respond_with(submit_success())
        .expect(0)
        .mount(&server)
        .await;
    let client = test_client(&server);

    let result = client.post_text("test", "T", "hi", None).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("authentication failed"));
}

#[tokio::test]
async fn test_structured_errors_are_failures() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "json": {
                "errors": [["SUBREDDIT_NOEXIST", "that subreddit doesn't exist", "sr"]]
            }
        })))
        .mount(&server)
        .await;
    let client = test_client(&server);

    let result = client.post_text("nosuchsub", "T", "hi", None).await;

    assert!(!result.success);
    assert_eq!(result.post_id, None);
    assert!(result.error.unwrap().contains("SUBREDDIT_NOEXIST"));
}

#[tokio::test]
async fn test_unauthorized_submission_invalidates_token() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    let client = test_client(&server);

    let result = client.post_text("test", "T", "hi", None).await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("401"));
    assert!(!client.tokens().is_authenticated().await);
}

#[tokio::test]
async fn test_unauthorized_lease_invalidates_token() {
    let server = MockServer::start().await;
    mount_token(&server, 2).await;
    Mock::given(method("POST"))
        .and(path("/api/media/asset"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    let client = test_client(&server);
    let media_url = format!("{}/media/cat.jpg", server.uri());

    for _ in 0..2 {
        let result = client.post_media("test", "T", &media_url, None, None).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("401"));
        assert!(!client.tokens().is_authenticated().await);
    }
}

#[tokio::test]
async fn test_post_link_sends_url_and_flair() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .and(body_string_contains("kind=link"))
        .and(body_string_contains("url=https%3A%2F%2Fexample.com"))
        .and(body_string_contains("flair_id=flair1"))
        .respond_with(submit_success())
        .expect(1)
        .mount(&server)
        .await;
    let client = test_client(&server);

    let result = client
        .post_link("test", "T", "https://example.com", None, Some("flair1"))
        .await;

    assert!(result.success);
}

#[tokio::test]
async fn test_upload_media_round_trip() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_lease(&server, &upload_action(&server, "/amazon")).await;
    Mock::given(method("GET"))
        .and(path("/media/cat.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("imagebytes"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/amazon"))
        .and(body_string_contains("name=\"a\""))
        .and(body_string_contains("name=\"key\""))
        .and(body_string_contains("uploads/x"))
        .and(body_string_contains("filename=\"cat.jpg\""))
        .and(body_string_contains("imagebytes"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<PostResponse><Location>https://cdn/x.jpg</Location></PostResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    let client = test_client(&server);

    assert!(client.authenticate().await);
    let location = client
        .upload_media(&format!("{}/media/cat.jpg", server.uri()))
        .await
        .unwrap();

    assert_eq!(location, "https://cdn/x.jpg");
}

#[tokio::test]
async fn test_failed_lease_stops_upload() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/media/asset"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("imagebytes"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .respond_with(submit_success())
        .expect(0)
        .mount(&server)
        .await;
    let client = test_client(&server);

    let result = client
        .post_media("test", "T", &format!("{}/media/cat.jpg", server.uri()), None, None)
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("upload lease failed"));
}

#[tokio::test]
async fn test_lease_without_fields_is_rejected() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/api/media/asset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "args": {"action": "//bucket.s3/amazon", "fields": []}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = test_client(&server);

    assert!(client.authenticate().await);
    let result = client.upload_media("https://example.com/cat.jpg").await;

    assert!(matches!(result, Err(GatewayError::UploadLeaseFailure(_))));
}

#[tokio::test]
async fn test_failed_download_stops_upload() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_lease(&server, &upload_action(&server, "/amazon")).await;
    Mock::given(method("GET"))
        .and(path("/media/cat.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/amazon"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let client = test_client(&server);

    assert!(client.authenticate().await);
    let result = client
        .upload_media(&format!("{}/media/cat.jpg", server.uri()))
        .await;

    assert!(matches!(result, Err(GatewayError::MediaFetchFailure(_))));
}

#[tokio::test]
async fn test_rejected_storage_upload_stops_submission() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_lease(&server, &upload_action(&server, "/amazon")).await;
    Mock::given(method("GET"))
        .and(path("/media/cat.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("imagebytes"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/amazon"))
        .respond_with(ResponseTemplate::new(403).set_body_string("<Error>AccessDenied</Error>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .respond_with(submit_success())
        .expect(0)
        .mount(&server)
        .await;
    let client = test_client(&server);

    let result = client
        .post_media("test", "T", &format!("{}/media/cat.jpg", server.uri()), None, None)
        .await;

    assert!(!result.success);
    let error = result.error.unwrap();
    assert!(error.contains("media upload failed"));
    assert!(error.contains("403"));
}

#[tokio::test]
async fn test_missing_location_fails_media_post() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_lease(&server, &upload_action(&server, "/amazon")).await;
    Mock::given(method("GET"))
        .and(path("/media/cat.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("imagebytes"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/amazon"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<PostResponse></PostResponse>"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .respond_with(submit_success())
        .expect(0)
        .mount(&server)
        .await;
    let client = test_client(&server);

    let result = client
        .post_media("test", "T", &format!("{}/media/cat.jpg", server.uri()), None, None)
        .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("Location"));
}

#[tokio::test]
async fn test_post_media_submits_uploaded_video() {
    let server = MockServer::start().await;
    mount_token(&server, 1).await;
    mount_lease(&server, &upload_action(&server, "/amazon")).await;
    Mock::given(method("GET"))
        .and(path("/media/clip.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_string("videobytes"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/amazon"))
        .and(body_string_contains("filename=\"clip.mp4\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<PostResponse><Location>https://cdn.example/clip.mp4</Location></PostResponse>",
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/submit"))
        .and(body_string_contains("kind=video"))
        .and(body_string_contains("url=https%3A%2F%2Fcdn.example%2Fclip.mp4"))
        .and(body_string_contains("&text="))
        .respond_with(submit_success())
        .expect(1)
        .mount(&server)
        .await;
    let client = test_client(&server);

    let result = client
        .post_media("test", "T", &format!("{}/media/clip.mp4", server.uri()), None, None)
        .await;

    assert!(result.success);
    assert_eq!(result.post_name.as_deref(), Some("t3_abc"));
}

#[test]
fn test_upload_lease_from_response() {
    let lease = UploadLease::from_response(
        r#"{"args": {"action": "//bucket.s3/amazon", "fields": [{"name": "a", "value": "1"}]}}"#,
    )
    .unwrap();

    assert_eq!(lease.action, "//bucket.s3/amazon");
    assert_eq!(lease.fields, vec![("a".to_string(), "1".to_string())]);
    assert!(UploadLease::from_response(r#"{"args": {"fields": [{"name": "a", "value": "1"}]}}"#).is_err());
    assert!(UploadLease::from_response(r#"{"asset": {}}"#).is_err());
}

#[test]
fn test_default_upload_url_uses_https() {
    let endpoints = RedditEndpoints::default();

    assert_eq!(endpoints.upload_url("//bucket.s3/amazon"), "https://bucket.s3/amazon");
    assert_eq!(endpoints.submit_url(), "https://oauth.reddit.com/api/submit");
    assert_eq!(endpoints.media_asset_url(), "https://oauth.reddit.com/api/media/asset");
}
