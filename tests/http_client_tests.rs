//! Integration tests for the HTTP client functionality.
//!
//! These tests verify header injection, body handling, and the retry
//! behavior against a local mock server.

use serde_json::json;
use tigergraph::clients::{DataType, HttpClient, HttpError, HttpMethod, HttpRequest};
use tigergraph::{Credentials, Password};
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_client(server: &MockServer) -> HttpClient {
    let credentials = Credentials::Token("secret-token".to_string());
    HttpClient::new(server.uri(), Some(&credentials), None).unwrap()
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_get_sends_default_headers_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/query/Social/friends"))
        .and(query_param("p", "p1"))
        .and(header("Authorization", "Bearer secret-token"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": false})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let request = HttpRequest::builder(HttpMethod::Get, "/query/Social/friends")
        .query_param("p", "p1")
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();

    assert_eq!(response.code, 200);
    assert!(!response.has_error_flag());
}

#[tokio::test]
async fn test_post_text_body_sets_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/gsqlserver/interpreted_query"))
        .and(header("Content-Type", "text/plain"))
        .and(body_string("INTERPRET QUERY () { PRINT 1; }"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let request = HttpRequest::builder(HttpMethod::Post, "gsqlserver/interpreted_query")
        .body("INTERPRET QUERY () { PRINT 1; }")
        .body_type(DataType::Text)
        .build()
        .unwrap();

    assert!(client.request(request).await.is_ok());
}

#[tokio::test]
async fn test_extra_headers_override_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echo"))
        .and(header("Accept", "text/plain"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let request = HttpRequest::builder(HttpMethod::Get, "echo")
        .header("Accept", "text/plain")
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();

    assert_eq!(response.body, json!({}));
}

#[tokio::test]
async fn test_non_json_body_is_kept_as_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain words"))
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let request = HttpRequest::builder(HttpMethod::Get, "echo").build().unwrap();

    let response = client.request(request).await.unwrap();

    assert_eq!(response.body["raw_body"], "plain words");
}

// ============================================================================
// Retries
// ============================================================================

#[tokio::test]
async fn test_rate_limit_honors_retry_after_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echo"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let request = HttpRequest::builder(HttpMethod::Get, "echo")
        .tries(2)
        .build()
        .unwrap();

    let response = client.request(request).await.unwrap();

    assert_eq!(response.message(), Some("ok"));
}

#[tokio::test]
async fn test_exhausted_retries_report_try_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echo"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("Retry-After", "0")
                .set_body_json(json!({"error": true, "message": "slow down"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let request = HttpRequest::builder(HttpMethod::Get, "echo")
        .tries(2)
        .build()
        .unwrap();

    match client.request(request).await {
        Err(HttpError::MaxRetries(e)) => {
            assert_eq!(e.code, 429);
            assert_eq!(e.tries, 2);
            assert_eq!(e.message, "slow down");
        }
        other => panic!("Expected MaxRetries, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_single_try_reports_plain_response_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echo"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
        .expect(1)
        .mount(&server)
        .await;

    let client = create_test_client(&server);
    let request = HttpRequest::builder(HttpMethod::Get, "echo").build().unwrap();

    match client.request(request).await {
        Err(HttpError::Response(e)) => {
            assert_eq!(e.code, 500);
            assert_eq!(e.message, "internal");
        }
        other => panic!("Expected Response error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_basic_credentials_render_basic_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/echo"))
        .and(header("Authorization", "Basic dTpw"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = Credentials::Basic {
        username: "u".to_string(),
        password: Password::new("p"),
    };
    let client = HttpClient::new(server.uri(), Some(&credentials), None).unwrap();
    let request = HttpRequest::builder(HttpMethod::Get, "echo").build().unwrap();

    assert!(client.request(request).await.is_ok());
}
