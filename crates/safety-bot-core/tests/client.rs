use std::time::Duration;

use pretty_assertions::assert_eq;
use safety_bot_core::{BotBackend, ClientError, ClientSettings, SafetyBotClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> SafetyBotClient {
    SafetyBotClient::new(&format!("{}/api", server.uri())).expect("client")
}

#[tokio::test]
async fn health_reports_connected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "connected",
            "message": "Safety Bot API is running",
            "timestamp": "2026-10-16T09:00:00"
        })))
        .mount(&server)
        .await;

    let report = client_for(&server).health().await.expect("health ok");
    assert!(report.is_connected());
    assert_eq!(report.message.as_deref(), Some("Safety Bot API is running"));
}

#[tokio::test]
async fn health_fails_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"status": "error", "message": "boom"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).health().await.unwrap_err();
    assert_eq!(err, ClientError::HttpStatus(500));
}

#[tokio::test]
async fn health_rejects_malformed_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server).health().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)), "unexpected error: {err:?}");
}

#[tokio::test]
async fn chat_posts_query_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"query": "What is PPE?"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "response": "Personal Protective Equipment",
            "mode": "demo"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server).chat("What is PPE?").await.expect("chat ok");
    assert_eq!(reply.answer(), Some("Personal Protective Equipment"));
    assert_eq!(reply.mode.as_deref(), Some("demo"));
}

#[tokio::test]
async fn chat_fails_on_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"status": "error", "message": "Query cannot be empty"})),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).chat("x").await.unwrap_err();
    assert_eq!(err, ClientError::HttpStatus(400));
}

#[tokio::test]
async fn chat_times_out_on_stalled_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({"response": "late"})),
        )
        .mount(&server)
        .await;

    let settings = ClientSettings {
        request_timeout: Duration::from_millis(50),
        ..ClientSettings::default()
    };
    let client =
        SafetyBotClient::with_settings(&format!("{}/api", server.uri()), settings).unwrap();

    let err = client.chat("slow").await.unwrap_err();
    assert_eq!(err, ClientError::Timeout);
}

#[tokio::test]
async fn info_lists_capabilities() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Oil & Gas Plant Safety Bot",
            "version": "1.0.0",
            "description": "Educational chatbot for oil & gas",
            "capabilities": ["Safety procedures"],
            "limitations": ["Educational only"]
        })))
        .mount(&server)
        .await;

    let info = client_for(&server).info().await.expect("info ok");
    assert_eq!(info.name, "Oil & Gas Plant Safety Bot");
    assert_eq!(info.capabilities, vec!["Safety procedures".to_string()]);
    assert_eq!(info.limitations, vec!["Educational only".to_string()]);
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    // Nothing listens on the discard port.
    let client = SafetyBotClient::new("http://127.0.0.1:9/api").unwrap();
    let err = client.chat("hello").await.unwrap_err();
    assert!(matches!(err, ClientError::Network(_)), "unexpected error: {err:?}");
}
