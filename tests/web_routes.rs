//! Integration tests for the page shell and API routes.
//!
//! Each test serves the router on an ephemeral port and talks to it over HTTP.

use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use battle_web::config::Settings;
use battle_web::web::{routes, WebState};

/// Serve the app and return its base URL.
async fn start_test_server(settings: Settings) -> String {
    let state = WebState::new(settings).unwrap();
    let app = routes::build_routes(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    format!("http://{addr}")
}

fn settings_with_endpoint(server: &MockServer) -> Settings {
    let mut settings = Settings::default();
    settings.app_config.endpoint = Some(Url::parse(&format!("{}/config", server.uri())).unwrap());
    settings
}

#[tokio::test]
async fn page_uses_defaults_without_endpoint() {
    let base = start_test_server(Settings::default()).await;

    let html = reqwest::get(&base).await.unwrap().text().await.unwrap();

    assert!(html.contains("<title>LiveKit Voice Agent</title>"));
    assert!(html.contains("<meta name=\"description\" content=\"A voice agent built with LiveKit\">"));
    assert!(!html.contains("<style>"));
    assert!(html.contains("Complimentary Battle Mode"));
    assert!(html.contains("0 / 20 words"));
    assert!(html.contains("Start call"));
}

#[tokio::test]
async fn dev_mode_always_emits_theme() {
    let mut settings = Settings::default();
    settings.dev_mode = true;
    let base = start_test_server(settings).await;

    let html = reqwest::get(&base).await.unwrap().text().await.unwrap();

    assert!(html.contains(":root { --primary: #002cf2;"));
    assert!(html.contains(".dark { --primary: #1fd5f9;"));
}

#[tokio::test]
async fn page_applies_remote_config_per_request() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("X-Sandbox-ID", "sbx-42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accent": {"type": "string", "value": "#ff0000"},
            "pageTitle": {"type": "string", "value": "Compliment Battle"}
        })))
        .expect(2)
        .mount(&remote)
        .await;

    let base = start_test_server(settings_with_endpoint(&remote)).await;
    let client = reqwest::Client::new();

    for _ in 0..2 {
        let html = client
            .get(&base)
            .header("X-Sandbox-ID", "sbx-42")
            .send()
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert!(html.contains("<title>Compliment Battle</title>"));
        assert!(html.contains(
            "<style>:root { --primary: #ff0000; --primary-hover: color-mix(in srgb, #ff0000 80%, #000); }</style>"
        ));
    }
}

#[tokio::test]
async fn config_endpoint_reports_resolved_config() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "supportsVideoInput": {"type": "boolean", "value": false},
            "accent": {"type": "number", "value": 1}
        })))
        .mount(&remote)
        .await;

    let base = start_test_server(settings_with_endpoint(&remote)).await;

    let config: serde_json::Value = reqwest::Client::new()
        .get(format!("{base}/api/config"))
        .header("X-Sandbox-ID", "sbx-7")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(config["sandboxId"], "sbx-7");
    assert_eq!(config["supportsVideoInput"], false);
    assert_eq!(config["accent"], "#002cf2");
    assert!(config.get("agentName").is_none());
}

#[tokio::test]
async fn missing_header_serves_defaults() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&remote)
        .await;

    let base = start_test_server(settings_with_endpoint(&remote)).await;

    let config: serde_json::Value = reqwest::get(format!("{base}/api/config"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(config.get("sandboxId").is_none());
    assert_eq!(config["pageTitle"], "LiveKit Voice Agent");
}

#[tokio::test]
async fn health_skips_config_resolution() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&remote)
        .await;

    let base = start_test_server(settings_with_endpoint(&remote)).await;

    let health: serde_json::Value = reqwest::Client::new()
        .get(format!("{base}/api/health"))
        .header("X-Sandbox-ID", "sbx")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(health["status"], "ok");
    assert!(health["uptime"].is_u64());
}
