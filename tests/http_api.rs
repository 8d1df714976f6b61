//! HTTP API tests against a server bound to an ephemeral port

mod common;

use common::*;
use geochat::config::Config;
use geochat::session::SessionClient;
use geochat::transport::{router, AppState};
use serde_json::{json, Value};
use std::sync::Arc;

async fn spawn_server(session: SessionClient) -> String {
    let state = Arc::new(AppState::new(Arc::new(session)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn scripted_server(responses: Vec<geochat::llm::LlmResponse>) -> String {
    let session = SessionClient::new(Config::default()).with_llm(ScriptedLlm::new(responses));
    session.attach_tools(analysis_tools()).await.unwrap();
    spawn_server(session).await
}

#[tokio::test]
async fn test_index_serves_chat_page() {
    let base = spawn_server(SessionClient::new(Config::default())).await;
    let body = reqwest::get(format!("{}/", base))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Territory Analysis Report"));
    assert!(body.contains("/api/chat"));
}

#[tokio::test]
async fn test_health_and_initial_state() {
    let base = spawn_server(SessionClient::new(Config::default())).await;

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");

    let state: Value = reqwest::get(format!("{}/api/state", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["connected"], false);
    assert_eq!(state["report"]["state"], "empty");
    assert!(state["report_html"]
        .as_str()
        .unwrap()
        .contains("No Report Available"));
    assert_eq!(state["conversation"], json!([]));
    assert_eq!(state["layout"]["chat_width"], 4);
}

#[tokio::test]
async fn test_chat_round_trip_loads_report() {
    let base = scripted_server(jeddah_script()).await;
    let client = reqwest::Client::new();

    let body: Value = client
        .post(format!("{}/api/chat", base))
        .json(&json!({"message": "Create 6 sales territories for restaurants in Jeddah"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["accepted"], true);
    assert_eq!(body["connected"], true);
    assert_eq!(body["conversation"][0]["label"], "Agent");
    assert_eq!(body["conversation"][1]["label"], "Me");
    assert_eq!(body["report"]["state"], "loaded");
    assert!(body["report_html"].as_str().unwrap().contains("<table>"));
    assert!(body["status_html"]
        .as_str()
        .unwrap()
        .contains("jeddah_restaurants.md"));
    assert_eq!(body["turns"], 2);
}

#[tokio::test]
async fn test_blank_chat_is_not_accepted() {
    let base = scripted_server(vec![]).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .json(&json!({"message": "   "}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["accepted"], false);
    assert_eq!(body["conversation"], json!([]));
}

#[tokio::test]
async fn test_oversized_message_is_rejected() {
    let base = scripted_server(vec![]).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .json(&json!({"message": "x".repeat(10_001)}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_layout_toggle() {
    let base = spawn_server(SessionClient::new(Config::default())).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/layout/toggle", base);

    let collapsed: Value = client.post(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(collapsed["report_width"], 12);
    assert_eq!(collapsed["chat_width"], 0);
    assert_eq!(collapsed["button_label"], "+");

    let expanded: Value = client.post(&url).send().await.unwrap().json().await.unwrap();
    assert_eq!(expanded["report_width"], 8);
    assert_eq!(expanded["chat_width"], 4);
}

#[tokio::test]
async fn test_examples_and_tools() {
    let base = scripted_server(vec![]).await;

    let examples: Value = reqwest::get(format!("{}/api/examples", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(examples["example_queries"].as_array().unwrap().len(), 6);
    assert_eq!(examples["default_num_territories"], 6);

    let tools: Value = reqwest::get(format!("{}/api/tools", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tools["connected"], true);
    assert!(tools["tools"]
        .as_array()
        .unwrap()
        .iter()
        .any(|t| t == "optimize_sales_territories"));
}
