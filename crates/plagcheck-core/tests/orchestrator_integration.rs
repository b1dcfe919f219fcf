//! End-to-end tests for the [`Orchestrator`] over real HTTP.
//!
//! A throwaway axum server on 127.0.0.1 stands in for the remote services and
//! for an OpenAI-compatible chat endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use plagcheck_core::config_file::parse_config;
use plagcheck_core::{
    CheckError, HttpCaller, LlmSettings, OpenAiChat, Orchestrator, ServiceConfig, ServiceType,
    Settings,
};

async fn start_services() -> String {
    let app = Router::new()
        .route(
            "/plagiarism",
            post(|Json(body): Json<Value>| async move {
                let words = body["text"].as_str().unwrap_or("").split_whitespace().count();
                Json(json!({ "plagiarism_percent": 4, "words": words }))
            }),
        )
        .route(
            "/detector",
            post(|| async { Json(json!({ "ai_probability": 0.12 })) }),
        )
        .route(
            "/broken",
            post(|| async { StatusCode::BAD_GATEWAY.into_response() }),
        )
        .route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({}))
            }),
        )
        .route(
            "/rephraser",
            post(|Json(body): Json<Value>| async move {
                let text = body["text"].as_str().unwrap_or("").to_uppercase();
                Json(json!({ "rephrased_text": text }))
            }),
        )
        .route(
            "/llm/chat/completions",
            post(|| async {
                Json(json!({ "choices": [{ "message": { "content": "Mostly original." } }] }))
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn orchestrator(settings: Settings) -> Orchestrator {
    let client = reqwest::Client::new();
    Orchestrator::new(
        Arc::new(settings),
        Arc::new(HttpCaller::new(client.clone())),
        Arc::new(OpenAiChat::new(client)),
    )
}

fn svc(name: &str, ty: ServiceType, url: String) -> ServiceConfig {
    ServiceConfig::new(name, ty, url, "secret")
}

#[tokio::test]
async fn check_over_http_with_mixed_outcomes() {
    let base = start_services().await;
    let settings = Settings {
        plagiarism: vec![
            svc("Checker", ServiceType::Plagiarism, format!("{base}/plagiarism")),
            svc("Broken", ServiceType::Plagiarism, format!("{base}/broken")),
            svc("Slow", ServiceType::Plagiarism, format!("{base}/slow")),
        ],
        ai_detection: vec![svc("Detector", ServiceType::AiDetection, format!("{base}/detector"))],
        request_timeout: Duration::from_millis(300),
        ..Settings::default()
    };

    let report = orchestrator(settings)
        .check("three little words".into(), &CancellationToken::new())
        .await
        .unwrap();

    let p = &report.plagiarism_results;
    assert_eq!(p.len(), 3);
    assert_eq!(p[0].payload()["words"], json!(3));
    assert_eq!(p[1].error(), Some("HTTP error: 502"));
    assert_eq!(p[2].error(), Some("Request timed out"));
    assert!(report.ai_detection_results[0].is_success());

    // No LLM credential: the deterministic template is used.
    assert!(report.summary.starts_with("## Analysis Summary\n\n### Plagiarism Check\n"));
    assert!(report.summary.contains("- **Checker**: Check completed\n"));
    assert!(report.summary.contains("- **Detector**: Detection completed\n"));
}

#[tokio::test]
async fn rephrase_then_check_over_http() {
    let base = start_services().await;
    let settings = Settings {
        rephrasing: vec![
            svc("Down", ServiceType::Rephrasing, format!("{base}/broken")),
            svc("Upper", ServiceType::Rephrasing, format!("{base}/rephraser")),
        ],
        plagiarism: vec![svc("Checker", ServiceType::Plagiarism, format!("{base}/plagiarism"))],
        llm: LlmSettings {
            api_key: "sk-test".into(),
            model: "gpt-test".into(),
            base_url: format!("{base}/llm"),
        },
        ..Settings::default()
    };

    let report = orchestrator(settings)
        .rephrase_and_check("make it loud".into(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.original_text, "make it loud");
    assert_eq!(report.rephrased_text, "MAKE IT LOUD");
    assert_eq!(report.summary, "Mostly original.");
    assert!(report.ai_detection_results.is_empty());

    let wire = serde_json::to_value(&report).unwrap();
    assert_eq!(wire["plagiarism_results"][0]["result"]["words"], json!(3));
    assert!(wire.get("rephrase_attempts").is_none());
}

#[tokio::test]
async fn configured_llm_rephraser_uses_chat_endpoint() {
    let base = start_services().await;
    let config = format!(
        r#"
[llm]
api_key = "${{KEY}}"
base_url = "{base}/llm"

[[services.rephrasing]]
name = "House editor"
api_url = "internal-llm"
enabled = true
"#
    );
    let lookup = |name: &str| (name == "KEY").then(|| "sk-from-env".to_string());
    let settings = parse_config(&config, &lookup)
        .unwrap()
        .into_settings_with(&lookup);

    let report = orchestrator(settings)
        .rephrase_and_check("original".into(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.rephrased_text, "Mostly original.");
    assert_eq!(report.rephrase_attempts.len(), 1);
    assert_eq!(report.rephrase_attempts[0].service_name(), "House editor");
}

#[tokio::test]
async fn exhausted_rephrasers_abort_the_flow() {
    let base = start_services().await;
    let settings = Settings {
        rephrasing: vec![svc("Down", ServiceType::Rephrasing, format!("{base}/broken"))],
        plagiarism: vec![svc("Checker", ServiceType::Plagiarism, format!("{base}/plagiarism"))],
        ..Settings::default()
    };

    let err = orchestrator(settings)
        .rephrase_and_check("text".into(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckError::Rephrase(_)));
    assert_eq!(err.to_string(), "Rephrasing failed: HTTP error: 502");
}
