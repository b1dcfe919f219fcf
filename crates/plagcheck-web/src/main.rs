use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod error;
mod handlers;
mod models;
mod state;
mod upload;

use state::AppState;

const DEFAULT_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_FRONTEND_DIR: &str = "frontend";
const BODY_LIMIT_BYTES: usize = 50 * 1024 * 1024;

fn app(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.frontend_dir);

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/health", get(handlers::health::health))
        .route("/check", post(handlers::check::check))
        .route("/rephrase", post(handlers::rephrase::rephrase))
        .nest_service("/static", static_files)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = plagcheck_core::config_file::config_path();
    let frontend_dir = std::env::var("PLAGCHECK_FRONTEND_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_FRONTEND_DIR));

    // Fail fast on a broken config; requests re-read it anyway.
    match plagcheck_core::load_config(&config_path) {
        Ok(config) => {
            let settings = config.into_settings();
            tracing::info!(
                config = %config_path.display(),
                plagiarism = settings.plagiarism.len(),
                ai_detection = settings.ai_detection.len(),
                rephrasing = settings.rephrasing.len(),
                llm = !settings.llm.api_key.is_empty(),
                "configuration loaded"
            );
        }
        Err(e) => tracing::warn!(error = %e, "configuration not usable yet"),
    }

    let state = Arc::new(AppState::new(config_path, frontend_dir));
    let shutdown = state.shutdown.clone();

    let addr: SocketAddr = std::env::var("PLAGCHECK_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()?;
    tracing::info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state))
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "plagcheck-test-boundary";

    // Unreachable base URL so an OPENAI_API_KEY in the environment cannot
    // trigger a real summary call.
    const CONFIG: &str = r#"
[llm]
base_url = "http://127.0.0.1:1"

[dispatch]
timeout_secs = 2
"#;

    struct Harness {
        _dir: tempfile::TempDir,
        state: Arc<AppState>,
    }

    fn harness(config: Option<&str>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("services.toml");
        if let Some(config) = config {
            std::fs::write(&config_path, config).unwrap();
        }
        let frontend = dir.path().join("frontend");
        std::fs::create_dir(&frontend).unwrap();
        std::fs::write(frontend.join("index.html"), "<h1>plagcheck</h1>").unwrap();
        std::fs::write(frontend.join("app.js"), "console.log(1);").unwrap();

        Harness {
            state: Arc::new(AppState::new(config_path, frontend)),
            _dir: dir,
        }
    }

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
        let mut body: Vec<u8> = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(state: Arc<AppState>, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let h = harness(Some(CONFIG));
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(h.state.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json(&body)["status"], "healthy");
    }

    #[tokio::test]
    async fn check_text_with_no_services() {
        let h = harness(Some(CONFIG));
        let request = multipart("/check", &[Part::Text("text", "Hello world")]);
        let (status, body) = send(h.state.clone(), request).await;

        assert_eq!(status, StatusCode::OK);
        let report = json(&body);
        assert_eq!(report["original_text"], "Hello world");
        assert_eq!(report["plagiarism_results"], Value::Array(vec![]));
        assert_eq!(report["ai_detection_results"], Value::Array(vec![]));
        let summary = report["summary"].as_str().unwrap();
        assert!(summary.contains("No plagiarism checkers were enabled"));
        assert!(summary.contains("No AI detectors were enabled"));
    }

    #[tokio::test]
    async fn check_without_input_is_bad_request() {
        let h = harness(Some(CONFIG));
        let request = multipart("/check", &[Part::Text("text", "   ")]);
        let (status, body) = send(h.state.clone(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json(&body)["detail"],
            "No text provided. Please provide text or upload a PDF file."
        );
    }

    #[tokio::test]
    async fn check_rejects_non_pdf_upload() {
        let h = harness(Some(CONFIG));
        let request = multipart(
            "/check",
            &[Part::File("file", "essay.docx", b"PK\x03\x04not a pdf")],
        );
        let (status, body) = send(h.state.clone(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["detail"], "Only PDF files are supported");
    }

    #[tokio::test]
    async fn check_rejects_unreadable_pdf() {
        let h = harness(Some(CONFIG));
        let request = multipart("/check", &[Part::File("file", "essay.pdf", b"not really")]);
        let (status, _) = send(h.state.clone(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn check_extracts_uploaded_pdf() {
        let h = harness(Some(CONFIG));
        let pdf = plagcheck_pdf::sample_pdf(&["FirstPage", "SecondPage"]).unwrap();
        let request = multipart(
            "/check",
            &[
                Part::Text("text", "ignored when a file is sent"),
                Part::File("file", "essay.pdf", &pdf),
            ],
        );
        let (status, body) = send(h.state.clone(), request).await;

        assert_eq!(status, StatusCode::OK);
        let report = json(&body);
        let text = report["original_text"].as_str().unwrap();
        assert!(text.contains("FirstPage\n\nSecondPage"), "got {text:?}");
        assert!(!text.contains("ignored"));
    }

    #[tokio::test]
    async fn missing_config_is_server_error() {
        let h = harness(None);
        let request = multipart("/check", &[Part::Text("text", "Hello world")]);
        let (status, body) = send(h.state.clone(), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = json(&body)["detail"].as_str().unwrap().to_string();
        assert!(detail.starts_with("Configuration file not found"));
    }

    #[tokio::test]
    async fn rephrase_with_no_services_is_server_error() {
        let h = harness(Some(CONFIG));
        let request = multipart("/rephrase", &[Part::Text("text", "Hello world")]);
        let (status, body) = send(h.state.clone(), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json(&body)["detail"],
            "Rephrasing failed: no rephrasing services enabled"
        );
    }

    #[tokio::test]
    async fn rephrase_requires_text() {
        let h = harness(Some(CONFIG));
        let request = multipart("/rephrase", &[Part::Text("other", "x")]);
        let (status, body) = send(h.state.clone(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json(&body)["detail"], "No text provided for rephrasing.");
    }

    #[tokio::test]
    async fn serves_frontend_files() {
        let h = harness(Some(CONFIG));

        let request = Request::get("/").body(Body::empty()).unwrap();
        let (status, body) = send(h.state.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"<h1>plagcheck</h1>");

        let request = Request::get("/static/app.js").body(Body::empty()).unwrap();
        let (status, body) = send(h.state.clone(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"console.log(1);");
    }
}
