use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::sync::Arc;

use crate::state::AppState;

/// Serve `index.html` from the frontend directory.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    let path = state.frontend_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "frontend not available");
            (StatusCode::NOT_FOUND, "Frontend not found").into_response()
        }
    }
}
