use axum::Json;
use axum::extract::{Multipart, State};
use std::sync::Arc;

use plagcheck_core::CheckReport;

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::parse_check_form;

pub async fn check(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<CheckReport>, ApiError> {
    let input = parse_check_form(multipart)
        .await
        .map_err(ApiError::BadRequest)?;
    let from_file = input.file.is_some();

    let text = input.resolve(state.pdf.clone()).await?;
    tracing::info!(from_file, chars = text.chars().count(), "check request");

    let orchestrator = state.orchestrator()?;
    let report = orchestrator.check(text, &state.shutdown).await?;
    Ok(Json(report))
}
