use axum::Json;
use axum::extract::{Multipart, State};
use std::sync::Arc;

use plagcheck_core::{CheckError, RephraseReport};

use crate::error::ApiError;
use crate::state::AppState;
use crate::upload::parse_rephrase_form;

pub async fn rephrase(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<RephraseReport>, ApiError> {
    let text = parse_rephrase_form(multipart)
        .await
        .map_err(ApiError::BadRequest)?
        .filter(|t| !t.trim().is_empty())
        .ok_or(CheckError::NoRephraseText)?;

    let orchestrator = state.orchestrator()?;
    let report = orchestrator
        .rephrase_and_check(text, &state.shutdown)
        .await?;
    Ok(Json(report))
}
