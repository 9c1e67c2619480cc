//! Publish endpoint for agent sub-states

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::application::state_aggregator::USER_SECTION;
use crate::domain::models::Identity;

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub success: bool,
    pub section: String,
}

fn ensure_known(state: &AppState, section: &str) -> ApiResult<()> {
    if state.state_sections.iter().any(|known| known == section) {
        Ok(())
    } else {
        Err(ApiError::not_found(format!("/api/state/{}", section)))
    }
}

/// PUT /api/state/:section
pub async fn publish_state(
    State(state): State<AppState>,
    Path(section): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<StateResponse>> {
    ensure_known(&state, &section)?;
    let Json(value) = body.map_err(|e| ApiError::validation_error(e.body_text()))?;

    if section == USER_SECTION {
        serde_json::from_value::<Identity>(value.clone())
            .map_err(|e| ApiError::validation_error(format!("Invalid user state: {}", e)))?;
    }

    state.state_board.publish(&section, value);
    tracing::debug!(section = %section, "State section published");

    Ok(Json(StateResponse {
        success: true,
        section,
    }))
}

/// DELETE /api/state/:section
pub async fn clear_state(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> ApiResult<Json<StateResponse>> {
    ensure_known(&state, &section)?;

    if state.state_board.clear(&section) {
        tracing::debug!(section = %section, "State section cleared");
    }

    Ok(Json(StateResponse {
        success: true,
        section,
    }))
}
