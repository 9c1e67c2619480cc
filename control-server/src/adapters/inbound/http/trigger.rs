//! Restart trigger endpoint

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::domain::models::{DispatchOutcome, TriggerOutcome};
use crate::domain::services::redact;

#[derive(Debug, Default, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub success: bool,
    pub message: String,
    /// Redacted payload
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounced: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    #[serde(flatten)]
    pub outcome: Option<DispatchOutcome>,
}

/// GET /restart?code=...
pub async fn trigger_get(
    State(state): State<AppState>,
    query: Result<Query<TriggerRequest>, QueryRejection>,
) -> ApiResult<Json<TriggerResponse>> {
    let Query(request) = query.map_err(|e| ApiError::validation_error(e.body_text()))?;
    run_trigger(&state, request).await
}

/// POST /restart with `{"code": "..."}`
pub async fn trigger_post(
    State(state): State<AppState>,
    body: Result<Json<TriggerRequest>, JsonRejection>,
) -> ApiResult<Json<TriggerResponse>> {
    let Json(request) = body.map_err(|e| ApiError::validation_error(e.body_text()))?;
    run_trigger(&state, request).await
}

async fn run_trigger(state: &AppState, request: TriggerRequest) -> ApiResult<Json<TriggerResponse>> {
    let started = Instant::now();
    let code = request.code.unwrap_or_default();

    let response = match state.trigger.handle(&code).await? {
        TriggerOutcome::Debounced => TriggerResponse {
            success: true,
            message: "Request debounced (duplicate)".to_string(),
            code: redact(&code),
            debounced: Some(true),
            elapsed_ms: None,
            outcome: None,
        },
        TriggerOutcome::Dispatched(outcome) => TriggerResponse {
            success: true,
            message: "Restart initiated".to_string(),
            code: redact(&code),
            debounced: None,
            elapsed_ms: Some(started.elapsed().as_millis() as u64),
            outcome: Some(outcome),
        },
    };

    Ok(Json(response))
}
