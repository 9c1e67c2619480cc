use axum::{extract::State, Json};
use serde::Serialize;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::domain::models::{CycleOutcome, WarehouseView};

#[derive(Debug, Serialize)]
pub struct SellResponse {
    pub success: bool,
    #[serde(flatten)]
    pub outcome: CycleOutcome,
}

/// GET /api/warehouse
pub async fn get_warehouse(State(state): State<AppState>) -> Json<WarehouseView> {
    Json(state.liquidator.view())
}

/// POST /api/warehouse/sell
pub async fn sell_now(State(state): State<AppState>) -> ApiResult<Json<SellResponse>> {
    match state.liquidator.run_cycle().await {
        Ok(CycleOutcome::Skipped) => Err(ApiError::conflict("Sell cycle already in progress")),
        Ok(outcome) => Ok(Json(SellResponse {
            success: true,
            outcome,
        })),
        Err(e) => {
            tracing::warn!("Manual sell cycle failed: {}", e);
            Err(ApiError::bad_gateway(e.to_string()))
        }
    }
}
