//! HTTP surface of the control server
//!
//! Trigger endpoint, observer WebSocket, state publishing and warehouse
//! endpoints. Every response goes through the CORS and tracing layers.

mod error;
mod state;
mod trigger;
mod warehouse;
mod websocket;

#[cfg(test)]
mod tests;

pub use error::{ApiError, ApiResult};
pub use state::StateResponse;
pub use trigger::{TriggerRequest, TriggerResponse};
pub use warehouse::SellResponse;

use axum::{
    http::{header, Method, Uri},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

use crate::adapters::infrastructure::StateBoard;
use crate::application::{BroadcastHub, Liquidator, TriggerService};

#[derive(Clone)]
pub struct AppState {
    pub trigger: Arc<TriggerService>,
    pub hub: Arc<BroadcastHub>,
    pub liquidator: Arc<Liquidator>,
    pub state_board: Arc<StateBoard>,
    /// Sections accepted by the state endpoint
    pub state_sections: Arc<Vec<String>>,
    /// Per-observer outbound queue capacity
    pub outbound_buffer: usize,
}

async fn not_found(uri: Uri) -> ApiError {
    tracing::debug!(path = %uri.path(), "No route for request");
    ApiError::not_found(uri.path())
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Create HTTP tracing layer for request/response logging
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(tracing::Level::INFO))
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
                "HTTP request started"
            );
        })
        .on_response(
            DefaultOnResponse::new()
                .level(tracing::Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        );

    Router::new()
        .route(
            "/restart",
            get(trigger::trigger_get)
                .post(trigger::trigger_post)
                .fallback(|| async { ApiError::method_not_allowed(&["GET", "POST", "OPTIONS"]) }),
        )
        .route(
            "/ws",
            get(websocket::websocket_handler)
                .fallback(|| async { ApiError::method_not_allowed(&["GET"]) }),
        )
        .route(
            "/api/state/:section",
            put(state::publish_state)
                .delete(state::clear_state)
                .fallback(|| async { ApiError::method_not_allowed(&["PUT", "DELETE"]) }),
        )
        .route(
            "/api/warehouse",
            get(warehouse::get_warehouse)
                .fallback(|| async { ApiError::method_not_allowed(&["GET"]) }),
        )
        .route(
            "/api/warehouse/sell",
            post(warehouse::sell_now)
                .fallback(|| async { ApiError::method_not_allowed(&["POST"]) }),
        )
        .fallback(not_found)
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
