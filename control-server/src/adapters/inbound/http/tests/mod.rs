//! Router tests driven through `tower::ServiceExt::oneshot`

mod state_tests;

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use farm_agent_bridge::{msgpack, BagReply, InventoryItem, ItemBag, SellReply, METHOD_BAG};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use super::{create_router, AppState};
use crate::adapters::infrastructure::StateBoard;
use crate::application::{
    ActionDispatcher, BroadcastHub, Liquidator, LiquidatorSettings, ManagedProcess,
    StateAggregator, TriggerService,
};
use crate::domain::errors::RemoteCallError;
use crate::domain::services::TriggerDebouncer;
use crate::ports::{MockProcessSupervisor, RemoteCall};

/// Peer with a fixed inventory; Sell pays 10 gold per entry or fails with `sell_status`
pub(super) struct StubPeer {
    pub inventory: Vec<InventoryItem>,
    pub sell_status: Option<u16>,
}

#[async_trait]
impl RemoteCall for StubPeer {
    async fn query(
        &self,
        service: &str,
        method: &str,
        request: Vec<u8>,
    ) -> Result<Vec<u8>, RemoteCallError> {
        if method == METHOD_BAG {
            return Ok(msgpack::encode(&BagReply {
                item_bag: Some(ItemBag {
                    items: self.inventory.clone(),
                }),
                items: vec![],
            })
            .unwrap());
        }
        if let Some(status) = self.sell_status {
            return Err(RemoteCallError::Status {
                call: format!("{}.{}", service, method),
                status,
            });
        }
        let sell: farm_agent_bridge::SellRequest = msgpack::decode(&request).unwrap();
        Ok(msgpack::encode(&SellReply {
            gold: 10 * sell.items.len() as i64,
        })
        .unwrap())
    }

    async fn disconnect(&self) {}
}

pub(super) fn test_state_with(supervisor: MockProcessSupervisor, peer: StubPeer) -> AppState {
    let state_board = Arc::new(StateBoard::new());
    let sections: Vec<String> = ["user", "connection", "farm", "friend", "task"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let liquidator = Arc::new(Liquidator::new(
        Arc::new(peer),
        LiquidatorSettings {
            batch_pacing: Duration::ZERO,
            ..LiquidatorSettings::default()
        },
    ));
    let aggregator = StateAggregator::new(
        sections
            .iter()
            .map(|section| state_board.section_provider(section))
            .collect(),
    );

    AppState {
        trigger: Arc::new(TriggerService::new(
            TriggerDebouncer::new(Duration::from_secs(30)),
            ActionDispatcher::new(
                Arc::new(supervisor),
                ManagedProcess {
                    name: "agent".to_string(),
                    script: "client.js".to_string(),
                    arg_flag: "--code".to_string(),
                    cwd: None,
                },
            ),
        )),
        hub: Arc::new(BroadcastHub::new(Arc::new(aggregator))),
        liquidator,
        state_board,
        state_sections: Arc::new(sections),
        outbound_buffer: 4,
    }
}

pub(super) fn test_state(supervisor: MockProcessSupervisor) -> AppState {
    test_state_with(
        supervisor,
        StubPeer {
            inventory: vec![],
            sell_status: None,
        },
    )
}

pub(super) fn router(state: AppState) -> Router {
    create_router(state)
}

pub(super) async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub(super) async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
