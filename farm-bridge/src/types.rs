// Location: farm-bridge/src/types.rs
// Purpose: Message types exchanged with observers (JSON) and the game peer (MessagePack)
// Why: Centralized type definitions shared by the server and its test harnesses

use serde::{Deserialize, Serialize};

use crate::constants::{MSG_TYPE_PING, MSG_TYPE_PONG};
use crate::errors::BridgeError;

// =============================================================================
// Observer Control Messages
// =============================================================================

/// Control message on the broadcast channel.
///
/// Observers send `{"type":"ping"}`; the server answers with
/// `{"type":"pong","timestamp":<epoch ms>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ControlMessage {
    Ping,
    Pong { timestamp: i64 },
}

/// Loose envelope used for parsing; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct ControlEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    timestamp: Option<i64>,
}

impl ControlMessage {
    /// Parse a raw text frame. Anything that is not a recognised control
    /// message yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let envelope: ControlEnvelope = serde_json::from_str(raw).ok()?;
        match envelope.kind.as_str() {
            MSG_TYPE_PING => Some(Self::Ping),
            MSG_TYPE_PONG => envelope
                .timestamp
                .map(|timestamp| Self::Pong { timestamp }),
            _ => None,
        }
    }

    /// Heartbeat acknowledgment stamped with the current time
    pub fn pong_now() -> Self {
        Self::Pong {
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        Ok(serde_json::to_string(self)?)
    }
}

// =============================================================================
// Inventory Messages (game peer, MessagePack)
// =============================================================================

/// One inventory entry as reported by the peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub count: i64,
    #[serde(default)]
    pub uid: Option<i64>,
}

impl InventoryItem {
    pub fn new(id: i64, count: i64) -> Self {
        Self {
            id,
            count,
            uid: None,
        }
    }
}

/// Inventory query (no parameters)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BagRequest {}

/// Container for inventory entries inside a BagReply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemBag {
    #[serde(default)]
    pub items: Vec<InventoryItem>,
}

/// Inventory reply.
///
/// Current peers put entries under `item_bag.items`; older ones use a
/// top-level `items` list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BagReply {
    #[serde(default)]
    pub item_bag: Option<ItemBag>,
    #[serde(default)]
    pub items: Vec<InventoryItem>,
}

impl BagReply {
    /// Entries from `item_bag` when it is non-empty, otherwise the legacy list
    pub fn into_items(self) -> Vec<InventoryItem> {
        match self.item_bag {
            Some(bag) if !bag.items.is_empty() => bag.items,
            _ => self.items,
        }
    }
}

/// Sell request for one batch of entries
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellRequest {
    pub items: Vec<InventoryItem>,
}

/// Sell reply; `gold` is the proceeds of this batch
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SellReply {
    #[serde(default)]
    pub gold: i64,
}
