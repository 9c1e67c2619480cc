// Location: farm-bridge/src/constants.rs
// Purpose: Shared protocol constants between the control server, its observers and the game peer
// Why: Single source of truth for service names and message types

// =============================================================================
// Remote Peer Services
// =============================================================================

/// Item service on the game peer (inventory and selling)
pub const ITEM_SERVICE: &str = "gamepb.itempb.ItemService";

/// Inventory (bag) query method
pub const METHOD_BAG: &str = "Bag";

/// Sell method, takes a batch of inventory entries
pub const METHOD_SELL: &str = "Sell";

// =============================================================================
// Observer Control Messages
// =============================================================================

/// Heartbeat request from an observer
pub const MSG_TYPE_PING: &str = "ping";

/// Heartbeat acknowledgment sent back to an observer
pub const MSG_TYPE_PONG: &str = "pong";

// =============================================================================
// Inventory Defaults
// =============================================================================

/// Lowest item id treated as a fruit (legacy 3xxx ids)
pub const FRUIT_ID_MIN: i64 = 3001;

/// Highest item id treated as a fruit (current 4xxxx ids)
pub const FRUIT_ID_MAX: i64 = 49999;

/// Maximum entries per Sell request.
/// The peer answers larger requests with a parameter error (1000020).
pub const SELL_BATCH_SIZE: usize = 15;
