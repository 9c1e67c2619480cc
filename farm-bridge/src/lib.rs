// Top-level modules
pub mod constants;
pub mod errors;
pub mod msgpack;
pub mod types;


// Re-export message types for use in the control server
pub use types::{
    BagReply, BagRequest, ControlMessage, InventoryItem, ItemBag, SellReply, SellRequest,
};

pub use errors::BridgeError;

// Re-export constants for protocol consistency
pub use constants::{
    FRUIT_ID_MAX, FRUIT_ID_MIN, ITEM_SERVICE, METHOD_BAG, METHOD_SELL, MSG_TYPE_PING,
    MSG_TYPE_PONG, SELL_BATCH_SIZE,
};
