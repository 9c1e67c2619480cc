pub mod inventory;
pub mod process;
pub mod snapshot;
pub mod trigger;

// Re-export specific items for easier access
pub use inventory::*;
pub use process::*;
pub use snapshot::*;
pub use trigger::*;
