pub mod debouncer;
pub mod eligibility;
pub mod redaction;

pub use debouncer::TriggerDebouncer;
pub use eligibility::{partition, select_eligible};
pub use redaction::redact;
