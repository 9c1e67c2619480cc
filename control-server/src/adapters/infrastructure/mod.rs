pub mod scheduler;
pub mod state_board;

pub use scheduler::{Scheduler, TaskHandle};
pub use state_board::StateBoard;
