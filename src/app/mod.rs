//! Application wiring: shared state and intent dispatch

pub mod dispatch;
pub mod state;

pub use dispatch::GameDispatcher;
pub use state::AppState;
