//! Notification gate: preference checks, persistence, delivery

pub mod gate;
pub mod types;

pub use gate::NotificationGate;
pub use types::{Notification, NotificationKind, NotificationRequest, Notifier};
