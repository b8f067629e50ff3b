//! Persistence collaborators: preferences, notifications, game results
//!
//! Each store is an object-safe trait so the gate and the app state can hold
//! either the Supabase-backed implementation or the in-memory one.

pub mod game_results;
pub mod memory;
pub mod notifications;
pub mod preferences;
pub mod supabase;

use futures::future::BoxFuture;

pub use game_results::{GameResult, SupabaseGameResultStore};
pub use memory::MemoryStore;
pub use notifications::SupabaseNotificationStore;
pub use preferences::{SupabasePreferenceStore, UserPreferences};
pub use supabase::{SupabaseClient, SupabaseError};

use crate::notify::Notification;

/// Store failures
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Supabase(#[from] SupabaseError),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Per-user notification preferences
pub trait PreferenceStore: Send + Sync {
    /// `None` when the user has no stored preferences
    fn get_by_user_id(&self, user_id: i64)
        -> BoxFuture<'_, Result<Option<UserPreferences>, StoreError>>;
}

/// Notification history
pub trait NotificationStore: Send + Sync {
    /// Persist and return the stored record (with its id)
    fn save(&self, notification: Notification) -> BoxFuture<'_, Result<Notification, StoreError>>;
}

/// Finished game results
pub trait GameResultStore: Send + Sync {
    fn save(&self, result: GameResult) -> BoxFuture<'_, Result<GameResult, StoreError>>;
}
