//! In-process stores, used when no database is configured

use std::collections::VecDeque;

use dashmap::DashMap;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::notify::Notification;

use super::game_results::GameResult;
use super::preferences::UserPreferences;
use super::{GameResultStore, NotificationStore, PreferenceStore, StoreError};

/// Records kept per history before the oldest are evicted
pub const DEFAULT_HISTORY_CAP: usize = 1_000;

/// Keeps preferences and the most recent notifications and results in memory
pub struct MemoryStore {
    preferences: DashMap<i64, UserPreferences>,
    notifications: Mutex<VecDeque<Notification>>,
    results: Mutex<VecDeque<GameResult>>,
    history_cap: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_history_cap(DEFAULT_HISTORY_CAP)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history_cap(history_cap: usize) -> Self {
        Self {
            preferences: DashMap::new(),
            notifications: Mutex::new(VecDeque::new()),
            results: Mutex::new(VecDeque::new()),
            history_cap: history_cap.max(1),
        }
    }

    pub fn set_preferences(&self, user_id: i64, preferences: UserPreferences) {
        self.preferences.insert(user_id, preferences);
    }

    /// Retained notifications, oldest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().iter().cloned().collect()
    }

    pub fn results(&self) -> Vec<GameResult> {
        self.results.lock().iter().cloned().collect()
    }
}

fn push_bounded<T>(history: &Mutex<VecDeque<T>>, cap: usize, item: T) {
    let mut history = history.lock();
    while history.len() >= cap {
        history.pop_front();
    }
    history.push_back(item);
}

impl PreferenceStore for MemoryStore {
    fn get_by_user_id(
        &self,
        user_id: i64,
    ) -> BoxFuture<'_, Result<Option<UserPreferences>, StoreError>> {
        let prefs = self.preferences.get(&user_id).map(|p| p.value().clone());
        async move { Ok(prefs) }.boxed()
    }
}

impl NotificationStore for MemoryStore {
    fn save(&self, mut notification: Notification) -> BoxFuture<'_, Result<Notification, StoreError>> {
        notification.id = Some(Uuid::new_v4().to_string());
        push_bounded(&self.notifications, self.history_cap, notification.clone());
        async move { Ok(notification) }.boxed()
    }
}

impl GameResultStore for MemoryStore {
    fn save(&self, mut result: GameResult) -> BoxFuture<'_, Result<GameResult, StoreError>> {
        result.id = Some(Uuid::new_v4().to_string());
        push_bounded(&self.results, self.history_cap, result.clone());
        async move { Ok(result) }.boxed()
    }
}
