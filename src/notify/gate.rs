//! Preference-gated notification delivery

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::store::{NotificationStore, PreferenceStore};
use crate::ws::hub::ClientSink;
use crate::ws::protocol::{PlayerId, ServerMsg};

use super::types::{Notification, NotificationKind, NotificationRequest, Notifier};

/// Decides whether a notification may be delivered, persists it, and pushes it.
///
/// Failures never reach the caller: a failed preference lookup delivers anyway,
/// a failed save drops the notification.
#[derive(Clone)]
pub struct NotificationGate {
    preferences: Arc<dyn PreferenceStore>,
    notifications: Arc<dyn NotificationStore>,
    sink: Arc<dyn ClientSink>,
}

impl NotificationGate {
    pub fn new(
        preferences: Arc<dyn PreferenceStore>,
        notifications: Arc<dyn NotificationStore>,
        sink: Arc<dyn ClientSink>,
    ) -> Self {
        Self {
            preferences,
            notifications,
            sink,
        }
    }

    /// Deliver a notification; `None` when suppressed or not persisted
    pub async fn send(&self, request: NotificationRequest) -> Option<Notification> {
        let notification = request.into_notification();
        let target_id = notification.target_id.clone();

        if !self.delivery_allowed(&target_id, notification.kind).await {
            debug!(
                target_id = %target_id,
                kind = notification.kind.as_str(),
                "Notification blocked by user preferences"
            );
            return None;
        }

        let stored = match self.notifications.save(notification).await {
            Ok(stored) => stored,
            Err(e) => {
                error!(target_id = %target_id, error = %e, "Failed to save notification");
                return None;
            }
        };

        self.sink
            .send_to(&target_id, ServerMsg::Notification(stored.clone()));
        Some(stored)
    }

    /// Guest sessions (non-numeric ids) skip the preference check
    async fn delivery_allowed(&self, target_id: &PlayerId, kind: NotificationKind) -> bool {
        let Some(user_id) = target_id.numeric_user_id() else {
            return true;
        };

        match self.preferences.get_by_user_id(user_id).await {
            Ok(Some(prefs)) => prefs.allows(kind.as_str()),
            Ok(None) => true,
            Err(e) => {
                warn!(user_id, error = %e, "Preference check failed, delivering anyway");
                true
            }
        }
    }
}

impl Notifier for NotificationGate {
    fn notify(&self, request: NotificationRequest) {
        let gate = self.clone();
        tokio::spawn(async move {
            gate.send(request).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, StoreError, UserPreferences};
    use crate::testing::RecordingSink;
    use futures::future::BoxFuture;
    use futures::FutureExt;

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn get_by_user_id(
            &self,
            _user_id: i64,
        ) -> BoxFuture<'_, Result<Option<UserPreferences>, StoreError>> {
            async { Err(StoreError::Unavailable("preferences offline".into())) }.boxed()
        }
    }

    impl NotificationStore for BrokenStore {
        fn save(&self, _n: Notification) -> BoxFuture<'_, Result<Notification, StoreError>> {
            async { Err(StoreError::Unavailable("notifications offline".into())) }.boxed()
        }
    }

    fn gate_with(
        preferences: Arc<dyn PreferenceStore>,
        notifications: Arc<dyn NotificationStore>,
    ) -> (NotificationGate, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::default());
        let gate = NotificationGate::new(preferences, notifications, sink.clone());
        (gate, sink)
    }

    fn request(target: &str, kind: NotificationKind) -> NotificationRequest {
        NotificationRequest::new(PlayerId::new(target), kind, "Level up!")
    }

    #[tokio::test]
    async fn guest_ids_skip_preference_lookup() {
        let store = Arc::new(MemoryStore::new());
        let (gate, sink) = gate_with(Arc::new(BrokenStore), store.clone());

        let delivered = gate.send(request("guest-abc", NotificationKind::LevelUp)).await;

        let delivered = delivered.expect("guest notification delivered");
        assert!(delivered.id.is_some());
        assert_eq!(store.notifications().len(), 1);
        assert_eq!(sink.notifications_for(&PlayerId::new("guest-abc")).len(), 1);
    }

    #[tokio::test]
    async fn numeric_ids_default_to_enabled() {
        let store = Arc::new(MemoryStore::new());
        let (gate, sink) = gate_with(store.clone(), store.clone());

        assert!(gate.send(request("42", NotificationKind::LevelUp)).await.is_some());
        assert_eq!(sink.notifications_for(&PlayerId::new("42")).len(), 1);
    }

    #[tokio::test]
    async fn global_disable_suppresses_delivery() {
        let store = Arc::new(MemoryStore::new());
        store.set_preferences(
            42,
            UserPreferences {
                notifications_enabled: false,
                disabled_types: vec![],
            },
        );
        let (gate, sink) = gate_with(store.clone(), store.clone());

        assert!(gate.send(request("42", NotificationKind::LevelUp)).await.is_none());
        assert!(store.notifications().is_empty());
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn per_type_disable_suppresses_only_that_type() {
        let store = Arc::new(MemoryStore::new());
        store.set_preferences(
            42,
            UserPreferences {
                notifications_enabled: true,
                disabled_types: vec!["LEVEL_UP".into()],
            },
        );
        let (gate, _sink) = gate_with(store.clone(), store.clone());

        assert!(gate.send(request("42", NotificationKind::LevelUp)).await.is_none());
        assert!(gate.send(request("42", NotificationKind::GameEvent)).await.is_some());
    }

    #[tokio::test]
    async fn preference_failure_fails_open() {
        let store = Arc::new(MemoryStore::new());
        let (gate, sink) = gate_with(Arc::new(BrokenStore), store.clone());

        assert!(gate.send(request("42", NotificationKind::LevelUp)).await.is_some());
        assert_eq!(sink.notifications_for(&PlayerId::new("42")).len(), 1);
    }

    #[tokio::test]
    async fn persistence_failure_drops_notification() {
        let store = Arc::new(MemoryStore::new());
        let (gate, sink) = gate_with(store, Arc::new(BrokenStore));

        assert!(gate.send(request("guest", NotificationKind::LevelUp)).await.is_none());
        assert!(sink.messages().is_empty());
    }

    #[tokio::test]
    async fn notify_delivers_in_background() {
        let store = Arc::new(MemoryStore::new());
        let (gate, sink) = gate_with(store.clone(), store.clone());

        gate.notify(request("guest", NotificationKind::GameEvent));
        for _ in 0..50 {
            if !store.notifications().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(store.notifications().len(), 1);
        assert_eq!(sink.notifications_for(&PlayerId::new("guest")).len(), 1);
    }
}
