//! Notification history backed by the `notifications` table

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::notify::{Notification, NotificationKind};
use crate::ws::protocol::PlayerId;

use super::supabase::SupabaseClient;
use super::{NotificationStore, StoreError};

/// New notification for insertion
#[derive(Debug, Clone, Serialize)]
struct NewNotificationRow {
    target_id: PlayerId,
    #[serde(rename = "type")]
    kind: NotificationKind,
    message: String,
    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// Stored notification row
#[derive(Debug, Clone, Deserialize)]
struct NotificationRow {
    id: Uuid,
    target_id: PlayerId,
    #[serde(rename = "type")]
    kind: NotificationKind,
    message: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    details: Option<Value>,
}

impl From<Notification> for NewNotificationRow {
    fn from(n: Notification) -> Self {
        Self {
            target_id: n.target_id,
            kind: n.kind,
            message: n.message,
            created_at: n.created_at,
            details: n.details,
        }
    }
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: Some(row.id.to_string()),
            target_id: row.target_id,
            kind: row.kind,
            message: row.message,
            created_at: row.created_at,
            details: row.details,
        }
    }
}

#[derive(Clone)]
pub struct SupabaseNotificationStore {
    client: SupabaseClient,
}

impl SupabaseNotificationStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl NotificationStore for SupabaseNotificationStore {
    fn save(&self, notification: Notification) -> BoxFuture<'_, Result<Notification, StoreError>> {
        async move {
            let row = NewNotificationRow::from(notification);
            let saved: NotificationRow = self.client.insert("notifications", &row).await?;
            Ok::<_, StoreError>(saved.into())
        }
        .boxed()
    }
}
