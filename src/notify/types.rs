//! Notification records and the fire-and-forget notifier seam

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ws::protocol::PlayerId;

/// Category of a notification; users can disable individual categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "ITEM_ACQUIRED")]
    ItemAcquired,
    #[serde(rename = "LEVEL_UP")]
    LevelUp,
    #[serde(rename = "CHALLENGE_COMPLETED")]
    ChallengeCompleted,
    #[serde(rename = "GAME_EVENT")]
    GameEvent,
    #[serde(rename = "GAME_OVER")]
    GameOver,
    #[serde(rename = "PVP_EVENT")]
    PvpEvent,
    #[serde(rename = "FRIEND_REQUEST")]
    FriendRequest,
    #[serde(rename = "FRIEND_ACCEPTED")]
    FriendAccepted,
    #[serde(rename = "SOCIAL_INFO")]
    SocialInfo,
    #[serde(rename = "info")]
    Info,
    #[serde(rename = "error")]
    Error,
}

impl NotificationKind {
    /// Name stored in the database and matched against disabled preference types
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::ItemAcquired => "ITEM_ACQUIRED",
            NotificationKind::LevelUp => "LEVEL_UP",
            NotificationKind::ChallengeCompleted => "CHALLENGE_COMPLETED",
            NotificationKind::GameEvent => "GAME_EVENT",
            NotificationKind::GameOver => "GAME_OVER",
            NotificationKind::PvpEvent => "PVP_EVENT",
            NotificationKind::FriendRequest => "FRIEND_REQUEST",
            NotificationKind::FriendAccepted => "FRIEND_ACCEPTED",
            NotificationKind::SocialInfo => "SOCIAL_INFO",
            NotificationKind::Info => "info",
            NotificationKind::Error => "error",
        }
    }
}

/// A notification as stored and delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Assigned by the notification store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub target_id: PlayerId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// What a caller wants delivered
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRequest {
    pub target_id: PlayerId,
    pub kind: NotificationKind,
    pub message: String,
    pub details: Option<Value>,
}

impl NotificationRequest {
    pub fn new(target_id: PlayerId, kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            target_id,
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Stamp with the server clock
    pub fn into_notification(self) -> Notification {
        Notification {
            id: None,
            target_id: self.target_id,
            kind: self.kind,
            message: self.message,
            created_at: Utc::now(),
            details: self.details,
        }
    }
}

/// Fire-and-forget notification submission; never blocks the caller
pub trait Notifier: Send + Sync {
    fn notify(&self, request: NotificationRequest);
}
