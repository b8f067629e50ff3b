//! Stateless friend request / accept flow
//!
//! Nothing is persisted here: both operations look the players up in the
//! engine's registry and turn into notifications.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::notify::{NotificationKind, NotificationRequest, Notifier};
use crate::ws::protocol::PlayerId;

/// Lookup of players that currently have a board
pub trait PlayerDirectory: Send + Sync {
    fn display_name(&self, player_id: &PlayerId) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SocialError {
    #[error("Target player not in game.")]
    TargetNotInGame,

    #[error("You cannot send a friend request to yourself.")]
    SelfRequest,

    #[error("Could not accept: Original requester not in game.")]
    RequesterNotInGame,

    #[error("Could not accept: You are not in game.")]
    AcceptorNotInGame,
}

pub struct SocialRelay {
    directory: Arc<dyn PlayerDirectory>,
    notifier: Arc<dyn Notifier>,
}

impl SocialRelay {
    pub fn new(directory: Arc<dyn PlayerDirectory>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            directory,
            notifier,
        }
    }

    /// Relay a friend request; failures are reported back to the sender
    pub fn send_friend_request(
        &self,
        from: &PlayerId,
        from_name: Option<&str>,
        to: &PlayerId,
    ) -> Result<(), SocialError> {
        let result = self.try_send_request(from, from_name, to);
        if let Err(e) = &result {
            self.report(from, e);
        }
        result
    }

    pub fn accept_friend_request(
        &self,
        accepting: &PlayerId,
        requester: &PlayerId,
    ) -> Result<(), SocialError> {
        let result = self.try_accept(accepting, requester);
        if let Err(e) = &result {
            self.report(accepting, e);
        }
        result
    }

    fn try_send_request(
        &self,
        from: &PlayerId,
        from_name: Option<&str>,
        to: &PlayerId,
    ) -> Result<(), SocialError> {
        let target_name = self
            .directory
            .display_name(to)
            .ok_or(SocialError::TargetNotInGame)?;
        if from == to {
            return Err(SocialError::SelfRequest);
        }

        let sender_name = from_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| self.directory.display_name(from))
            .unwrap_or_else(|| format!("Player {}", from.short(4)));

        info!(from = %from, to = %to, "Relaying friend request");
        self.notifier.notify(
            NotificationRequest::new(
                to.clone(),
                NotificationKind::FriendRequest,
                format!("{sender_name} sent you a friend request."),
            )
            .with_details(json!({
                "fromPlayerId": from,
                "fromPlayerName": sender_name,
                "title": "New Friend Request",
            })),
        );
        self.notifier.notify(
            NotificationRequest::new(
                from.clone(),
                NotificationKind::Info,
                format!("Friend request sent to {target_name}."),
            )
            .with_details(json!({ "title": "Request Sent" })),
        );
        Ok(())
    }

    fn try_accept(&self, accepting: &PlayerId, requester: &PlayerId) -> Result<(), SocialError> {
        let requester_name = self
            .directory
            .display_name(requester)
            .ok_or(SocialError::RequesterNotInGame)?;
        let accepting_name = self
            .directory
            .display_name(accepting)
            .ok_or(SocialError::AcceptorNotInGame)?;

        info!(accepting = %accepting, requester = %requester, "Friend request accepted");
        self.notifier.notify(
            NotificationRequest::new(
                requester.clone(),
                NotificationKind::FriendAccepted,
                format!("{accepting_name} accepted your friend request!"),
            )
            .with_details(json!({
                "acceptedByPlayerName": accepting_name,
                "title": "Friend Request Accepted",
            })),
        );
        self.notifier.notify(
            NotificationRequest::new(
                accepting.clone(),
                NotificationKind::SocialInfo,
                format!("You are now friends with {requester_name}."),
            )
            .with_details(json!({
                "friendPlayerName": requester_name,
                "title": "New Friend!",
            })),
        );
        Ok(())
    }

    fn report(&self, player_id: &PlayerId, error: &SocialError) {
        debug!(player_id = %player_id, error = %error, "Social action rejected");
        self.notifier.notify(
            NotificationRequest::new(player_id.clone(), NotificationKind::Error, error.to_string())
                .with_details(json!({ "title": "Error" })),
        );
    }
}
