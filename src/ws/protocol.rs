//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::model::{BoardConfig, FoodPellet, Snake};
use crate::game::movement::DefeatReason;
use crate::game::shared_state::SharedState;
use crate::notify::Notification;

/// Maximum length of a display name (join name and friend request override)
pub const MAX_NAME_LEN: usize = 20;

/// Opaque player identifier assigned by the transport layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh connection id
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric user id, if this id refers to a registered user
    pub fn numeric_user_id(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }

    /// First `n` characters, used for generated placeholder names
    pub fn short(&self, n: usize) -> &str {
        match self.0.char_indices().nth(n) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Team a snake plays for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    Red,
    Blue,
}

impl Team {
    pub fn opponent(self) -> Team {
        match self {
            Team::Red => Team::Blue,
            Team::Blue => Team::Red,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Team::Red => "red",
            Team::Blue => "blue",
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Movement direction on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Unit grid delta; y grows downwards
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMsg {
    /// Create (or refresh) this connection's board
    #[serde(rename = "player:join_game", rename_all = "camelCase")]
    JoinGame { name: String, preferred_team: Team },

    /// Start, resume, or retry after defeat
    #[serde(rename = "player:start_my_game")]
    StartMyGame,

    #[serde(rename = "player:pause_my_game")]
    PauseMyGame,

    #[serde(rename = "player:change_direction")]
    ChangeDirection { direction: Direction },

    /// Legacy retry button; answered with a hint
    #[serde(rename = "player:request_retry")]
    RequestRetry,

    #[serde(rename = "social:send_friend_request", rename_all = "camelCase")]
    SendFriendRequest {
        to_player_id: PlayerId,
        #[serde(default)]
        from_player_name: Option<String>,
    },

    #[serde(rename = "social:accept_friend_request", rename_all = "camelCase")]
    AcceptFriendRequest { request_from_player_id: PlayerId },
}

impl ClientMsg {
    /// Schema checks performed before a message reaches the engine
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            ClientMsg::JoinGame { name, .. } => {
                let trimmed = name.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyField("name"));
                }
                if name.chars().count() > MAX_NAME_LEN {
                    return Err(ValidationError::TooLong {
                        field: "name",
                        max: MAX_NAME_LEN,
                    });
                }
                Ok(())
            }
            ClientMsg::SendFriendRequest {
                to_player_id,
                from_player_name,
            } => {
                if to_player_id.as_str().trim().is_empty() {
                    return Err(ValidationError::EmptyField("toPlayerId"));
                }
                if from_player_name
                    .as_ref()
                    .is_some_and(|n| n.chars().count() > MAX_NAME_LEN)
                {
                    return Err(ValidationError::TooLong {
                        field: "fromPlayerName",
                        max: MAX_NAME_LEN,
                    });
                }
                Ok(())
            }
            ClientMsg::AcceptFriendRequest {
                request_from_player_id,
            } => {
                if request_from_player_id.as_str().trim().is_empty() {
                    return Err(ValidationError::EmptyField("requestFromPlayerId"));
                }
                Ok(())
            }
            ClientMsg::StartMyGame
            | ClientMsg::PauseMyGame
            | ClientMsg::ChangeDirection { .. }
            | ClientMsg::RequestRetry => Ok(()),
        }
    }
}

/// Rejected inbound payloads
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMsg {
    /// Confirmation of join (also resent on refresh)
    #[serde(rename = "game:joined_successfully", rename_all = "camelCase")]
    JoinedSuccessfully {
        player_id: PlayerId,
        name: String,
        team: Team,
        color: String,
    },

    /// The receiving player's own board
    #[serde(rename = "game:your_state")]
    YourState(YourState),

    /// Team scores and leaderboard
    #[serde(rename = "game:shared_state")]
    SharedState(SharedState),

    #[serde(rename = "player:you_are_defeated", rename_all = "camelCase")]
    YouAreDefeated {
        reason: DefeatReason,
        final_score: u32,
        level_reached: u32,
    },

    #[serde(rename = "notification:new")]
    Notification(Notification),

    #[serde(rename = "game:join_failed")]
    JoinFailed { message: String },

    #[serde(rename = "info")]
    Info { message: String },

    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerMsg {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Sanitized board snapshot: no scheduling flags
#[derive(Debug, Clone, Serialize)]
pub struct YourState {
    pub snake: Snake,
    pub food: Option<FoodPellet>,
    pub board: BoardConfig,
}
