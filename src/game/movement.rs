//! Grid movement and collision detection

use serde::Serialize;

use crate::ws::protocol::Direction;

use super::model::{BoardConfig, Position};

/// Why a snake was defeated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DefeatReason {
    #[serde(rename = "wall")]
    Wall,
    #[serde(rename = "self")]
    SelfCollision,
    /// Snake had no segments when a tick ran
    #[serde(rename = "invalid_state")]
    InvalidState,
}

impl DefeatReason {
    pub fn describe(self) -> &'static str {
        match self {
            DefeatReason::Wall => "collided with wall",
            DefeatReason::SelfCollision => "collided with itself",
            DefeatReason::InvalidState => "invalid state (no segments)",
        }
    }
}

/// Cell reached by moving one step from `head`
pub fn next_head(head: Position, direction: Direction) -> Position {
    let (dx, dy) = direction.delta();
    Position {
        x: head.x + dx,
        y: head.y + dy,
    }
}

/// Checks the head (index 0) against the walls, then against the body.
pub fn detect_collision(segments: &[Position], board: &BoardConfig) -> Option<DefeatReason> {
    let (head, body) = segments.split_first()?;

    if !board.contains(*head) {
        return Some(DefeatReason::Wall);
    }

    if body.iter().any(|segment| segment == head) {
        return Some(DefeatReason::SelfCollision);
    }

    None
}

/// True when `direction` would turn the head straight back into the neck
pub fn reverses_into_neck(segments: &[Position], direction: Direction) -> bool {
    match segments {
        [head, neck, ..] => next_head(*head, direction) == *neck,
        _ => false,
    }
}
