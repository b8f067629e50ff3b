//! Game simulation modules

pub mod engine;
pub mod model;
pub mod movement;
pub mod rules;
pub mod scheduler;
pub mod shared_state;

pub use engine::{JoinOutcome, SnakeEngine};
pub use model::{BoardConfig, FoodPellet, PlayerBoard, Position, Snake};
pub use movement::DefeatReason;
pub use rules::GameRules;
pub use scheduler::{ManualScheduler, TickHandle, TickScheduler, TickTarget, TokioScheduler};
pub use shared_state::{PlayerPublicInfo, SharedState, TeamScores};
