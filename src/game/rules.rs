//! Game tuning: board size, speed curve, scoring and progression thresholds

use std::time::Duration;

/// Colors handed out to snakes and food pellets
pub const SNAKE_PALETTE: [&str; 8] = [
    "#60DBFB", "#FB60F2", "#FBF360", "#60FB7A", "#FB8C60", "#C560FB", "#FF6B6B", "#4ECDC4",
];

/// Tunable rules for every board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRules {
    pub board_width: i32,
    pub board_height: i32,
    /// Pixel size of one cell, passed through to clients
    pub cell_size: u32,
    pub initial_length: usize,

    /// Tick interval at level 1 (ms)
    pub base_tick_ms: u64,
    /// Interval reduction per speed group (ms)
    pub tick_step_ms: u64,
    /// Levels sharing one tick interval
    pub levels_per_speed_group: u32,
    /// Floor for the tick interval (ms)
    pub min_tick_ms: u64,

    pub points_per_food: u32,
    pub foods_per_level: u32,
    pub milestone_level_interval: u32,
    pub milestone_level_bonus: u32,
    pub team_score_milestone_step: u32,

    /// Rejection sampling budget for food placement
    pub food_spawn_attempts: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            board_width: 20,
            board_height: 15,
            cell_size: 20,
            initial_length: 3,
            base_tick_ms: 320,
            tick_step_ms: 25,
            levels_per_speed_group: 3,
            min_tick_ms: 100,
            points_per_food: 10,
            foods_per_level: 3,
            milestone_level_interval: 5,
            milestone_level_bonus: 50,
            team_score_milestone_step: 200,
            food_spawn_attempts: 50,
        }
    }
}

impl GameRules {
    /// Speed group a level belongs to (0-based)
    pub fn speed_group(&self, level: u32) -> u32 {
        level.saturating_sub(1) / self.levels_per_speed_group.max(1)
    }

    /// Tick interval for a level
    pub fn tick_interval(&self, level: u32) -> Duration {
        let reduction = u64::from(self.speed_group(level)).saturating_mul(self.tick_step_ms);
        let ms = self
            .base_tick_ms
            .saturating_sub(reduction)
            .max(self.min_tick_ms);
        Duration::from_millis(ms)
    }

    pub fn is_milestone_level(&self, level: u32) -> bool {
        self.milestone_level_interval > 0 && level % self.milestone_level_interval == 0
    }

    /// Highest team score milestone reached, if any
    pub fn team_milestone(&self, score: u32) -> Option<u32> {
        let step = self.team_score_milestone_step;
        if step == 0 {
            return None;
        }
        let reached = (score / step) * step;
        (reached > 0).then_some(reached)
    }
}
