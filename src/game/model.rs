//! Board entities: snake, food pellet and the per-player board

use rand::distributions::Alphanumeric;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, warn};

use crate::ws::protocol::{Direction, PlayerId, Team, YourState};

use super::rules::{GameRules, SNAKE_PALETTE};

/// Grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// Board dimensions sent to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfig {
    pub width: i32,
    pub height: i32,
    pub cell_size: u32,
}

impl BoardConfig {
    pub fn from_rules(rules: &GameRules) -> Self {
        Self {
            width: rules.board_width,
            height: rules.board_height,
            cell_size: rules.cell_size,
        }
    }

    pub fn contains(&self, pos: Position) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoodPellet {
    pub id: String,
    #[serde(flatten)]
    pub position: Position,
    pub color: String,
    pub value: u32,
}

/// Authoritative snake state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snake {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    pub team: Team,
    /// Head first; never empty while not defeated
    pub segments: Vec<Position>,
    pub direction: Direction,
    /// Applied at the start of the next tick
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_direction: Option<Direction>,
    pub score: u32,
    pub level: u32,
    pub is_defeated: bool,
    pub is_paused: bool,
}

impl Snake {
    /// New snake placed at a random start position
    pub fn spawn<R: Rng>(
        id: PlayerId,
        name: String,
        color: String,
        team: Team,
        rules: &GameRules,
        rng: &mut R,
    ) -> Self {
        let mut snake = Self {
            id,
            name,
            color,
            team,
            segments: Vec::new(),
            direction: Direction::Right,
            pending_direction: None,
            score: 0,
            level: 1,
            is_defeated: false,
            is_paused: false,
        };
        snake.reset(rules, rng);
        snake
    }

    /// Back to level 1 with a fresh horizontal body facing right
    pub fn reset<R: Rng>(&mut self, rules: &GameRules, rng: &mut R) {
        let length = rules.initial_length.max(1) as i32;
        let start_x = rng.gen_range(0..(rules.board_width - length).max(1));
        let start_y = rng.gen_range(0..rules.board_height.max(1));

        self.segments = (0..length)
            .rev()
            .map(|i| Position {
                x: start_x + i,
                y: start_y,
            })
            .collect();
        self.direction = Direction::Right;
        self.pending_direction = None;
        self.score = 0;
        self.level = 1;
        self.is_defeated = false;
        self.is_paused = false;

        debug!(
            player_id = %self.id,
            x = start_x,
            y = start_y,
            "Snake initialized"
        );
    }

    pub fn head(&self) -> Option<Position> {
        self.segments.first().copied()
    }

    pub fn occupies(&self, pos: Position) -> bool {
        self.segments.contains(&pos)
    }
}

/// One player's independent board
#[derive(Debug, Clone)]
pub struct PlayerBoard {
    pub snake: Snake,
    pub food: Option<FoodPellet>,
    pub board: BoardConfig,
    /// Timer should be running (false before the first start and after defeat)
    pub is_active: bool,
    pub is_paused: bool,
    pub foods_eaten_this_level: u32,
}

impl PlayerBoard {
    pub fn new(snake: Snake, rules: &GameRules) -> Self {
        Self {
            snake,
            food: None,
            board: BoardConfig::from_rules(rules),
            is_active: false,
            is_paused: false,
            foods_eaten_this_level: 0,
        }
    }

    /// Active, unpaused and not defeated
    pub fn is_running(&self) -> bool {
        self.is_active && !self.is_paused && !self.snake.is_defeated
    }

    /// Place a pellet on a free cell by rejection sampling.
    ///
    /// Leaves the board without food when every attempt lands on the snake.
    pub fn spawn_food<R: Rng>(&mut self, rules: &GameRules, rng: &mut R) -> bool {
        if self.food.is_some() {
            return true;
        }

        for _ in 0..rules.food_spawn_attempts {
            let candidate = Position {
                x: rng.gen_range(0..self.board.width),
                y: rng.gen_range(0..self.board.height),
            };
            if self.snake.occupies(candidate) {
                continue;
            }

            let id: String = (0..5).map(|_| char::from(rng.sample(Alphanumeric))).collect();
            let color = SNAKE_PALETTE
                .choose(rng)
                .copied()
                .unwrap_or(SNAKE_PALETTE[0])
                .to_string();

            self.food = Some(FoodPellet {
                id,
                position: candidate,
                color,
                value: rules.points_per_food,
            });
            return true;
        }

        warn!(player_id = %self.snake.id, "Could not spawn food");
        false
    }

    /// Sanitized snapshot for the owning client
    pub fn your_state(&self) -> YourState {
        YourState {
            snake: self.snake.clone(),
            food: self.food.clone(),
            board: self.board,
        }
    }
}

/// Palette color not used by any other board, else any palette color
pub fn choose_color<'a, R: Rng>(used: impl Iterator<Item = &'a str>, rng: &mut R) -> String {
    let used: Vec<&str> = used.collect();
    let free: Vec<&str> = SNAKE_PALETTE
        .iter()
        .copied()
        .filter(|c| !used.contains(c))
        .collect();

    free.choose(rng)
        .or_else(|| SNAKE_PALETTE.choose(rng))
        .copied()
        .unwrap_or(SNAKE_PALETTE[0])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn spawn_snake(rng: &mut ChaCha8Rng) -> Snake {
        Snake::spawn(
            PlayerId::new("p1"),
            "Ada".into(),
            "#60DBFB".into(),
            Team::Red,
            &GameRules::default(),
            rng,
        )
    }

    #[test]
    fn spawned_snake_is_horizontal_and_in_bounds() {
        let rules = GameRules::default();
        let board = BoardConfig::from_rules(&rules);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..100 {
            let snake = spawn_snake(&mut rng);
            assert_eq!(snake.segments.len(), 3);
            assert_eq!(snake.direction, Direction::Right);
            assert_eq!(snake.level, 1);
            assert!(snake.segments.iter().all(|s| board.contains(*s)));
            let head = snake.segments[0];
            assert_eq!(snake.segments[1], Position { x: head.x - 1, y: head.y });
            assert_eq!(snake.segments[2], Position { x: head.x - 2, y: head.y });
        }
    }

    #[test]
    fn food_never_spawns_on_snake() {
        let rules = GameRules::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for _ in 0..200 {
            let snake = spawn_snake(&mut rng);
            let mut board = PlayerBoard::new(snake, &rules);
            assert!(board.spawn_food(&rules, &mut rng));
            let food = board.food.as_ref().unwrap();
            assert!(!board.snake.occupies(food.position));
            assert!(board.board.contains(food.position));
            assert_eq!(food.value, 10);
            assert_eq!(food.id.len(), 5);
        }
    }

    #[test]
    fn food_absent_when_board_is_full() {
        let rules = GameRules {
            board_width: 2,
            board_height: 1,
            initial_length: 2,
            ..GameRules::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let snake = Snake::spawn(
            PlayerId::new("p1"),
            "Ada".into(),
            "#60DBFB".into(),
            Team::Blue,
            &rules,
            &mut rng,
        );
        let mut board = PlayerBoard::new(snake, &rules);

        assert!(!board.spawn_food(&rules, &mut rng));
        assert!(board.food.is_none());
    }

    #[test]
    fn snapshot_omits_scheduling_flags() {
        let rules = GameRules::default();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut board = PlayerBoard::new(spawn_snake(&mut rng), &rules);
        board.is_active = true;

        let json = serde_json::to_value(board.your_state()).unwrap();
        assert!(json.get("isActive").is_none());
        assert!(json.get("isPaused").is_none());
        assert_eq!(json["board"]["width"], 20);
        assert_eq!(json["snake"]["isDefeated"], false);
        assert!(json["snake"].get("pendingDirection").is_none());
    }

    #[test]
    fn color_prefers_unused_palette_entries() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let used: Vec<&str> = SNAKE_PALETTE[..7].to_vec();
        for _ in 0..20 {
            assert_eq!(choose_color(used.iter().copied(), &mut rng), SNAKE_PALETTE[7]);
        }

        let all = SNAKE_PALETTE.to_vec();
        let color = choose_color(all.iter().copied(), &mut rng);
        assert!(SNAKE_PALETTE.contains(&color.as_str()));
    }
}
