//! Simulation engine: per-player boards and their tick loops
//!
//! Every board is simulated independently on its own schedule. The board map,
//! timers, team scores and milestone ledger live behind a single lock; client
//! messages and notifications produced while it is held are collected in an
//! [`Outbox`] and flushed after it is released, so a tick never waits on I/O.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::notify::{NotificationKind, NotificationRequest, Notifier};
use crate::social::PlayerDirectory;
use crate::ws::hub::ClientSink;
use crate::ws::protocol::{Direction, PlayerId, ServerMsg, Team};

use super::model::{choose_color, PlayerBoard, Snake};
use super::movement::{self, DefeatReason};
use super::rules::GameRules;
use super::scheduler::{TickHandle, TickScheduler, TickTarget};
use super::shared_state::{MilestoneLedger, SharedState, SharedStateAggregator};

/// Result of a join request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub accepted: bool,
    pub message: Option<String>,
}

enum Outgoing {
    To(PlayerId, ServerMsg),
    Broadcast(ServerMsg),
}

/// Side effects gathered under the lock
#[derive(Default)]
struct Outbox {
    messages: Vec<Outgoing>,
    notifications: Vec<NotificationRequest>,
}

impl Outbox {
    fn send(&mut self, player_id: &PlayerId, msg: ServerMsg) {
        self.messages.push(Outgoing::To(player_id.clone(), msg));
    }

    fn broadcast(&mut self, msg: ServerMsg) {
        self.messages.push(Outgoing::Broadcast(msg));
    }

    fn notify(&mut self, request: NotificationRequest) {
        self.notifications.push(request);
    }
}

enum TickOutcome {
    Moved { ate_food: bool },
    Defeated(DefeatReason),
}

struct EngineState {
    boards: HashMap<PlayerId, PlayerBoard>,
    timers: HashMap<PlayerId, TickHandle>,
    shared: SharedStateAggregator,
    milestones: MilestoneLedger,
    rng: ChaCha8Rng,
}

/// Owns every board and its tick loop
pub struct SnakeEngine {
    rules: GameRules,
    state: Mutex<EngineState>,
    sink: Arc<dyn ClientSink>,
    notifier: Arc<dyn Notifier>,
    scheduler: Arc<dyn TickScheduler>,
    this: Weak<SnakeEngine>,
}

impl SnakeEngine {
    pub fn new(
        rules: GameRules,
        sink: Arc<dyn ClientSink>,
        notifier: Arc<dyn Notifier>,
        scheduler: Arc<dyn TickScheduler>,
        seed: Option<u64>,
    ) -> Arc<Self> {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Arc::new_cyclic(|this| Self {
            rules,
            state: Mutex::new(EngineState {
                boards: HashMap::new(),
                timers: HashMap::new(),
                shared: SharedStateAggregator::new(),
                milestones: MilestoneLedger::default(),
                rng,
            }),
            sink,
            notifier,
            scheduler,
            this: this.clone(),
        })
    }

    pub fn player_count(&self) -> usize {
        self.state.lock().boards.len()
    }

    pub fn has_board(&self, player_id: &PlayerId) -> bool {
        self.state.lock().boards.contains_key(player_id)
    }

    /// Current team scores and leaderboard
    pub fn shared_state(&self) -> SharedState {
        let state = self.state.lock();
        state.shared.project(&state.boards)
    }

    /// Create a board, or resend the existing one
    pub fn join(&self, player_id: &PlayerId, name: &str, team: Team) -> JoinOutcome {
        self.with_state(|state, out| self.join_locked(state, out, player_id, name, team))
    }

    /// Start, resume, or retry after defeat
    pub fn start(&self, player_id: &PlayerId) {
        self.with_state(|state, out| self.start_locked(state, out, player_id))
    }

    pub fn pause(&self, player_id: &PlayerId) {
        self.with_state(|state, out| self.pause_locked(state, out, player_id))
    }

    /// Buffer a direction for the next tick
    pub fn change_direction(&self, player_id: &PlayerId, direction: Direction) {
        let mut state = self.state.lock();
        let Some(board) = state.boards.get_mut(player_id) else {
            return;
        };
        if !board.is_running() {
            return;
        }
        if movement::reverses_into_neck(&board.snake.segments, direction) {
            debug!(player_id = %player_id, ?direction, "Ignoring reversal into neck");
            return;
        }
        board.snake.pending_direction = Some(direction);
    }

    /// End a board's run; no effect when already defeated
    pub fn defeat(&self, player_id: &PlayerId, reason: DefeatReason) {
        self.with_state(|state, out| self.defeat_locked(state, out, player_id, reason))
    }

    /// Drop every trace of a player
    pub fn disconnect(&self, player_id: &PlayerId) {
        self.with_state(|state, out| {
            self.cancel_timer(state, player_id);
            if let Some(board) = state.boards.remove(player_id) {
                info!(
                    player_id = %player_id,
                    name = %board.snake.name,
                    remaining = state.boards.len(),
                    "Player removed"
                );
                self.broadcast_shared(state, out);
            }
        })
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut EngineState, &mut Outbox) -> R) -> R {
        let mut outbox = Outbox::default();
        let result = {
            let mut state = self.state.lock();
            f(&mut state, &mut outbox)
        };
        self.flush(outbox);
        result
    }

    fn flush(&self, outbox: Outbox) {
        for msg in outbox.messages {
            match msg {
                Outgoing::To(player_id, msg) => self.sink.send_to(&player_id, msg),
                Outgoing::Broadcast(msg) => self.sink.broadcast(msg),
            }
        }
        for request in outbox.notifications {
            self.notifier.notify(request);
        }
    }

    fn join_locked(
        &self,
        state: &mut EngineState,
        out: &mut Outbox,
        player_id: &PlayerId,
        name: &str,
        team: Team,
    ) -> JoinOutcome {
        if let Some(board) = state.boards.get(player_id) {
            warn!(
                player_id = %player_id,
                defeated = board.snake.is_defeated,
                paused = board.is_paused,
                active = board.is_active,
                "Player already has a board, resending state"
            );
            out.send(player_id, ServerMsg::YourState(board.your_state()));
            out.send(
                player_id,
                ServerMsg::SharedState(state.shared.project(&state.boards)),
            );
            out.send(player_id, joined_message(&board.snake));
            return JoinOutcome {
                accepted: true,
                message: Some(
                    "Player already in session. State refreshed. Click Start/Retry to play."
                        .to_string(),
                ),
            };
        }

        let name = match name.trim() {
            "" => format!("Player-{}", player_id.short(4)),
            trimmed => trimmed.to_string(),
        };
        let color = choose_color(
            state.boards.values().map(|b| b.snake.color.as_str()),
            &mut state.rng,
        );
        let snake = Snake::spawn(
            player_id.clone(),
            name,
            color,
            team,
            &self.rules,
            &mut state.rng,
        );
        let mut board = PlayerBoard::new(snake, &self.rules);
        board.spawn_food(&self.rules, &mut state.rng);

        info!(
            player_id = %player_id,
            name = %board.snake.name,
            team = %team,
            total = state.boards.len() + 1,
            "Player joined"
        );

        out.send(player_id, joined_message(&board.snake));
        out.send(player_id, ServerMsg::YourState(board.your_state()));
        state.boards.insert(player_id.clone(), board);
        self.broadcast_shared(state, out);

        JoinOutcome {
            accepted: true,
            message: None,
        }
    }

    fn start_locked(&self, state: &mut EngineState, out: &mut Outbox, player_id: &PlayerId) {
        let Some(board) = state.boards.get_mut(player_id) else {
            out.send(
                player_id,
                ServerMsg::error("Your game session was not found. Please rejoin."),
            );
            return;
        };
        if board.is_active && !board.is_paused {
            out.send(player_id, ServerMsg::info("Your game is already running."));
            return;
        }

        let retry = board.snake.is_defeated;
        let event = if retry {
            "Game Restarted!"
        } else if board.is_paused {
            "Game Resumed!"
        } else {
            "Game Started!"
        };

        if retry {
            board.snake.reset(&self.rules, &mut state.rng);
            board.foods_eaten_this_level = 0;
            board.food = None;
            board.spawn_food(&self.rules, &mut state.rng);
            out.notify(
                NotificationRequest::new(
                    player_id.clone(),
                    NotificationKind::GameEvent,
                    "Retrying your game! Good luck!",
                )
                .with_details(json!({ "title": "Game Retry" })),
            );
        }

        board.is_paused = false;
        board.snake.is_paused = false;
        board.is_active = true;
        let level = board.snake.level;
        let snapshot = board.your_state();

        info!(player_id = %player_id, level, retry, "Starting game");
        self.schedule_ticks(state, player_id, level);
        self.broadcast_shared(state, out);
        out.send(player_id, ServerMsg::YourState(snapshot));
        out.notify(
            NotificationRequest::new(player_id.clone(), NotificationKind::GameEvent, event)
                .with_details(json!({ "title": event })),
        );
    }

    fn pause_locked(&self, state: &mut EngineState, out: &mut Outbox, player_id: &PlayerId) {
        let Some(board) = state
            .boards
            .get_mut(player_id)
            .filter(|board| board.is_running())
        else {
            out.send(
                player_id,
                ServerMsg::info("Cannot pause: Game not running or already paused/defeated."),
            );
            return;
        };

        board.is_paused = true;
        board.snake.is_paused = true;
        let snapshot = board.your_state();

        info!(player_id = %player_id, "Pausing game");
        self.cancel_timer(state, player_id);
        self.broadcast_shared(state, out);
        out.send(player_id, ServerMsg::YourState(snapshot));
        out.notify(
            NotificationRequest::new(
                player_id.clone(),
                NotificationKind::GameEvent,
                "Game Paused. Click 'Resume Game' or press Space to continue.",
            )
            .with_details(json!({ "title": "Game Paused" })),
        );
    }

    fn tick_locked(
        &self,
        state: &mut EngineState,
        out: &mut Outbox,
        player_id: &PlayerId,
        generation: u64,
    ) {
        let current = state.timers.get(player_id).map(TickHandle::generation);
        if current != Some(generation) {
            debug!(player_id = %player_id, generation, "Dropping tick from a replaced timer");
            return;
        }

        let running = state
            .boards
            .get(player_id)
            .is_some_and(PlayerBoard::is_running);
        if !running {
            if self.cancel_timer(state, player_id) {
                debug!(player_id = %player_id, "Board no longer running, halting tick loop");
            }
            return;
        }

        let Some(board) = state.boards.get_mut(player_id) else {
            return;
        };

        if let Some(direction) = board.snake.pending_direction.take() {
            board.snake.direction = direction;
        }

        let outcome = match board.snake.head() {
            None => TickOutcome::Defeated(DefeatReason::InvalidState),
            Some(head) => {
                let new_head = movement::next_head(head, board.snake.direction);
                board.snake.segments.insert(0, new_head);

                match movement::detect_collision(&board.snake.segments, &board.board) {
                    Some(reason) => TickOutcome::Defeated(reason),
                    None => {
                        let ate_food = board
                            .food
                            .as_ref()
                            .is_some_and(|food| food.position == new_head);
                        if ate_food {
                            board.food = None;
                        } else {
                            board.snake.segments.pop();
                        }
                        TickOutcome::Moved { ate_food }
                    }
                }
            }
        };

        match outcome {
            TickOutcome::Defeated(reason) => self.defeat_locked(state, out, player_id, reason),
            TickOutcome::Moved { ate_food: true } => self.food_eaten(state, out, player_id),
            TickOutcome::Moved { ate_food: false } => {}
        }

        if let Some(board) = state.boards.get(player_id) {
            out.send(player_id, ServerMsg::YourState(board.your_state()));
        }
    }

    fn food_eaten(&self, state: &mut EngineState, out: &mut Outbox, player_id: &PlayerId) {
        let rules = &self.rules;
        let EngineState {
            boards,
            shared,
            rng,
            ..
        } = state;
        let Some(board) = boards.get_mut(player_id) else {
            return;
        };

        let points = rules.points_per_food;
        board.snake.score += points;
        let team = board.snake.team;
        shared.award(team, points);
        board.foods_eaten_this_level += 1;
        board.spawn_food(rules, rng);

        out.notify(
            NotificationRequest::new(
                player_id.clone(),
                NotificationKind::ItemAcquired,
                format!("{} ate a pellet! +{} score.", board.snake.name, points),
            )
            .with_details(json!({
                "item": "Nutrient Pellet",
                "value": points,
                "currentScore": board.snake.score,
                "currentLevel": board.snake.level,
                "title": "Item Acquired!",
            })),
        );

        let previous_level = if board.foods_eaten_this_level >= rules.foods_per_level {
            board.foods_eaten_this_level = 0;
            let previous = board.snake.level;
            board.snake.level += 1;
            Some(previous)
        } else {
            None
        };

        if let Some(previous_level) = previous_level {
            self.level_up(state, out, player_id, previous_level);
        }

        self.check_team_milestone(state, out, team);
        self.broadcast_shared(state, out);
    }

    fn level_up(
        &self,
        state: &mut EngineState,
        out: &mut Outbox,
        player_id: &PlayerId,
        previous_level: u32,
    ) {
        let rules = &self.rules;
        let Some(board) = state.boards.get(player_id) else {
            return;
        };
        let name = board.snake.name.clone();
        let team = board.snake.team;
        let level = board.snake.level;
        let length = board.snake.segments.len();

        info!(player_id = %player_id, level, "Level up");
        out.notify(
            NotificationRequest::new(
                player_id.clone(),
                NotificationKind::LevelUp,
                format!("Congratulations, {name}! You've reached Level {level}! (Length: {length})"),
            )
            .with_details(json!({
                "newLevel": level,
                "length": length,
                "previousLevel": previous_level,
                "title": "Level Up!",
            })),
        );

        if rules.is_milestone_level(level) {
            let bonus = rules.milestone_level_bonus;
            state.shared.award(team, bonus);

            let details = json!({
                "achievement": format!("Level {level} Milestone!"),
                "reward": format!("{bonus} points to Team {team}"),
                "playerName": name,
                "team": team,
                "points": bonus,
                "level": level,
                "title": "Challenge Completed!",
            });
            out.notify(
                NotificationRequest::new(
                    player_id.clone(),
                    NotificationKind::ChallengeCompleted,
                    format!(
                        "Milestone Achievement: Level {level}! Your team gets +{bonus} points as a reward!"
                    ),
                )
                .with_details(details.clone()),
            );

            let announcement = format!(
                "{name} (Team {team}) reached Level {level} & earned {bonus} points for the team! Amazing!"
            );
            for other in state.boards.keys().filter(|id| *id != player_id) {
                out.notify(
                    NotificationRequest::new(
                        other.clone(),
                        NotificationKind::GameEvent,
                        announcement.clone(),
                    )
                    .with_details(details.clone()),
                );
            }
        }

        if rules.speed_group(previous_level) != rules.speed_group(level) {
            let interval = rules.tick_interval(level);
            self.schedule_ticks(state, player_id, level);
            out.notify(
                NotificationRequest::new(
                    player_id.clone(),
                    NotificationKind::GameEvent,
                    "Your snake feels faster!",
                )
                .with_details(json!({
                    "newSpeedInterval": interval.as_millis() as u64,
                    "title": "Speed Increased!",
                })),
            );
        }
    }

    fn check_team_milestone(&self, state: &mut EngineState, out: &mut Outbox, team: Team) {
        let score = state.shared.team_score(team);
        let Some(milestone) = self.rules.team_milestone(score) else {
            return;
        };
        if !state.milestones.record(team, milestone) {
            return;
        }

        let shout = team.as_str().to_uppercase();
        let to_team = format!("Your team (Team {shout}) reached {milestone} points! Great work!");
        let to_opponents = format!("Team {shout} has just reached {milestone} points! Watch out!");

        for board in state.boards.values() {
            let (message, title) = if board.snake.team == team {
                (&to_team, "Your Team Milestone!")
            } else if board.snake.team == team.opponent() {
                (&to_opponents, "Opponent Team Score Alert!")
            } else {
                continue;
            };
            out.notify(
                NotificationRequest::new(
                    board.snake.id.clone(),
                    NotificationKind::GameEvent,
                    message.clone(),
                )
                .with_details(json!({
                    "achievingTeam": team,
                    "scoreReached": milestone,
                    "title": title,
                })),
            );
        }

        info!(team = %team, milestone, "Team reached score milestone");
    }

    fn defeat_locked(
        &self,
        state: &mut EngineState,
        out: &mut Outbox,
        player_id: &PlayerId,
        reason: DefeatReason,
    ) {
        let Some(board) = state.boards.get_mut(player_id) else {
            return;
        };
        if board.snake.is_defeated {
            return;
        }

        board.snake.is_defeated = true;
        board.is_active = false;
        let name = board.snake.name.clone();
        let team = board.snake.team;
        let score = board.snake.score;
        let level = board.snake.level;

        self.cancel_timer(state, player_id);
        info!(
            player_id = %player_id,
            reason = reason.describe(),
            score,
            level,
            "Player defeated"
        );

        out.send(
            player_id,
            ServerMsg::YouAreDefeated {
                reason,
                final_score: score,
                level_reached: level,
            },
        );
        out.notify(
            NotificationRequest::new(
                player_id.clone(),
                NotificationKind::GameOver,
                format!(
                    "Game Over: {}. Your final score: {score}, Level: {level}.",
                    reason.describe()
                ),
            )
            .with_details(json!({
                "reason": reason.describe(),
                "score": score,
                "level": level,
                "title": "Defeated!",
            })),
        );

        let announcement = format!(
            "{name} (Team {team}) was defeated on their board (Score: {score}, Lvl: {level})."
        );
        for other in state.boards.keys().filter(|id| *id != player_id) {
            out.notify(
                NotificationRequest::new(
                    other.clone(),
                    NotificationKind::PvpEvent,
                    announcement.clone(),
                )
                .with_details(json!({
                    "defeatedPlayerName": name,
                    "team": team,
                    "score": score,
                    "level": level,
                    "title": "Player Defeated",
                })),
            );
        }

        self.broadcast_shared(state, out);
    }

    /// Replace any running loop with one at the level's interval
    fn schedule_ticks(&self, state: &mut EngineState, player_id: &PlayerId, level: u32) {
        self.cancel_timer(state, player_id);

        let interval = self.rules.tick_interval(level);
        let target: Weak<dyn TickTarget> = self.this.clone();
        let handle = self.scheduler.schedule(player_id.clone(), interval, target);
        state.timers.insert(player_id.clone(), handle);

        debug!(
            player_id = %player_id,
            interval_ms = interval.as_millis() as u64,
            level,
            "Tick loop scheduled"
        );
    }

    fn cancel_timer(&self, state: &mut EngineState, player_id: &PlayerId) -> bool {
        match state.timers.remove(player_id) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    fn broadcast_shared(&self, state: &EngineState, out: &mut Outbox) {
        out.broadcast(ServerMsg::SharedState(state.shared.project(&state.boards)));
    }
}

impl TickTarget for SnakeEngine {
    fn tick(&self, player_id: &PlayerId, generation: u64) {
        self.with_state(|state, out| self.tick_locked(state, out, player_id, generation))
    }
}

impl PlayerDirectory for SnakeEngine {
    fn display_name(&self, player_id: &PlayerId) -> Option<String> {
        self.state
            .lock()
            .boards
            .get(player_id)
            .map(|board| board.snake.name.clone())
    }
}

fn joined_message(snake: &Snake) -> ServerMsg {
    ServerMsg::JoinedSuccessfully {
        player_id: snake.id.clone(),
        name: snake.name.clone(),
        team: snake.team,
        color: snake.color.clone(),
    }
}
