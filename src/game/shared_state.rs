//! Cross-player projection: team scores and the leaderboard

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::ws::protocol::{PlayerId, Team};

use super::model::PlayerBoard;

/// Shared score pool per team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeamScores {
    pub red: u32,
    pub blue: u32,
}

impl TeamScores {
    pub fn get(&self, team: Team) -> u32 {
        match team {
            Team::Red => self.red,
            Team::Blue => self.blue,
        }
    }

    fn get_mut(&mut self, team: Team) -> &mut u32 {
        match team {
            Team::Red => &mut self.red,
            Team::Blue => &mut self.blue,
        }
    }
}

/// Public leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPublicInfo {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub score: u32,
    pub level: u32,
    pub is_defeated: bool,
    pub is_paused: bool,
}

impl PlayerPublicInfo {
    fn from_board(board: &PlayerBoard) -> Self {
        Self {
            id: board.snake.id.clone(),
            name: board.snake.name.clone(),
            team: board.snake.team,
            score: board.snake.score,
            level: board.snake.level,
            is_defeated: board.snake.is_defeated,
            is_paused: board.is_paused,
        }
    }
}

/// Broadcast payload for `game:shared_state`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedState {
    pub team_scores: TeamScores,
    /// Sorted by score, highest first
    pub active_players: Vec<PlayerPublicInfo>,
}

/// Owns the team scores and derives the leaderboard from the board map.
///
/// Scores only grow; nothing in the server resets them.
#[derive(Debug, Default)]
pub struct SharedStateAggregator {
    scores: TeamScores,
}

impl SharedStateAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add points to a team, returning its new total
    pub fn award(&mut self, team: Team, points: u32) -> u32 {
        let score = self.scores.get_mut(team);
        *score = score.saturating_add(points);
        *score
    }

    pub fn team_score(&self, team: Team) -> u32 {
        self.scores.get(team)
    }

    /// Recompute the full projection; reads boards, never mutates them
    pub fn project(&self, boards: &HashMap<PlayerId, PlayerBoard>) -> SharedState {
        let mut active_players: Vec<PlayerPublicInfo> =
            boards.values().map(PlayerPublicInfo::from_board).collect();
        // Highest score first; ties by id so the order is stable across projections
        active_players.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.id.cmp(&b.id)));

        SharedState {
            team_scores: self.scores,
            active_players,
        }
    }
}

/// Team score milestones that have already been announced
#[derive(Debug, Default)]
pub struct MilestoneLedger {
    red: BTreeSet<u32>,
    blue: BTreeSet<u32>,
}

impl MilestoneLedger {
    /// Record a milestone; false when it was already announced
    pub fn record(&mut self, team: Team, milestone: u32) -> bool {
        match team {
            Team::Red => self.red.insert(milestone),
            Team::Blue => self.blue.insert(milestone),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::model::Snake;
    use crate::game::rules::GameRules;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn board(id: &str, team: Team, score: u32) -> PlayerBoard {
        let rules = GameRules::default();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut snake = Snake::spawn(
            PlayerId::new(id),
            id.to_uppercase(),
            "#60DBFB".into(),
            team,
            &rules,
            &mut rng,
        );
        snake.score = score;
        PlayerBoard::new(snake, &rules)
    }

    #[test]
    fn projection_is_sorted_by_score() {
        let mut boards = HashMap::new();
        for (id, team, score) in [("a", Team::Red, 10), ("b", Team::Blue, 40), ("c", Team::Red, 20)] {
            boards.insert(PlayerId::new(id), board(id, team, score));
        }
        boards.get_mut(&PlayerId::new("c")).unwrap().is_paused = true;

        let state = SharedStateAggregator::new().project(&boards);
        let scores: Vec<u32> = state.active_players.iter().map(|p| p.score).collect();
        assert_eq!(scores, vec![40, 20, 10]);
        assert!(state.active_players[1].is_paused);
        assert_eq!(state.active_players[0].name, "B");
    }

    #[test]
    fn equal_scores_are_ordered_by_id() {
        let ids = ["m", "c", "x", "a", "q"];
        let mut boards = HashMap::new();
        for id in ids {
            boards.insert(PlayerId::new(id), board(id, Team::Red, 30));
        }
        boards.insert(PlayerId::new("z"), board("z", Team::Blue, 50));

        let agg = SharedStateAggregator::new();
        let first = agg.project(&boards);
        let order: Vec<&str> = first.active_players.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(order, vec!["z", "a", "c", "m", "q", "x"]);

        for _ in 0..10 {
            let mut rebuilt = HashMap::new();
            for (id, board) in &boards {
                rebuilt.insert(id.clone(), board.clone());
            }
            assert_eq!(agg.project(&rebuilt), first);
        }
    }

    #[test]
    fn award_accumulates_per_team() {
        let mut agg = SharedStateAggregator::new();
        assert_eq!(agg.award(Team::Red, 10), 10);
        assert_eq!(agg.award(Team::Red, 50), 60);
        assert_eq!(agg.award(Team::Blue, 10), 10);
        assert_eq!(
            agg.project(&HashMap::new()).team_scores,
            TeamScores { red: 60, blue: 10 }
        );
    }

    #[test]
    fn ledger_records_each_milestone_once() {
        let mut ledger = MilestoneLedger::default();
        assert!(ledger.record(Team::Red, 200));
        assert!(!ledger.record(Team::Red, 200));
        assert!(ledger.record(Team::Blue, 200));
        assert!(!ledger.record(Team::Blue, 200));
        assert!(ledger.record(Team::Red, 400));
    }

    #[test]
    fn serializes_camel_case() {
        let state = SharedStateAggregator::new().project(&HashMap::new());
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json["teamScores"]["red"], 0);
        assert!(json["activePlayers"].as_array().unwrap().is_empty());
    }
}
