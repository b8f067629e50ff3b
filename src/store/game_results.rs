//! Finished game results backed by the `game_results` table

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::supabase::SupabaseClient;
use super::{GameResultStore, StoreError};

/// Team score outcome of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub game_type: String,
    pub winner_info: Option<String>,
    pub red_score: u32,
    pub blue_score: u32,
    pub played_at: DateTime<Utc>,
}

impl GameResult {
    pub fn new(
        game_type: impl Into<String>,
        winner_info: Option<String>,
        red_score: u32,
        blue_score: u32,
    ) -> Self {
        Self {
            id: None,
            game_type: game_type.into(),
            winner_info,
            red_score,
            blue_score,
            played_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct SupabaseGameResultStore {
    client: SupabaseClient,
}

impl SupabaseGameResultStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

impl GameResultStore for SupabaseGameResultStore {
    fn save(&self, result: GameResult) -> BoxFuture<'_, Result<GameResult, StoreError>> {
        async move {
            let saved: GameResult = self.client.insert("game_results", &result).await?;
            Ok::<_, StoreError>(saved)
        }
        .boxed()
    }
}
