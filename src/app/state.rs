//! Application state shared across routes

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::Config;
use crate::game::{SnakeEngine, TokioScheduler};
use crate::notify::NotificationGate;
use crate::social::SocialRelay;
use crate::store::{
    GameResultStore, MemoryStore, NotificationStore, PreferenceStore, SupabaseClient,
    SupabaseGameResultStore, SupabaseNotificationStore, SupabasePreferenceStore,
};
use crate::ws::hub::{ClientHub, IntentHandler};

use super::dispatch::GameDispatcher;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Arc<ClientHub>,
    pub engine: Arc<SnakeEngine>,
    pub intents: Arc<dyn IntentHandler>,
    /// Not written by any game flow yet
    pub game_results: Arc<dyn GameResultStore>,
}

struct Stores {
    preferences: Arc<dyn PreferenceStore>,
    notifications: Arc<dyn NotificationStore>,
    game_results: Arc<dyn GameResultStore>,
}

impl Stores {
    fn from_config(config: &Config) -> Self {
        match &config.supabase {
            Some(supabase) => {
                info!(url = %supabase.url, "Using Supabase-backed stores");
                let client = SupabaseClient::new(supabase);
                Self {
                    preferences: Arc::new(SupabasePreferenceStore::new(client.clone())),
                    notifications: Arc::new(SupabaseNotificationStore::new(client.clone())),
                    game_results: Arc::new(SupabaseGameResultStore::new(client)),
                }
            }
            None => {
                warn!("Supabase not configured, notifications are kept in memory");
                let memory = Arc::new(MemoryStore::new());
                Self {
                    preferences: memory.clone(),
                    notifications: memory.clone(),
                    game_results: memory,
                }
            }
        }
    }
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let stores = Stores::from_config(&config);

        let hub = Arc::new(ClientHub::new());

        // Notifications are persisted first, then pushed through the hub
        let gate = Arc::new(NotificationGate::new(
            stores.preferences,
            stores.notifications,
            hub.clone(),
        ));

        let engine = SnakeEngine::new(
            config.rules.clone(),
            hub.clone(),
            gate.clone(),
            Arc::new(TokioScheduler::new()),
            config.game_seed,
        );

        let relay = SocialRelay::new(engine.clone(), gate);
        let intents = Arc::new(GameDispatcher::new(engine.clone(), relay, hub.clone()));

        Self {
            config,
            hub,
            engine,
            intents,
            game_results: stores.game_results,
        }
    }
}
