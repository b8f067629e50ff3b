//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::app::AppState;
use crate::game::TeamScores;
use crate::util::time::uptime_secs;
use crate::ws::handler::ws_handler;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.client_origin);

    Router::new()
        .route("/health", get(health_handler))
        .route("/ws", get(ws_handler))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// `*` allows any origin; otherwise a comma-separated allow list
fn cors_layer(client_origin: &str) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    if client_origin.trim() == "*" {
        return base.allow_origin(AllowOrigin::any());
    }

    let allowed_origins: Vec<HeaderValue> = client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();

    base.allow_origin(allowed_origins).allow_credentials(true)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    active_players: usize,
    connected_clients: usize,
    team_scores: TeamScores,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_players: state.engine.player_count(),
        connected_clients: state.hub.connected(),
        team_scores: state.engine.shared_state().team_scores,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ws::protocol::{PlayerId, Team};

    fn state() -> AppState {
        AppState::new(Config::from_lookup(|_| None).unwrap())
    }

    #[tokio::test]
    async fn health_reports_players_and_clients() {
        let state = state();
        let _rx = state.hub.register(PlayerId::new("a"));
        state.engine.join(&PlayerId::new("a"), "Ada", Team::Red);

        let Json(health) = health_handler(State(state)).await;

        assert_eq!(health.status, "ok");
        assert_eq!(health.active_players, 1);
        assert_eq!(health.connected_clients, 1);
        assert_eq!(health.team_scores.red, 0);
    }

    #[tokio::test]
    async fn router_builds_for_any_origin_and_allow_lists() {
        let _ = build_router(state());

        let mut config = Config::from_lookup(|_| None).unwrap();
        config.client_origin = "http://localhost:3000, https://snake.example".to_string();
        let _ = build_router(AppState::new(config));
    }
}
