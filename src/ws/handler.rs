//! WebSocket upgrade handler

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::util::rate_limit::PlayerRateLimiter;
use crate::ws::hub::IntentHandler;
use crate::ws::protocol::{ClientMsg, PlayerId, ServerMsg};

/// WebSocket upgrade handler; every connection is a fresh anonymous player
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let player_id = PlayerId::generate();
    info!(player_id = %player_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();
    let outbound = state.hub.register(player_id.clone());
    let writer_handle = tokio::spawn(write_loop(player_id.clone(), ws_sink, outbound));

    state.intents.on_connect(&player_id);
    read_loop(&player_id, ws_stream, state.intents.clone()).await;

    // Cleanup on disconnect
    state.hub.unregister(&player_id);
    state.intents.on_disconnect(&player_id);
    writer_handle.abort();

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Hub queue -> WebSocket
async fn write_loop(
    player_id: PlayerId,
    mut ws_sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<ServerMsg>,
) {
    while let Some(msg) = outbound.recv().await {
        if let Err(e) = send_msg(&mut ws_sink, &msg).await {
            debug!(player_id = %player_id, error = %e, "WebSocket send failed");
            break;
        }
    }
    debug!(player_id = %player_id, "Writer stopped");
}

/// WebSocket -> intent handler
async fn read_loop(
    player_id: &PlayerId,
    mut ws_stream: SplitStream<WebSocket>,
    intents: Arc<dyn IntentHandler>,
) {
    let rate_limiter = PlayerRateLimiter::new();

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(player_id = %player_id, "Rate limited input message");
                    continue;
                }

                match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(client_msg) => intents.on_intent(player_id, client_msg),
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMsg) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
