//! Routes validated client intents to the engine and the social relay

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::game::SnakeEngine;
use crate::social::SocialRelay;
use crate::ws::hub::{ClientSink, IntentHandler};
use crate::ws::protocol::{ClientMsg, PlayerId, ServerMsg};

pub struct GameDispatcher {
    engine: Arc<SnakeEngine>,
    relay: SocialRelay,
    sink: Arc<dyn ClientSink>,
}

impl GameDispatcher {
    pub fn new(engine: Arc<SnakeEngine>, relay: SocialRelay, sink: Arc<dyn ClientSink>) -> Self {
        Self {
            engine,
            relay,
            sink,
        }
    }
}

impl IntentHandler for GameDispatcher {
    fn on_connect(&self, player_id: &PlayerId) {
        info!(player_id = %player_id, "Client connected");
        self.sink
            .send_to(player_id, ServerMsg::SharedState(self.engine.shared_state()));
    }

    fn on_intent(&self, player_id: &PlayerId, msg: ClientMsg) {
        if let Err(e) = msg.validate() {
            warn!(player_id = %player_id, error = %e, "Rejected client message");
            let reply = match msg {
                ClientMsg::JoinGame { .. } => ServerMsg::JoinFailed {
                    message: e.to_string(),
                },
                _ => ServerMsg::error(e.to_string()),
            };
            self.sink.send_to(player_id, reply);
            return;
        }

        match msg {
            ClientMsg::JoinGame {
                name,
                preferred_team,
            } => {
                let outcome = self.engine.join(player_id, &name, preferred_team);
                if !outcome.accepted {
                    let message = outcome
                        .message
                        .unwrap_or_else(|| "Could not join the game.".to_string());
                    self.sink.send_to(player_id, ServerMsg::JoinFailed { message });
                } else if let Some(message) = outcome.message {
                    self.sink.send_to(player_id, ServerMsg::info(message));
                }
            }
            ClientMsg::StartMyGame => self.engine.start(player_id),
            ClientMsg::PauseMyGame => self.engine.pause(player_id),
            ClientMsg::ChangeDirection { direction } => {
                self.engine.change_direction(player_id, direction)
            }
            ClientMsg::RequestRetry => self.sink.send_to(
                player_id,
                ServerMsg::info("To retry, click 'Join / Retry Game' again with your details."),
            ),
            ClientMsg::SendFriendRequest {
                to_player_id,
                from_player_name,
            } => {
                // Failures were already reported to the sender
                let _ = self.relay.send_friend_request(
                    player_id,
                    from_player_name.as_deref(),
                    &to_player_id,
                );
            }
            ClientMsg::AcceptFriendRequest {
                request_from_player_id,
            } => {
                let _ = self
                    .relay
                    .accept_friend_request(player_id, &request_from_player_id);
            }
        }
    }

    fn on_disconnect(&self, player_id: &PlayerId) {
        debug!(player_id = %player_id, "Client disconnected");
        self.engine.disconnect(player_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameRules, ManualScheduler};
    use crate::notify::NotificationKind;
    use crate::testing::{RecordingNotifier, RecordingSink};
    use crate::ws::protocol::{Direction, Team};

    struct Fixture {
        dispatcher: GameDispatcher,
        engine: Arc<SnakeEngine>,
        sink: Arc<RecordingSink>,
        notifier: Arc<RecordingNotifier>,
        scheduler: ManualScheduler,
    }

    fn fixture() -> Fixture {
        let sink = Arc::new(RecordingSink::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let scheduler = ManualScheduler::new();
        let engine = SnakeEngine::new(
            GameRules::default(),
            sink.clone(),
            notifier.clone(),
            Arc::new(scheduler.clone()),
            Some(9),
        );
        let relay = SocialRelay::new(engine.clone(), notifier.clone());
        Fixture {
            dispatcher: GameDispatcher::new(engine.clone(), relay, sink.clone()),
            engine,
            sink,
            notifier,
            scheduler,
        }
    }

    fn join(name: &str, team: Team) -> ClientMsg {
        ClientMsg::JoinGame {
            name: name.to_string(),
            preferred_team: team,
        }
    }

    #[test]
    fn connect_sends_current_shared_state() {
        let f = fixture();
        let player = PlayerId::new("p1");

        f.dispatcher.on_connect(&player);

        assert!(matches!(f.sink.to(&player)[0], ServerMsg::SharedState(_)));
    }

    #[test]
    fn invalid_join_answers_join_failed() {
        let f = fixture();
        let player = PlayerId::new("p1");

        f.dispatcher.on_intent(&player, join("   ", Team::Red));
        f.dispatcher.on_intent(&player, join("abcdefghijklmnopqrstu", Team::Red));

        let sent = f.sink.to(&player);
        assert_eq!(sent.len(), 2);
        assert!(sent
            .iter()
            .all(|m| matches!(m, ServerMsg::JoinFailed { .. })));
        assert!(!f.engine.has_board(&player));
    }

    #[test]
    fn invalid_friend_request_answers_error() {
        let f = fixture();
        let player = PlayerId::new("p1");

        f.dispatcher.on_intent(
            &player,
            ClientMsg::SendFriendRequest {
                to_player_id: PlayerId::new(" "),
                from_player_name: None,
            },
        );

        assert!(matches!(f.sink.to(&player)[0], ServerMsg::Error { .. }));
        assert!(f.notifier.requests().is_empty());
    }

    #[test]
    fn join_start_and_steer_reach_the_engine() {
        let f = fixture();
        let player = PlayerId::new("p1");

        f.dispatcher.on_intent(&player, join("Ada", Team::Blue));
        f.dispatcher.on_intent(&player, ClientMsg::StartMyGame);
        f.dispatcher.on_intent(
            &player,
            ClientMsg::ChangeDirection {
                direction: Direction::Up,
            },
        );

        assert!(f.engine.has_board(&player));
        assert!(f.scheduler.is_scheduled(&player));
        assert!(f.scheduler.fire(&player));

        f.dispatcher.on_intent(&player, ClientMsg::PauseMyGame);
        assert!(!f.scheduler.is_scheduled(&player));
    }

    #[test]
    fn rejoin_message_is_forwarded_as_info() {
        let f = fixture();
        let player = PlayerId::new("p1");

        f.dispatcher.on_intent(&player, join("Ada", Team::Blue));
        f.dispatcher.on_intent(&player, join("Ada", Team::Blue));

        assert!(matches!(f.sink.to(&player).last(), Some(ServerMsg::Info { .. })));
    }

    #[test]
    fn retry_request_gets_a_hint() {
        let f = fixture();
        let player = PlayerId::new("p1");

        f.dispatcher.on_intent(&player, ClientMsg::RequestRetry);

        assert!(matches!(
            &f.sink.to(&player)[0],
            ServerMsg::Info { message } if message.contains("Join / Retry Game")
        ));
    }

    #[test]
    fn friend_flow_goes_through_the_relay() {
        let f = fixture();
        let alice = PlayerId::new("alice");
        let bob = PlayerId::new("bob");
        f.dispatcher.on_intent(&alice, join("Alice", Team::Red));
        f.dispatcher.on_intent(&bob, join("Bob", Team::Blue));

        f.dispatcher.on_intent(
            &alice,
            ClientMsg::SendFriendRequest {
                to_player_id: bob.clone(),
                from_player_name: None,
            },
        );
        f.dispatcher.on_intent(
            &bob,
            ClientMsg::AcceptFriendRequest {
                request_from_player_id: alice.clone(),
            },
        );

        assert_eq!(f.notifier.of_kind(NotificationKind::FriendRequest).len(), 1);
        assert_eq!(f.notifier.of_kind(NotificationKind::FriendAccepted).len(), 1);
        assert_eq!(f.notifier.of_kind(NotificationKind::SocialInfo).len(), 1);
    }

    #[test]
    fn disconnect_removes_the_board() {
        let f = fixture();
        let player = PlayerId::new("p1");
        f.dispatcher.on_intent(&player, join("Ada", Team::Red));
        f.dispatcher.on_intent(&player, ClientMsg::StartMyGame);

        f.dispatcher.on_disconnect(&player);

        assert!(!f.engine.has_board(&player));
        assert!(!f.scheduler.is_scheduled(&player));
    }
}
