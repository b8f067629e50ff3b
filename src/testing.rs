//! Recording doubles for the client sink and the notifier

use parking_lot::Mutex;

use crate::notify::{Notification, NotificationKind, NotificationRequest, Notifier};
use crate::ws::hub::ClientSink;
use crate::ws::protocol::{PlayerId, ServerMsg};

#[derive(Debug, Clone)]
pub enum Sent {
    To(PlayerId, ServerMsg),
    Broadcast(ServerMsg),
}

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Sent>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    /// Messages addressed to one player (broadcasts excluded)
    pub fn to(&self, player_id: &PlayerId) -> Vec<ServerMsg> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::To(id, msg) if id == player_id => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn broadcasts(&self) -> Vec<ServerMsg> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Broadcast(msg) => Some(msg.clone()),
                Sent::To(..) => None,
            })
            .collect()
    }

    pub fn notifications_for(&self, player_id: &PlayerId) -> Vec<Notification> {
        self.to(player_id)
            .into_iter()
            .filter_map(|msg| match msg {
                ServerMsg::Notification(n) => Some(n),
                _ => None,
            })
            .collect()
    }
}

impl ClientSink for RecordingSink {
    fn send_to(&self, player_id: &PlayerId, msg: ServerMsg) {
        self.sent.lock().push(Sent::To(player_id.clone(), msg));
    }

    fn broadcast(&self, msg: ServerMsg) {
        self.sent.lock().push(Sent::Broadcast(msg));
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    requests: Mutex<Vec<NotificationRequest>>,
}

impl RecordingNotifier {
    pub fn requests(&self) -> Vec<NotificationRequest> {
        self.requests.lock().clone()
    }

    pub fn clear(&self) {
        self.requests.lock().clear();
    }

    pub fn for_target(&self, player_id: &PlayerId) -> Vec<NotificationRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| &r.target_id == player_id)
            .cloned()
            .collect()
    }

    pub fn of_kind(&self, kind: NotificationKind) -> Vec<NotificationRequest> {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, request: NotificationRequest) {
        self.requests.lock().push(request);
    }
}
