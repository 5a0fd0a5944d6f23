use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tokio::sync::mpsc;
use warp::ws::Message;

/// Identifies one websocket session for the lifetime of the connection.
pub type SessionId = usize;

/// Named broadcast groups: channel name -> senders of the subscribed sessions.
///
/// Groups are created on first join and dropped as soon as the last
/// subscriber leaves, so the table never outgrows the set of live rooms.
#[derive(Debug, Default)]
pub struct ChannelMap {
    channels: Mutex<HashMap<String, HashMap<SessionId, mpsc::UnboundedSender<Message>>>>,
}

impl ChannelMap {
    fn join(&self, channel: &str, id: SessionId, tx: mpsc::UnboundedSender<Message>) {
        self.channels
            .lock()
            .unwrap()
            .entry(channel.to_owned())
            .or_default()
            .insert(id, tx);
    }

    fn leave(&self, channel: &str, id: SessionId) {
        let mut channels = self.channels.lock().unwrap();
        if let Some(subscribers) = channels.get_mut(channel) {
            subscribers.remove(&id);
            if subscribers.is_empty() {
                channels.remove(channel);
            }
        }
    }

    /// Send `msg` to every subscriber of `channel` except the sender itself.
    pub fn broadcast(&self, channel: &str, from: SessionId, msg: Message) {
        if let Some(subscribers) = self.channels.lock().unwrap().get(channel) {
            for (&id, tx) in subscribers.iter() {
                if id != from {
                    if let Err(_disconnected) = tx.send(msg.clone()) {
                        // The tx is disconnected, the session's own cleanup
                        // path removes it, nothing more to do here.
                    }
                }
            }
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.lock().unwrap().len()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels
            .lock()
            .unwrap()
            .get(channel)
            .map_or(0, HashMap::len)
    }
}

/// Handle to one connected session: its id, its outbound sender, and the
/// channel table it can attach to. This is the only surface the membership
/// core uses to talk to the transport.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    tx: mpsc::UnboundedSender<Message>,
    channels: Arc<ChannelMap>,
}

impl SessionHandle {
    pub fn new(
        id: SessionId,
        tx: mpsc::UnboundedSender<Message>,
        channels: Arc<ChannelMap>,
    ) -> SessionHandle {
        SessionHandle { id, tx, channels }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Attach this session's sender to the named broadcast group.
    pub fn join(&self, channel: &str) {
        self.channels.join(channel, self.id, self.tx.clone());
    }

    /// Detach this session from the named broadcast group.
    pub fn leave(&self, channel: &str) {
        self.channels.leave(channel, self.id);
    }
}
