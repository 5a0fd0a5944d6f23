use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use futures::{SinkExt, StreamExt, TryFutureExt};
use log::{error, info, warn};
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use warp::ws::{Message, WebSocket};

pub mod api;
mod controller;
mod error;
mod room;
mod transport;
mod user;

pub use controller::ChatRoomController;
pub use error::PlacementError;
pub use room::{ChatRoom, RoomId, ROOM_ID_PREFIX};
pub use transport::{ChannelMap, SessionHandle, SessionId};
pub use user::User;

/// Our global unique session id counter.
static NEXT_SESSION_ID: AtomicUsize = AtomicUsize::new(1);

/// Shared state handed to every connection handler.
///
/// The controller is the single writer over room membership; each
/// connect/disconnect mutation runs to completion under one write
/// acquisition, with no await inside it, so a placement never observes a
/// half-applied change from another session.
#[derive(Clone)]
pub struct ServerState {
    pub controller: Arc<RwLock<ChatRoomController>>,
    pub channels: Arc<ChannelMap>,
    pub room_capacity: usize,
}

impl ServerState {
    pub fn new(room_capacity: usize) -> ServerState {
        ServerState {
            controller: Arc::new(RwLock::new(ChatRoomController::new())),
            channels: Arc::new(ChannelMap::default()),
            room_capacity,
        }
    }
}

pub async fn user_connected(ws: WebSocket, state: ServerState) {
    // Use a counter to assign a new unique ID for this session.
    let session_id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);

    // Split the socket into a sender and receiver of messages.
    let (mut user_ws_tx, mut user_ws_rx) = ws.split();

    // Use an unbounded channel to handle buffering and flushing of messages
    // to the websocket...
    let (tx, rx) = mpsc::unbounded_channel();
    let mut rx = UnboundedReceiverStream::new(rx);

    tokio::task::spawn(async move {
        while let Some(message) = rx.next().await {
            user_ws_tx
                .send(message)
                .unwrap_or_else(|e| {
                    warn!("websocket send error: {}", e);
                })
                .await;
        }
    });

    let session = SessionHandle::new(session_id, tx, state.channels.clone());
    let mut user = User::create(session);
    info!("new chat user: {}", user.id());

    // Find or create a room for the user.
    let placement = state
        .controller
        .write()
        .await
        .add_user_to_valid_chat_room(&mut user, state.room_capacity);
    let room_id = match placement {
        Ok(room_id) => room_id,
        Err(e) => {
            error!("could not place user {}: {}", user.id(), e);
            return;
        }
    };

    // Every time the user sends a message, relay it to the rest of the
    // room...
    while let Some(result) = user_ws_rx.next().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("websocket error(session={}): {}", session_id, e);
                break;
            }
        };
        user_message(&user, msg, &state.channels);
    }

    // user_ws_rx stream will keep processing as long as the user stays
    // connected. Once they disconnect, then...
    user_disconnected(&mut user, &room_id, &state).await;
}

fn user_message(user: &User, msg: Message, channels: &ChannelMap) {
    // Skip any non-Text messages...
    let msg = if let Ok(s) = msg.to_str() {
        s
    } else {
        return;
    };

    let room_id = match user.room_id() {
        Some(room_id) => room_id,
        None => return,
    };

    let new_msg = format!("<User#{}>: {}", user.id(), msg);
    channels.broadcast(room_id, user.session().id(), Message::text(new_msg));
}

async fn user_disconnected(user: &mut User, room_id: &str, state: &ServerState) {
    match user.created_at().elapsed() {
        Ok(age) => info!(
            "good bye user: {} (connected for {})",
            user.id(),
            humantime::format_duration(age)
        ),
        Err(_) => info!("good bye user: {}", user.id()),
    }

    // Disconnect releases the slot exactly once; leave is idempotent, so a
    // duplicate delivery changes nothing.
    state
        .controller
        .write()
        .await
        .remove_user_from_room(room_id, user);
}
