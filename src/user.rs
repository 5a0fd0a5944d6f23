use std::time::SystemTime;

use uuid::Uuid;

use crate::room::{ChatRoom, RoomId};
use crate::transport::SessionHandle;

/// One anonymous connected client session.
///
/// A user is a member of at most one chat room at a time; the room is stored
/// by id and resolved through the controller's registry, never as a live
/// reference.
#[derive(Debug)]
pub struct User {
    id: Uuid,
    created_at: SystemTime,
    room_id: Option<RoomId>,
    session: SessionHandle,
}

impl User {
    /// Create a new user for `session` with a fresh random id and the current
    /// time as its creation timestamp. The user starts out roomless.
    pub fn create(session: SessionHandle) -> User {
        User {
            id: Uuid::new_v4(),
            created_at: SystemTime::now(),
            room_id: None,
            session,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    /// Whether the user is in `room_id`, compared exactly. With `None`,
    /// whether the user is in any room at all.
    pub fn is_in_chat_room(&self, room_id: Option<&str>) -> bool {
        match room_id {
            Some(room_id) => self.room_id.as_deref() == Some(room_id),
            None => self.room_id.is_some(),
        }
    }

    /// Join the chat room identified by `room_id`, leaving the current room
    /// first so the user is never in two rooms, even transiently.
    ///
    /// Returns false when `room_id` is not a chat room id. Panics if the user
    /// cannot leave its own current room, which would mean the membership
    /// records are corrupt.
    pub fn join_chat_room(&mut self, room_id: &str) -> bool {
        if !ChatRoom::is_id_for_chat_room(room_id) {
            return false;
        }
        if !self.leave_chat_room(None) {
            panic!("user {}: could not leave current chat room", self.id);
        }
        self.room_id = Some(room_id.to_owned());
        self.session.join(room_id);
        true
    }

    /// Leave the current room, or `room_id` if given.
    ///
    /// Returns false only when `room_id` is given and is not the current
    /// room. Leaving while roomless returns true, so duplicate disconnect
    /// delivery is safe.
    pub fn leave_chat_room(&mut self, room_id: Option<&str>) -> bool {
        if let Some(requested) = room_id {
            if self.room_id.as_deref() != Some(requested) {
                return false;
            }
        }
        let current = match self.room_id.take() {
            Some(current) => current,
            None => return true,
        };
        self.session.leave(&current);
        true
    }
}
