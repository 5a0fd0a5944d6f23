use std::{
    collections::HashSet,
    sync::atomic::{AtomicU64, Ordering},
};

use uuid::Uuid;

use crate::user::User;

/// Chat rooms are addressed by id through the controller's registry.
pub type RoomId = String;

/// Prefix that marks an identifier as issued by this server for a chat room.
pub const ROOM_ID_PREFIX: &str = "room-";

/// Creation-order counter, used to keep room selection deterministic.
static NEXT_ROOM_SERIAL: AtomicU64 = AtomicU64::new(1);

/// A bounded group of users relaying messages to each other.
///
/// Membership moves between empty, partially filled and full purely through
/// `add_user`/`remove_user`; the member set never exceeds `capacity`.
#[derive(Debug)]
pub struct ChatRoom {
    id: RoomId,
    serial: u64,
    capacity: usize,
    members: HashSet<Uuid>,
}

impl ChatRoom {
    /// Create an empty room holding at most `capacity` members, with a fresh
    /// namespaced id.
    pub fn new(capacity: usize) -> ChatRoom {
        ChatRoom {
            id: format!("{}{}", ROOM_ID_PREFIX, Uuid::new_v4()),
            serial: NEXT_ROOM_SERIAL.fetch_add(1, Ordering::Relaxed),
            capacity,
            members: HashSet::new(),
        }
    }

    /// Whether `id` has the shape of an id this server issues for chat
    /// rooms: the reserved prefix followed by a UUID. Forged or stale-format
    /// identifiers fail here instead of turning into phantom memberships.
    pub fn is_id_for_chat_room(id: &str) -> bool {
        match id.strip_prefix(ROOM_ID_PREFIX) {
            Some(suffix) => Uuid::parse_str(suffix).is_ok(),
            None => false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn serial(&self) -> u64 {
        self.serial
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity - self.members.len()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.members.contains(&user_id)
    }

    /// Add `user` to this room, joining it to the room's channel.
    ///
    /// Returns false when the room is full. The caller is responsible for
    /// releasing any room the user is currently recorded in first; see
    /// `ChatRoomController::add_user_to_valid_chat_room`.
    pub fn add_user(&mut self, user: &mut User) -> bool {
        if self.is_full() {
            return false;
        }
        if !user.join_chat_room(&self.id) {
            return false;
        }
        self.members.insert(user.id());
        true
    }

    /// Remove `user` from this room and clear the user's own room record,
    /// keeping both sides of the membership relation in step.
    ///
    /// Removing a non-member changes nothing and returns false. Panics if the
    /// member set and the user's record disagree about this room.
    pub fn remove_user(&mut self, user: &mut User) -> bool {
        if !self.members.remove(&user.id()) {
            return false;
        }
        if !user.leave_chat_room(Some(self.id.as_str())) {
            panic!(
                "user {} was a member of room {} but its own record disagrees",
                user.id(),
                self.id
            );
        }
        true
    }
}
