use std::collections::HashMap;

use log::debug;

use crate::error::PlacementError;
use crate::room::{ChatRoom, RoomId};
use crate::user::User;

/// Registry of the live chat rooms and the placement policy over them.
///
/// All mutation goes through the methods below; one controller instance is
/// built at process start and shared by the connection handlers.
#[derive(Debug, Default)]
pub struct ChatRoomController {
    rooms: HashMap<RoomId, ChatRoom>,
}

impl ChatRoomController {
    pub fn new() -> ChatRoomController {
        ChatRoomController {
            rooms: HashMap::new(),
        }
    }

    pub fn room(&self, room_id: &str) -> Option<&ChatRoom> {
        self.rooms.get(room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Place `user` into a room of exactly `capacity`, creating one when no
    /// existing room has a free slot. Among several eligible rooms the
    /// oldest-created one wins, so pairing is deterministic per run.
    ///
    /// Returns the id of the joined room; the caller keeps it to release the
    /// slot on disconnect. A capacity of zero is a configuration error and is
    /// rejected before any room is created.
    pub fn add_user_to_valid_chat_room(
        &mut self,
        user: &mut User,
        capacity: usize,
    ) -> Result<RoomId, PlacementError> {
        if capacity == 0 {
            return Err(PlacementError::InvalidCapacity(capacity));
        }

        // A connection is only placed once, but re-placement must not leave
        // a stale membership behind in the previous room.
        if let Some(current) = user.room_id().map(str::to_owned) {
            self.remove_user_from_room(&current, user);
        }

        let room_id = match self.eligible_room(capacity) {
            Some(room_id) => {
                debug!("chat room reused: {}", room_id);
                room_id
            }
            None => {
                let room = ChatRoom::new(capacity);
                let room_id = room.id().to_owned();
                self.rooms.insert(room_id.clone(), room);
                debug!("chat room created: {}", room_id);
                room_id
            }
        };

        let room = self
            .rooms
            .get_mut(&room_id)
            .expect("selected room is registered");
        if !room.add_user(user) {
            panic!(
                "user {} was refused by room {} chosen for it",
                user.id(),
                room_id
            );
        }
        Ok(room_id)
    }

    /// Release `user`'s slot in `room_id` and retire the room from the
    /// registry once its last member is gone.
    ///
    /// Safe to call for a user that was never placed or with a stale room id;
    /// returns whether a membership was actually released.
    pub fn remove_user_from_room(&mut self, room_id: &str, user: &mut User) -> bool {
        let room = match self.rooms.get_mut(room_id) {
            Some(room) => room,
            None => return false,
        };
        let removed = room.remove_user(user);
        if room.is_empty() {
            self.rooms.remove(room_id);
            debug!("chat room retired: {}", room_id);
        }
        removed
    }

    /// Oldest-created room of the requested capacity with a free slot.
    fn eligible_room(&self, capacity: usize) -> Option<RoomId> {
        self.rooms
            .values()
            .filter(|room| room.capacity() == capacity && room.remaining_capacity() > 0)
            .min_by_key(|room| room.serial())
            .map(|room| room.id().to_owned())
    }
}
