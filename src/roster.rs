//! Room roster tracking from presence events.

use crate::protocol::{InboundFrame, RoomId};
use rand::Rng;
use rand::seq::IndexedRandom as _;
use std::collections::{BTreeSet, HashMap};

/// Bucket for `enter` events that arrive without a room id.
const UNSCOPED: &str = "";

/// Usernames currently present, per room.
#[derive(Debug, Default)]
pub struct Roster {
    rooms: HashMap<String, BTreeSet<String>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a presence frame. Other frame types are ignored.
    pub fn apply(&mut self, frame: &InboundFrame) {
        match frame {
            InboundFrame::LoadUsers { data } => {
                self.rooms = data
                    .iter()
                    .map(|(room, users)| {
                        let names = users
                            .iter()
                            .filter_map(|user| user.name.clone())
                            .filter(|name| !name.is_empty())
                            .collect();
                        (room.clone(), names)
                    })
                    .collect();
            }
            InboundFrame::Enter { data, room_id } => {
                if let Some(name) = data.name.as_deref().filter(|name| !name.is_empty()) {
                    self.enter(name, room_id.as_ref());
                }
            }
            InboundFrame::Exit { data, room_id } => {
                if let Some(name) = data.name.as_deref() {
                    self.exit(name, room_id.as_ref());
                }
            }
            _ => {}
        }
    }

    pub fn enter(&mut self, name: &str, room_id: Option<&RoomId>) {
        let room = room_id.map(RoomId::to_string).unwrap_or_else(|| UNSCOPED.into());
        self.rooms.entry(room).or_default().insert(name.to_string());
    }

    /// Remove a user from one room, or from every room when no room is given.
    pub fn exit(&mut self, name: &str, room_id: Option<&RoomId>) {
        match room_id {
            Some(room_id) => {
                if let Some(names) = self.rooms.get_mut(&room_id.to_string()) {
                    names.remove(name);
                }
            }
            None => {
                for names in self.rooms.values_mut() {
                    names.remove(name);
                }
            }
        }
    }

    /// Sorted union of all rooms.
    pub fn members(&self) -> BTreeSet<&str> {
        self.rooms
            .values()
            .flat_map(|names| names.iter().map(String::as_str))
            .collect()
    }

    /// Uniform pick across all rooms.
    pub fn random_member<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
        let members: Vec<&str> = self.members().into_iter().collect();
        members.choose(rng).map(|name| name.to_string())
    }

    pub fn clear(&mut self) {
        self.rooms.clear();
    }
}
