//! In-Memory Room Store
//!
//! Reference implementation of the store contract. Notifications are
//! fanned out over unbounded channels, so a subscriber always observes its
//! own writes (echoes) in the order the store applied them.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

use crate::room::{Room, RoomId, RoomPatch};

use super::{RoomStore, RoomSubscription, RoomUpdate, StoreError};

struct RoomEntry {
    room: Room,
    subscribers: Vec<mpsc::UnboundedSender<RoomUpdate>>,
}

impl RoomEntry {
    /// Push an update to every live subscriber, pruning dropped ones
    fn publish(&mut self, update: RoomUpdate) {
        self.subscribers
            .retain(|tx| tx.send(update.clone()).is_ok());
    }
}

/// In-process room store backed by a map
#[derive(Default)]
pub struct MemoryRoomStore {
    rooms: RwLock<HashMap<RoomId, RoomEntry>>,
}

impl MemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomStore for MemoryRoomStore {
    async fn create(&self, room: Room) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write();
        if rooms.contains_key(&room.room_id) {
            return Err(StoreError::AlreadyExists(room.room_id));
        }
        debug!("Created room {}", room.room_id);
        rooms.insert(
            room.room_id.clone(),
            RoomEntry {
                room,
                subscribers: Vec::new(),
            },
        );
        Ok(())
    }

    async fn get(&self, id: &RoomId) -> Result<Room, StoreError> {
        self.rooms
            .read()
            .get(id)
            .map(|e| e.room.clone())
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn patch(&self, id: &RoomId, patch: RoomPatch) -> Result<(), StoreError> {
        patch.validate()?;

        let mut rooms = self.rooms.write();
        let entry = rooms
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        patch.apply(&mut entry.room);
        let snapshot = entry.room.clone();
        entry.publish(RoomUpdate::Changed(snapshot));
        Ok(())
    }

    async fn delete(&self, id: &RoomId) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write();
        let mut entry = rooms
            .remove(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        debug!("Deleted room {}", id);
        entry.publish(RoomUpdate::Removed);
        Ok(())
    }

    async fn subscribe(&self, id: &RoomId) -> Result<RoomSubscription, StoreError> {
        let mut rooms = self.rooms.write();
        let entry = rooms
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        let (tx, rx) = mpsc::unbounded_channel();
        // Push the full current record on attach
        let _ = tx.send(RoomUpdate::Changed(entry.room.clone()));
        entry.subscribers.push(tx);
        Ok(RoomSubscription::new(rx))
    }
}
