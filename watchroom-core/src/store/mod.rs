//! Room State Store Contract
//!
//! The store is an external collaborator: a mutable, versionless record per
//! room, readable via push subscription and writable via field-level merge
//! patches. Embeddings plug in whatever backend replicates the record; the
//! crate ships an in-memory implementation for tests and single-process use.

mod memory;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::room::{PatchError, Room, RoomId, RoomPatch};

pub use memory::MemoryRoomStore;

/// Store-level failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    #[error("room {0} not found")]
    NotFound(RoomId),

    #[error("patch rejected: {0}")]
    InvalidPatch(#[from] PatchError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A push notification about a subscribed room
#[derive(Debug, Clone)]
pub enum RoomUpdate {
    /// The full current record, delivered on attach and on every change
    Changed(Room),
    /// The record was deleted; terminal for this subscription
    Removed,
}

/// Handle to a room subscription. Dropping it unsubscribes.
pub struct RoomSubscription {
    rx: mpsc::UnboundedReceiver<RoomUpdate>,
}

impl RoomSubscription {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<RoomUpdate>) -> Self {
        Self { rx }
    }

    /// Receive the next update. Returns `None` once the subscription ends
    /// (room removed and drained, or store shut down).
    pub async fn recv(&mut self) -> Option<RoomUpdate> {
        self.rx.recv().await
    }
}

/// The room state store contract.
///
/// Updates for a given subscriber arrive in the order the store applied
/// them; no ordering is guaranteed across different clients' writes.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Create a room record. Fails if the id is already taken; a create
    /// must never silently overwrite an existing record.
    async fn create(&self, room: Room) -> Result<(), StoreError>;

    /// Read the current record
    async fn get(&self, id: &RoomId) -> Result<Room, StoreError>;

    /// Merge the named fields into the record. Unnamed fields are untouched.
    async fn patch(&self, id: &RoomId, patch: RoomPatch) -> Result<(), StoreError>;

    /// Delete the record, notifying all subscribers with [`RoomUpdate::Removed`]
    async fn delete(&self, id: &RoomId) -> Result<(), StoreError>;

    /// Subscribe to the record. The full current record is pushed
    /// immediately on attach and again after every change.
    async fn subscribe(&self, id: &RoomId) -> Result<RoomSubscription, StoreError>;
}
