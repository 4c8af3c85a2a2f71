//! Room Membership Tracking
//!
//! Maintains this client's presence entry in the shared record,
//! independently of playback sync. Refresh failures never affect playback.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::room::{now_ms, Participant, ParticipantId, RoomId, RoomPatch};
use crate::store::{RoomStore, StoreError};

/// How often the liveness entry is refreshed
pub const PRESENCE_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// After how long without a refresh an entry counts as stale (three missed
/// refresh intervals)
pub const PRESENCE_STALE_TIMEOUT_MS: u64 = 90_000;

/// Keeps `participants[self]` alive in the room record
pub struct PresenceTracker {
    store: Arc<dyn RoomStore>,
    room_id: RoomId,
    self_id: ParticipantId,
    display_name: String,
    joined_at: u64,
}

impl PresenceTracker {
    pub fn new(
        store: Arc<dyn RoomStore>,
        room_id: RoomId,
        self_id: ParticipantId,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            room_id,
            self_id,
            display_name: display_name.into(),
            joined_at: now_ms(),
        }
    }

    fn entry(&self) -> Participant {
        Participant {
            display_name: self.display_name.clone(),
            joined_at: self.joined_at,
            last_seen: now_ms(),
        }
    }

    /// Insert (or re-assert) our presence entry
    pub async fn announce(&self) -> Result<(), StoreError> {
        debug!("Announcing presence in {}", self.room_id);
        self.store
            .patch(
                &self.room_id,
                RoomPatch::new().upsert_participant(self.self_id.clone(), self.entry()),
            )
            .await
    }

    /// Periodic liveness refresh; bumps `last_seen` only
    pub async fn refresh(&self) -> Result<(), StoreError> {
        self.store
            .patch(
                &self.room_id,
                RoomPatch::new().upsert_participant(self.self_id.clone(), self.entry()),
            )
            .await
    }

    /// Remove our presence entry when leaving. Holding playback authority
    /// is handed to the longest-present remaining participant in the same
    /// patch, so `host_id` never names a departed participant.
    pub async fn withdraw(&self) -> Result<(), StoreError> {
        debug!("Withdrawing presence from {}", self.room_id);
        let room = self.store.get(&self.room_id).await?;
        let mut patch = RoomPatch::new().remove_participant(self.self_id.clone());
        if room.is_host(&self.self_id) {
            patch = match room.successor_host(&self.self_id) {
                Some(next) => patch.host(next),
                None => patch.clear_host(),
            };
        }
        self.store.patch(&self.room_id, patch).await
    }
}
