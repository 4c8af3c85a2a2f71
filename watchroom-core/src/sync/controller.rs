//! Sync Controller
//!
//! Owns the reconciliation loop between the local player and the shared
//! room record. Remote updates become local player commands; local user
//! intent becomes merge patches on the record. The controller never lets a
//! cycle feed back: commands it issued itself are expected and their
//! echoed player events are swallowed, and reconciliation is a natural
//! no-op once local and remote state agree.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::player::{MediaPlayer, PlayerEvent};
use crate::room::{ParticipantId, Room, RoomId, RoomPatch};
use crate::store::{RoomStore, StoreError};

use super::authority::HostBroadcastGate;

/// Maximum tolerated position discrepancy (seconds) before forcing a local
/// correction. Large enough to ride out network and measurement jitter,
/// small enough to catch genuine desyncs.
pub const DRIFT_THRESHOLD_SECS: f64 = 1.5;

/// Reconciliation failures surfaced to the embedding
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("video URL must not be empty")]
    EmptyVideoUrl,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Ephemeral per-client player bookkeeping; never persisted
#[derive(Debug, Default)]
struct LocalPlayerState {
    /// The user is dragging the scrub bar; inbound corrections and
    /// outbound writes are both suppressed until the seek settles
    seeking: bool,
    /// Source currently loaded into the player
    loaded_url: Option<String>,
    /// Echo flags: the next matching player event was caused by our own
    /// remote-applied command and must not be re-published
    expect_play: bool,
    expect_pause: bool,
    expect_seek: bool,
}

/// Reconciles one client's player with one shared room record
pub struct SyncController {
    store: Arc<dyn RoomStore>,
    player: Arc<dyn MediaPlayer>,
    room_id: RoomId,
    self_id: ParticipantId,
    local: LocalPlayerState,
    gate: HostBroadcastGate,
    /// Last record observed from the store, used for host eligibility
    last_known: Option<Room>,
}

impl SyncController {
    pub fn new(
        store: Arc<dyn RoomStore>,
        player: Arc<dyn MediaPlayer>,
        room_id: RoomId,
        self_id: ParticipantId,
    ) -> Self {
        Self {
            store,
            player,
            room_id,
            self_id,
            local: LocalPlayerState::default(),
            gate: HostBroadcastGate::new(),
            last_known: None,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn self_id(&self) -> &ParticipantId {
        &self.self_id
    }

    /// Whether a user seek gesture is currently in progress
    pub fn is_seeking(&self) -> bool {
        self.local.seeking
    }

    /// Inbound path: bring the local player in line with a room update.
    ///
    /// All failures here are advisory; the next update retries naturally.
    pub async fn apply_remote(&mut self, room: &Room) {
        // 1. Media source
        if !room.current_video_url.is_empty()
            && self.local.loaded_url.as_deref() != Some(room.current_video_url.as_str())
        {
            info!("Loading new source: {}", room.current_video_url);
            match self.player.load(&room.current_video_url).await {
                Ok(()) => self.local.loaded_url = Some(room.current_video_url.clone()),
                // A bad URL set by one participant must not desync us
                // beyond this one failed attempt
                Err(e) => warn!("Media load failed: {}", e),
            }
        }

        // 2. Play/pause flag
        let paused = self.player.is_paused().await;
        if room.is_playing && paused {
            self.local.expect_play = true;
            if let Err(e) = self.player.play().await {
                // Autoplay policy is not ours to enforce; stay paused and
                // resync on the next user interaction
                self.local.expect_play = false;
                debug!("Play command rejected: {}", e);
            }
        } else if !room.is_playing && !paused {
            self.local.expect_pause = true;
            if let Err(e) = self.player.pause().await {
                self.local.expect_pause = false;
                warn!("Pause command failed: {}", e);
            }
        }

        // 3. Position, unless the user is mid-drag
        let target = room.target_position();
        let position = self.player.position().await;
        if !self.local.seeking && (position - target).abs() > DRIFT_THRESHOLD_SECS {
            debug!("Correcting position {:.2}s -> {:.2}s", position, target);
            self.local.expect_seek = true;
            if let Err(e) = self.player.set_position(target).await {
                self.local.expect_seek = false;
                warn!("Position correction failed: {}", e);
            }
        }

        self.last_known = Some(room.clone());
    }

    /// Dispatch a player event, filtering echoes of our own commands
    pub async fn handle_player_event(&mut self, event: PlayerEvent) -> Result<(), SyncError> {
        match event {
            PlayerEvent::Play => {
                if std::mem::take(&mut self.local.expect_play) {
                    debug!("Swallowing echoed play event");
                    return Ok(());
                }
                self.handle_local_play().await
            }
            PlayerEvent::Pause => {
                if std::mem::take(&mut self.local.expect_pause) {
                    debug!("Swallowing echoed pause event");
                    return Ok(());
                }
                self.handle_local_pause().await
            }
            PlayerEvent::SeekStart => {
                // A correction we issued ourselves is not a user drag
                if !self.local.expect_seek {
                    self.handle_local_seek_start();
                }
                Ok(())
            }
            PlayerEvent::SeekEnd { position } => {
                if std::mem::take(&mut self.local.expect_seek) {
                    debug!("Swallowing echoed seek event");
                    return Ok(());
                }
                self.handle_local_seek_end(position).await
            }
            PlayerEvent::TimeUpdate { .. } => Ok(()),
            PlayerEvent::LoadError { message } => {
                warn!("Media load error: {}", message);
                Ok(())
            }
        }
    }

    /// The user started playback
    pub async fn handle_local_play(&mut self) -> Result<(), SyncError> {
        if self.local.seeking {
            return Ok(());
        }
        let position = self.player.position().await;
        self.write(
            RoomPatch::new()
                .playing(true)
                .position(position)
                .host(self.self_id.clone()),
        )
        .await
    }

    /// The user paused playback
    pub async fn handle_local_pause(&mut self) -> Result<(), SyncError> {
        if self.local.seeking {
            return Ok(());
        }
        let position = self.player.position().await;
        self.write(
            RoomPatch::new()
                .playing(false)
                .position(position)
                .host(self.self_id.clone()),
        )
        .await
    }

    /// The user grabbed the scrub bar; suppress sync until the seek settles
    pub fn handle_local_seek_start(&mut self) {
        self.local.seeking = true;
    }

    /// The user released the scrub bar at `position`
    pub async fn handle_local_seek_end(&mut self, position: f64) -> Result<(), SyncError> {
        self.local.seeking = false;
        let playing = !self.player.is_paused().await;
        self.write(
            RoomPatch::new()
                .position(position)
                .seek_target(position)
                .playing(playing)
                .host(self.self_id.clone()),
        )
        .await
    }

    /// The user swapped the video source
    pub async fn handle_local_video_change(&mut self, url: &str) -> Result<(), SyncError> {
        if url.trim().is_empty() {
            return Err(SyncError::EmptyVideoUrl);
        }
        if self.local.seeking {
            return Ok(());
        }
        self.write(
            RoomPatch::new()
                .video_url(url)
                .playing(false)
                .position(0.0)
                .seek_target(0.0)
                .host(self.self_id.clone()),
        )
        .await
    }

    /// Periodic host drift correction. Returns true if a broadcast went out.
    ///
    /// Only the current host emits these, at most once per interval, so
    /// late joiners get fresh reference points without write storms.
    pub async fn host_tick(&mut self, now: Instant) -> Result<bool, SyncError> {
        let playing = !self.player.is_paused().await;
        let permitted = match &self.last_known {
            Some(room) => self
                .gate
                .permits(now, room, &self.self_id, playing, self.local.seeking),
            None => false,
        };
        if !permitted {
            return Ok(false);
        }

        let position = self.player.position().await;
        self.write(RoomPatch::new().position(position)).await?;
        Ok(true)
    }

    async fn write(&self, patch: RoomPatch) -> Result<(), SyncError> {
        // Write failures are advisory; local player state is never rolled
        // back, the next inbound cycle reconverges
        self.store
            .patch(&self.room_id, patch)
            .await
            .map_err(SyncError::from)
    }
}
