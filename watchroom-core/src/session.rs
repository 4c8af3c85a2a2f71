//! Watch Session
//!
//! Ties one participant's player, one room record, and the background
//! loops together: the subscription pump (remote updates in), the host
//! broadcast loop (periodic drift corrections out), and the presence
//! refresh. Each loop carries its own cancel handle; leaving a room stops
//! the loops and drops the subscription, while in-flight writes complete
//! or fail on their own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, info, warn};

use crate::membership::{PresenceTracker, PRESENCE_REFRESH_INTERVAL};
use crate::player::{MediaPlayer, PlayerEvent};
use crate::room::{ParticipantId, Room, RoomId};
use crate::store::{RoomStore, RoomUpdate, StoreError};
use crate::sync::{SyncController, SyncError};

static TRACING_INIT: Once = Once::new();

/// How often the host broadcast loop wakes up to consult the gate
const HOST_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Session-level failures
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("already in a room")]
    AlreadyInRoom,

    #[error("not in a room")]
    NotInRoom,

    #[error("room {0} not found")]
    RoomNotFound(RoomId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

/// Callback interface for session events
pub trait SessionEvents: Send + Sync {
    /// The shared record changed (includes echoes of our own writes)
    fn on_room_updated(&self, room: Room);
    /// The room record disappeared; terminal for this session
    fn on_room_gone(&self);
    /// A non-fatal failure the user should know about
    fn on_advisory(&self, message: String);
}

struct ActiveRoom {
    room_id: RoomId,
    controller: Arc<Mutex<SyncController>>,
    presence: Arc<PresenceTracker>,
    /// Set by the pump when the record disappears; stops sibling loops
    ended: Arc<AtomicBool>,
    cancel_pump: Option<oneshot::Sender<()>>,
    cancel_broadcast: Option<oneshot::Sender<()>>,
    cancel_presence: Option<oneshot::Sender<()>>,
}

/// One participant's connection to a watch room
pub struct Session {
    store: Arc<dyn RoomStore>,
    player: Arc<dyn MediaPlayer>,
    events: Arc<dyn SessionEvents>,
    self_id: ParticipantId,
    display_name: String,
    active: Mutex<Option<ActiveRoom>>,
}

impl Session {
    pub fn new(
        store: Arc<dyn RoomStore>,
        player: Arc<dyn MediaPlayer>,
        events: Arc<dyn SessionEvents>,
        self_id: ParticipantId,
        display_name: impl Into<String>,
    ) -> Self {
        TRACING_INIT.call_once(|| {
            let filter = tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("watchroom_core=info"));
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .try_init();
        });

        Self {
            store,
            player,
            events,
            self_id,
            display_name: display_name.into(),
            active: Mutex::new(None),
        }
    }

    pub fn self_id(&self) -> &ParticipantId {
        &self.self_id
    }

    /// Create a new room and join it as its first participant
    pub async fn create_room(&self) -> Result<RoomId, SessionError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(SessionError::AlreadyInRoom);
        }

        let room_id = RoomId::random();
        let room = Room::new(room_id.clone(), self.self_id.clone(), self.display_name.clone());
        self.store.create(room).await?;

        *active = Some(self.attach(room_id.clone()).await?);
        info!("Created room {}", room_id);
        Ok(room_id)
    }

    /// Join an existing room
    pub async fn join_room(&self, room_id: RoomId) -> Result<(), SessionError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(SessionError::AlreadyInRoom);
        }

        match self.store.get(&room_id).await {
            Ok(_) => {}
            Err(StoreError::NotFound(id)) => return Err(SessionError::RoomNotFound(id)),
            Err(e) => return Err(e.into()),
        }

        *active = Some(self.attach(room_id.clone()).await?);
        info!("Joined room {}", room_id);
        Ok(())
    }

    /// Leave the current room, stopping all background loops
    pub async fn leave_room(&self) -> Result<(), SessionError> {
        let mut active = self.active.lock().await;
        let mut joined = active.take().ok_or(SessionError::NotInRoom)?;

        for cancel in [
            joined.cancel_pump.take(),
            joined.cancel_broadcast.take(),
            joined.cancel_presence.take(),
        ]
        .into_iter()
        .flatten()
        {
            let _ = cancel.send(());
        }

        // Best effort; the record may already be gone
        if !joined.ended.load(Ordering::SeqCst) {
            if let Err(e) = joined.presence.withdraw().await {
                debug!("Presence withdrawal failed: {}", e);
            }
        }

        info!("Left room {}", joined.room_id);
        Ok(())
    }

    pub async fn is_in_room(&self) -> bool {
        self.active.lock().await.is_some()
    }

    /// Forward a player adapter event into the reconciliation loop
    pub async fn handle_player_event(&self, event: PlayerEvent) -> Result<(), SessionError> {
        if let PlayerEvent::LoadError { message } = &event {
            self.events.on_advisory(format!("Media failed to load: {}", message));
        }
        let controller = self.controller().await?;
        let mut ctl = controller.lock().await;
        ctl.handle_player_event(event).await.map_err(SessionError::from)
    }

    /// The user started playback
    pub async fn handle_local_play(&self) -> Result<(), SessionError> {
        let controller = self.controller().await?;
        let mut ctl = controller.lock().await;
        ctl.handle_local_play().await.map_err(SessionError::from)
    }

    /// The user paused playback
    pub async fn handle_local_pause(&self) -> Result<(), SessionError> {
        let controller = self.controller().await?;
        let mut ctl = controller.lock().await;
        ctl.handle_local_pause().await.map_err(SessionError::from)
    }

    /// The user grabbed the scrub bar
    pub async fn handle_local_seek_start(&self) -> Result<(), SessionError> {
        let controller = self.controller().await?;
        controller.lock().await.handle_local_seek_start();
        Ok(())
    }

    /// The user released the scrub bar
    pub async fn handle_local_seek_end(&self, position: f64) -> Result<(), SessionError> {
        let controller = self.controller().await?;
        let mut ctl = controller.lock().await;
        ctl.handle_local_seek_end(position).await.map_err(SessionError::from)
    }

    /// The user swapped the video source
    pub async fn handle_local_video_change(&self, url: &str) -> Result<(), SessionError> {
        let controller = self.controller().await?;
        let mut ctl = controller.lock().await;
        ctl.handle_local_video_change(url).await.map_err(SessionError::from)
    }

    /// Spawn a pump that drains a player adapter's event channel into the
    /// session. Write failures surface as advisories, never as crashes.
    pub fn spawn_player_event_pump(
        self: &Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<PlayerEvent>,
    ) {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                match session.handle_player_event(event).await {
                    Ok(()) => {}
                    Err(SessionError::NotInRoom) => {}
                    Err(e) => session.events.on_advisory(format!("Sync write failed: {}", e)),
                }
            }
            debug!("Player event pump ended");
        });
    }

    async fn controller(&self) -> Result<Arc<Mutex<SyncController>>, SessionError> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|a| Arc::clone(&a.controller))
            .ok_or(SessionError::NotInRoom)
    }

    /// Subscribe to the room and start the background loops
    async fn attach(&self, room_id: RoomId) -> Result<ActiveRoom, SessionError> {
        let mut subscription = self.store.subscribe(&room_id).await?;

        let controller = Arc::new(Mutex::new(SyncController::new(
            Arc::clone(&self.store),
            Arc::clone(&self.player),
            room_id.clone(),
            self.self_id.clone(),
        )));
        let presence = Arc::new(PresenceTracker::new(
            Arc::clone(&self.store),
            room_id.clone(),
            self.self_id.clone(),
            self.display_name.clone(),
        ));
        let ended = Arc::new(AtomicBool::new(false));

        presence.announce().await?;

        // Subscription pump: remote updates -> local player commands
        let (pump_tx, mut pump_rx) = oneshot::channel();
        {
            let controller = Arc::clone(&controller);
            let events = Arc::clone(&self.events);
            let ended = Arc::clone(&ended);
            let room_id = room_id.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = &mut pump_rx => break,
                        update = subscription.recv() => match update {
                            Some(RoomUpdate::Changed(room)) => {
                                controller.lock().await.apply_remote(&room).await;
                                events.on_room_updated(room);
                            }
                            Some(RoomUpdate::Removed) | None => {
                                info!("Room {} is gone, ending session", room_id);
                                ended.store(true, Ordering::SeqCst);
                                events.on_room_gone();
                                break;
                            }
                        }
                    }
                }
                debug!("Subscription pump ended");
            });
        }

        // Host broadcast loop: the gate inside host_tick enforces
        // eligibility and the once-per-5s spacing
        let (broadcast_tx, mut broadcast_rx) = oneshot::channel();
        {
            let controller = Arc::clone(&controller);
            let events = Arc::clone(&self.events);
            let ended = Arc::clone(&ended);
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = &mut broadcast_rx => break,
                        _ = tokio::time::sleep(HOST_TICK_PERIOD) => {}
                    }
                    if ended.load(Ordering::SeqCst) {
                        break;
                    }
                    if let Err(e) = controller.lock().await.host_tick(Instant::now()).await {
                        warn!("Periodic correction failed: {}", e);
                        events.on_advisory(format!("Sync update failed: {}", e));
                    }
                }
                debug!("Host broadcast loop ended");
            });
        }

        // Presence refresh loop, independent of playback sync
        let (presence_tx, mut presence_rx) = oneshot::channel();
        {
            let presence = Arc::clone(&presence);
            let ended = Arc::clone(&ended);
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = &mut presence_rx => break,
                        _ = tokio::time::sleep(PRESENCE_REFRESH_INTERVAL) => {}
                    }
                    if ended.load(Ordering::SeqCst) {
                        break;
                    }
                    if let Err(e) = presence.refresh().await {
                        warn!("Presence refresh failed: {}", e);
                    }
                }
                debug!("Presence loop ended");
            });
        }

        Ok(ActiveRoom {
            room_id,
            controller,
            presence,
            ended,
            cancel_pump: Some(pump_tx),
            cancel_broadcast: Some(broadcast_tx),
            cancel_presence: Some(presence_tx),
        })
    }
}
