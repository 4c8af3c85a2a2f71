//! Watchroom - Core Library
//!
//! Keeps several independent clients converging on a shared, loosely
//! synchronized playback state for one media stream. The store that
//! replicates the room record, the local player, and the chat transport
//! are collaborators behind traits; the crate owns the reconciliation
//! logic between them.

pub mod chat;
pub mod membership;
pub mod player;
pub mod room;
pub mod session;
pub mod store;
pub mod sync;

// Re-exports for convenience
pub use player::{MediaPlayer, PlayerError, PlayerEvent};
pub use room::{Participant, ParticipantId, Room, RoomId, RoomPatch};
pub use session::{Session, SessionError, SessionEvents};
pub use store::{MemoryRoomStore, RoomStore, RoomSubscription, RoomUpdate, StoreError};
pub use sync::{SyncController, SyncError, DRIFT_THRESHOLD_SECS};
