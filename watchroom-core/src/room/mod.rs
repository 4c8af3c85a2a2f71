//! Room Model
//!
//! The shared room record, its identifiers, and the merge-patch type
//! through which all writes happen.

mod id;
mod patch;
mod state;

pub use id::{ParticipantId, RoomId};
pub use patch::{PatchError, RoomPatch};
pub use state::{now_ms, Participant, Room};
