//! Playback Synchronization Core
//!
//! Reconciles each client's locally driven player with the shared room
//! record without oscillation or feedback loops.

mod authority;
mod controller;

pub use authority::{HostBroadcastGate, HOST_BROADCAST_INTERVAL};
pub use controller::{SyncController, SyncError, DRIFT_THRESHOLD_SECS};
