//! Media Player Adapter Contract
//!
//! The local playback primitive is an external collaborator (an HTML video
//! element, a desktop player, a test fake). The adapter exposes imperative
//! commands and forwards player events to the session. It does not try to
//! distinguish user gestures from programmatic transitions; the sync
//! controller filters echoes of its own commands.

use async_trait::async_trait;
use thiserror::Error;

/// Player-level failures
#[derive(Debug, Error)]
pub enum PlayerError {
    /// The platform refused to start playback (e.g. browser autoplay
    /// policy). Expected and non-fatal.
    #[error("playback start rejected by platform policy")]
    AutoplayBlocked,

    #[error("failed to load media source: {0}")]
    LoadFailed(String),

    #[error("player backend error: {0}")]
    Backend(String),
}

/// Events emitted by the player adapter
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Playback started
    Play,
    /// Playback paused
    Pause,
    /// The user grabbed the scrub bar
    SeekStart,
    /// A seek settled at the given position (seconds)
    SeekEnd { position: f64 },
    /// Periodic position report while playing (seconds)
    TimeUpdate { position: f64 },
    /// The current source failed to load
    LoadError { message: String },
}

/// Commands the sync controller issues to the local player
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Load a new media source, resetting the playback position
    async fn load(&self, url: &str) -> Result<(), PlayerError>;

    /// Start playback. May fail with [`PlayerError::AutoplayBlocked`].
    async fn play(&self) -> Result<(), PlayerError>;

    /// Pause playback
    async fn pause(&self) -> Result<(), PlayerError>;

    /// Current playback position in seconds
    async fn position(&self) -> f64;

    /// Force the playback position
    async fn set_position(&self, secs: f64) -> Result<(), PlayerError>;

    /// Whether the player is currently paused
    async fn is_paused(&self) -> bool;
}
