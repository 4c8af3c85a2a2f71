//! Chat and Assistant Interfaces
//!
//! The chat log and the text-generation assistant are external
//! collaborators; this module only fixes the types and traits at the seam.
//! Transports (websocket, document store, HTTP) live in the embedding.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::room::{now_ms, ParticipantId, RoomId};

/// A single chat message in a room's append-only log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub room_id: RoomId,
    pub sender_id: ParticipantId,
    pub sender_name: String,
    pub body: String,
    /// Send timestamp, ms since epoch
    pub sent_at: u64,
}

impl ChatMessage {
    pub fn new(
        room_id: RoomId,
        sender_id: ParticipantId,
        sender_name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            room_id,
            sender_id,
            sender_name: sender_name.into(),
            body: body.into(),
            sent_at: now_ms(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat backend unavailable: {0}")]
    Unavailable(String),

    #[error("room {0} not found")]
    RoomNotFound(RoomId),
}

/// Append-only message log, one per room
#[async_trait]
pub trait ChatLog: Send + Sync {
    /// Append a message to the room's log
    async fn append(&self, message: ChatMessage) -> Result<(), ChatError>;

    /// Subscribe to new messages for a room
    async fn subscribe(
        &self,
        room_id: &RoomId,
    ) -> Result<mpsc::UnboundedReceiver<ChatMessage>, ChatError>;
}

#[derive(Debug, Error)]
pub enum AssistError {
    #[error("assistant unavailable: {0}")]
    Unavailable(String),

    #[error("assistant rejected the request: {0}")]
    Rejected(String),
}

/// Optional third-party text-generation assistant
#[async_trait]
pub trait AssistClient: Send + Sync {
    /// Produce a completion for a free-form prompt
    async fn complete(&self, prompt: &str) -> Result<String, AssistError>;
}
