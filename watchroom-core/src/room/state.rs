//! Room Record
//!
//! The shared mutable record one watch session converges on. The record
//! lives in the room state store and is only ever mutated through
//! field-level merge patches (see [`super::patch::RoomPatch`]).

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use super::id::{ParticipantId, RoomId};

/// Get current wall-clock time in milliseconds since UNIX epoch
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// A participant's presence entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Display name chosen by the user
    pub display_name: String,
    /// When this participant joined (ms since epoch)
    pub joined_at: u64,
    /// Last liveness refresh (ms since epoch)
    pub last_seen: u64,
}

impl Participant {
    /// Create a fresh presence entry for a participant joining now
    pub fn joining_now(display_name: impl Into<String>) -> Self {
        let now = now_ms();
        Self {
            display_name: display_name.into(),
            joined_at: now,
            last_seen: now,
        }
    }

    /// Check if this entry has not been refreshed within `timeout_ms`
    pub fn is_stale(&self, now: u64, timeout_ms: u64) -> bool {
        now.saturating_sub(self.last_seen) > timeout_ms
    }
}

/// The shared room record, one per watch session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Unique room id, immutable once created
    pub room_id: RoomId,
    /// Media source all clients must load; may be empty before the first video
    pub current_video_url: String,
    /// Shared intent of the playback state
    pub is_playing: bool,
    /// Last known authoritative playback position in seconds
    pub current_time: f64,
    /// Set only by an explicit seek, distinguishing a deliberate jump from
    /// drift correction
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seek_time: Option<f64>,
    /// Participant whose last action defines playback authority
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<ParticipantId>,
    /// Presence entries keyed by participant id
    pub participants: HashMap<ParticipantId, Participant>,
    /// Creation timestamp (ms since epoch), immutable
    pub created_at: u64,
}

impl Room {
    /// Create a new room with its first participant as host
    pub fn new(room_id: RoomId, creator: ParticipantId, display_name: impl Into<String>) -> Self {
        let mut participants = HashMap::new();
        participants.insert(creator.clone(), Participant::joining_now(display_name));

        Self {
            room_id,
            current_video_url: String::new(),
            is_playing: false,
            current_time: 0.0,
            last_seek_time: None,
            host_id: Some(creator),
            participants,
            created_at: now_ms(),
        }
    }

    /// Check whether the given participant currently holds playback authority
    pub fn is_host(&self, id: &ParticipantId) -> bool {
        self.host_id.as_ref() == Some(id)
    }

    /// The position remote clients should converge on: an explicit seek
    /// target wins over the periodic drift-correction position.
    pub fn target_position(&self) -> f64 {
        self.last_seek_time.unwrap_or(self.current_time)
    }

    /// Pick who inherits playback authority when `departing` leaves: the
    /// longest-present remaining participant, ties broken by id so every
    /// client picks the same successor.
    pub fn successor_host(&self, departing: &ParticipantId) -> Option<ParticipantId> {
        self.participants
            .iter()
            .filter(|(id, _)| *id != departing)
            .min_by(|(a_id, a), (b_id, b)| {
                a.joined_at
                    .cmp(&b.joined_at)
                    .then_with(|| a_id.as_str().cmp(b_id.as_str()))
            })
            .map(|(id, _)| id.clone())
    }

    /// Get list of participants, host first, then sorted by display name
    pub fn participant_list(&self) -> Vec<(&ParticipantId, &Participant)> {
        let mut list: Vec<(&ParticipantId, &Participant)> = self.participants.iter().collect();
        list.sort_by(|(a_id, a), (b_id, b)| {
            let a_host = self.host_id.as_ref() == Some(*a_id);
            let b_host = self.host_id.as_ref() == Some(*b_id);
            match (a_host, b_host) {
                (true, false) => std::cmp::Ordering::Less,
                (false, true) => std::cmp::Ordering::Greater,
                _ => a
                    .display_name
                    .to_lowercase()
                    .cmp(&b.display_name.to_lowercase()),
            }
        });
        list
    }
}
