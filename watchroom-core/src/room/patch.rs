//! Field-Level Merge Patches
//!
//! Writers never replace the whole room record. They name exactly the
//! fields they intend to change, so two participants writing disjoint
//! fields can never clobber each other; same-field races resolve
//! last-write-wins and reconverge on the next inbound cycle.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::id::ParticipantId;
use super::state::{Participant, Room};

fn skip_false(value: &bool) -> bool {
    !value
}

/// A partial update to a room record; unset fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_playing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seek_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<ParticipantId>,
    /// Set to drop playback authority entirely (the last participant
    /// leaving cannot name a successor)
    #[serde(skip_serializing_if = "skip_false", default)]
    pub clear_host: bool,
    /// Presence entries to insert or overwrite (merged per key)
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub participants: HashMap<ParticipantId, Participant>,
    /// Presence entries to remove
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub remove_participants: Vec<ParticipantId>,
}

impl RoomPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn video_url(mut self, url: impl Into<String>) -> Self {
        self.current_video_url = Some(url.into());
        self
    }

    pub fn playing(mut self, playing: bool) -> Self {
        self.is_playing = Some(playing);
        self
    }

    pub fn position(mut self, secs: f64) -> Self {
        self.current_time = Some(secs);
        self
    }

    pub fn seek_target(mut self, secs: f64) -> Self {
        self.last_seek_time = Some(secs);
        self
    }

    pub fn host(mut self, id: ParticipantId) -> Self {
        self.host_id = Some(id);
        self
    }

    pub fn clear_host(mut self) -> Self {
        self.clear_host = true;
        self
    }

    pub fn upsert_participant(mut self, id: ParticipantId, entry: Participant) -> Self {
        self.participants.insert(id, entry);
        self
    }

    pub fn remove_participant(mut self, id: ParticipantId) -> Self {
        self.remove_participants.push(id);
        self
    }

    /// Check whether this patch changes anything at all
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate the patch against the record invariants.
    ///
    /// Positions must be finite and non-negative; a rejected patch must
    /// never be partially applied.
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.clear_host && self.host_id.is_some() {
            return Err(PatchError::ConflictingHost);
        }
        for (name, value) in [
            ("currentTime", self.current_time),
            ("lastSeekTime", self.last_seek_time),
        ] {
            if let Some(secs) = value {
                if !secs.is_finite() || secs < 0.0 {
                    return Err(PatchError::InvalidPosition { field: name, value: secs });
                }
            }
        }
        Ok(())
    }

    /// Merge this patch into a room record. Only named fields change.
    pub fn apply(&self, room: &mut Room) {
        if let Some(url) = &self.current_video_url {
            room.current_video_url = url.clone();
        }
        if let Some(playing) = self.is_playing {
            room.is_playing = playing;
        }
        if let Some(secs) = self.current_time {
            room.current_time = secs;
        }
        if let Some(secs) = self.last_seek_time {
            room.last_seek_time = Some(secs);
        }
        if self.clear_host {
            room.host_id = None;
        } else if let Some(host) = &self.host_id {
            room.host_id = Some(host.clone());
        }
        for (id, entry) in &self.participants {
            room.participants.insert(id.clone(), entry.clone());
        }
        for id in &self.remove_participants {
            room.participants.remove(id);
        }
    }
}

/// Patch validation failures
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    #[error("{field} must be finite and >= 0, got {value}")]
    InvalidPosition { field: &'static str, value: f64 },

    #[error("clearHost and hostId cannot both be set")]
    ConflictingHost,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomId;

    fn room() -> Room {
        Room::new(RoomId::random(), ParticipantId::new("alice"), "Alice")
    }

    #[test]
    fn test_apply_only_named_fields() {
        let mut room = room();
        room.current_time = 120.0;
        room.is_playing = true;

        RoomPatch::new().position(130.0).apply(&mut room);

        assert_eq!(room.current_time, 130.0);
        // Untouched fields keep their values
        assert!(room.is_playing);
        assert_eq!(room.current_video_url, "");
    }

    #[test]
    fn test_video_change_patch_resets_playback() {
        let mut room = room();
        room.current_time = 120.0;
        room.is_playing = true;

        RoomPatch::new()
            .video_url("https://x/y.mp4")
            .playing(false)
            .position(0.0)
            .seek_target(0.0)
            .apply(&mut room);

        assert_eq!(room.current_video_url, "https://x/y.mp4");
        assert!(!room.is_playing);
        assert_eq!(room.current_time, 0.0);
        assert_eq!(room.last_seek_time, Some(0.0));
    }

    #[test]
    fn test_participant_upsert_and_removal() {
        let mut room = room();
        let bob = ParticipantId::new("bob");

        RoomPatch::new()
            .upsert_participant(bob.clone(), Participant::joining_now("Bob"))
            .apply(&mut room);
        assert!(room.participants.contains_key(&bob));

        RoomPatch::new().remove_participant(bob.clone()).apply(&mut room);
        assert!(!room.participants.contains_key(&bob));
    }

    #[test]
    fn test_host_handoff_and_clearing() {
        let mut room = room();
        let bob = ParticipantId::new("bob");
        assert!(room.is_host(&ParticipantId::new("alice")));

        RoomPatch::new().host(bob.clone()).apply(&mut room);
        assert_eq!(room.host_id, Some(bob));

        RoomPatch::new().clear_host().apply(&mut room);
        assert_eq!(room.host_id, None);
    }

    #[test]
    fn test_clear_host_conflicts_with_assignment() {
        let patch = RoomPatch::new().host(ParticipantId::new("bob")).clear_host();
        assert!(matches!(patch.validate(), Err(PatchError::ConflictingHost)));
        assert!(RoomPatch::new().clear_host().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_positions() {
        assert!(RoomPatch::new().position(-1.0).validate().is_err());
        assert!(RoomPatch::new().position(f64::NAN).validate().is_err());
        assert!(RoomPatch::new().seek_target(f64::INFINITY).validate().is_err());
        assert!(RoomPatch::new().position(0.0).seek_target(3.5).validate().is_ok());
    }

    #[test]
    fn test_patch_document_names_only_set_fields() {
        let patch = RoomPatch::new().playing(true).position(12.5);
        let doc = serde_json::to_value(&patch).unwrap();
        let obj = doc.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(obj["isPlaying"], serde_json::json!(true));
        assert_eq!(obj["currentTime"], serde_json::json!(12.5));
    }

    #[test]
    fn test_is_empty() {
        assert!(RoomPatch::new().is_empty());
        assert!(!RoomPatch::new().playing(true).is_empty());
    }
}
