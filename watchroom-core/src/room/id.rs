//! Room and Participant Identifiers
//!
//! Room ids are human-friendly codes meant to be read aloud or pasted into
//! a join box. Participant ids are opaque strings handed to us by whatever
//! establishes identity (out of scope here).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Characters used in room ids (unambiguous, uppercase)
/// Excludes: 0/O, 1/I/L, 5/S, 2/Z to avoid confusion
const ALPHABET: &[u8] = b"346789ABCDEFGHJKMNPQRTUVWXY";

/// Room id length (8 chars = ~282 trillion combinations with 27-char alphabet)
const CODE_LENGTH: usize = 8;

/// Identifier of a watch room, shareable with other participants
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Generate a random room id using cryptographically secure RNG
    pub fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let mut code = String::with_capacity(CODE_LENGTH);
        for _ in 0..CODE_LENGTH {
            let idx = rng.gen_range(0..ALPHABET.len());
            code.push(ALPHABET[idx] as char);
        }
        RoomId(code)
    }

    /// Get the room id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse a room id from user input
    ///
    /// Normalizes to uppercase and validates format.
    pub fn parse(input: &str) -> Option<Self> {
        let normalized: String = input
            .chars()
            .filter(|c| c.is_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if normalized.len() != CODE_LENGTH {
            return None;
        }

        if normalized.bytes().all(|b| ALPHABET.contains(&b)) {
            Some(RoomId(normalized))
        } else {
            None
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format as XXXX-XXXX for readability
        if self.0.len() == CODE_LENGTH {
            write!(f, "{}-{}", &self.0[..4], &self.0[4..])
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Identifier of a participant within a room
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an externally established identity
    pub fn new(id: impl Into<String>) -> Self {
        ParticipantId(id.into())
    }

    /// Generate a random participant id (for embeddings without their own identity)
    pub fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::thread_rng();

        let mut id = String::with_capacity(16);
        for _ in 0..16 {
            let idx = rng.gen_range(0..ALPHABET.len());
            id.push(ALPHABET[idx] as char);
        }
        ParticipantId(id)
    }

    /// Get the participant id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(s: &str) -> Self {
        ParticipantId(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_parse() {
        let id = RoomId::parse("ABCD-EFGH").unwrap();
        assert_eq!(id.as_str(), "ABCDEFGH");

        let id = RoomId::parse("abcd efgh").unwrap();
        assert_eq!(id.as_str(), "ABCDEFGH");

        assert!(RoomId::parse("ABC").is_none()); // Too short
        assert!(RoomId::parse("ABCDEFGHI").is_none()); // Too long (9 chars)
        assert!(RoomId::parse("ABCDEFG1").is_none()); // '1' not in alphabet
    }

    #[test]
    fn test_room_id_display() {
        let id = RoomId("ABCDEFGH".to_string());
        assert_eq!(format!("{}", id), "ABCD-EFGH");
    }

    #[test]
    fn test_random_room_id() {
        let a = RoomId::random();
        let b = RoomId::random();
        // Very unlikely to be equal
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 8);
    }

    #[test]
    fn test_participant_id_roundtrip() {
        let id = ParticipantId::new("alice");
        assert_eq!(id.as_str(), "alice");
        assert_eq!(ParticipantId::from("alice"), id);
    }
}
