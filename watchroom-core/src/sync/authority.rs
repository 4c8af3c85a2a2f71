//! Host Authority
//!
//! There is no election protocol: every play, pause, seek, or video-change
//! patch claims `host_id` for the acting participant, so authority is
//! opportunistic and last-writer-wins. Two participants acting within the
//! same round-trip can briefly flap authority back and forth; that is an
//! accepted cost of skipping real leader election for this use case.
//!
//! What this module decides is only *when* the current host may emit a
//! periodic drift-correction write.

use std::time::{Duration, Instant};

use crate::room::{ParticipantId, Room};

/// Minimum spacing between periodic host corrections
pub const HOST_BROADCAST_INTERVAL: Duration = Duration::from_secs(5);

/// Rate limiter for host-originated drift corrections
#[derive(Debug)]
pub struct HostBroadcastGate {
    interval: Duration,
    last_sent: Option<Instant>,
}

impl HostBroadcastGate {
    pub fn new() -> Self {
        Self::with_interval(HOST_BROADCAST_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
        }
    }

    /// Decide whether a periodic correction may go out now.
    ///
    /// Only the current host, while playing and not mid-seek, is eligible;
    /// eligible sends are spaced at least one interval apart. Claims the
    /// slot when it returns true.
    pub fn permits(
        &mut self,
        now: Instant,
        room: &Room,
        self_id: &ParticipantId,
        playing: bool,
        seeking: bool,
    ) -> bool {
        if !room.is_host(self_id) || !playing || seeking {
            return false;
        }
        match self.last_sent {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last_sent = Some(now);
                true
            }
        }
    }

    /// Forget the pacing state (when leaving a room)
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

impl Default for HostBroadcastGate {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::RoomId;

    fn room_hosted_by(host: &str) -> Room {
        Room::new(RoomId::random(), ParticipantId::new(host), host.to_string())
    }

    #[test]
    fn test_non_host_never_permitted() {
        let mut gate = HostBroadcastGate::new();
        let room = room_hosted_by("alice");
        let bob = ParticipantId::new("bob");

        assert!(!gate.permits(Instant::now(), &room, &bob, true, false));
    }

    #[test]
    fn test_host_permitted_only_while_playing_and_not_seeking() {
        let mut gate = HostBroadcastGate::new();
        let room = room_hosted_by("alice");
        let alice = ParticipantId::new("alice");
        let now = Instant::now();

        assert!(!gate.permits(now, &room, &alice, false, false)); // paused
        assert!(!gate.permits(now, &room, &alice, true, true)); // seeking
        assert!(gate.permits(now, &room, &alice, true, false));
    }

    #[test]
    fn test_rate_limit_spacing() {
        let mut gate = HostBroadcastGate::with_interval(Duration::from_secs(5));
        let room = room_hosted_by("alice");
        let alice = ParticipantId::new("alice");
        let start = Instant::now();

        assert!(gate.permits(start, &room, &alice, true, false));
        assert!(!gate.permits(start + Duration::from_secs(3), &room, &alice, true, false));
        assert!(gate.permits(start + Duration::from_secs(5), &room, &alice, true, false));
    }

    #[test]
    fn test_reassignment_moves_periodic_authority() {
        let mut gate_a = HostBroadcastGate::new();
        let mut gate_b = HostBroadcastGate::new();
        let mut room = room_hosted_by("a");
        let a = ParticipantId::new("a");
        let b = ParticipantId::new("b");
        let now = Instant::now();

        assert!(gate_a.permits(now, &room, &a, true, false));

        // B acts; its patch claims host_id
        room.host_id = Some(b.clone());

        let later = now + HOST_BROADCAST_INTERVAL;
        assert!(!gate_a.permits(later, &room, &a, true, false));
        assert!(gate_b.permits(later, &room, &b, true, false));
    }
}
