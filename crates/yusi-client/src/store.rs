//! Process-wide room cache keyed by code.
//!
//! The store is the single source of truth the view layer reads from; the
//! repository never hands state to a frontend directly. Snapshots are
//! applied under two guards:
//!
//! - a per-room issue sequence, so a slow response that resolves after a
//!   newer one cannot overwrite it (last-*issued* wins, not last-resolved),
//! - status monotonicity, so a misbehaving server that walks the lifecycle
//!   backwards is rejected loudly instead of silently accepted.

use std::collections::HashMap;

use yusi_core::model::{Room, RoomStatus};

/// Which aspects of a room changed when a snapshot was applied.
///
/// Frontends inspect these flags to decide what to re-render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateChanged {
    pub status: bool,
    pub members: bool,
    pub scenario: bool,
    pub submissions: bool,
    pub votes: bool,
}

impl StateChanged {
    /// Returns `true` if any flag is set.
    pub fn any(self) -> bool {
        self.status || self.members || self.scenario || self.submissions || self.votes
    }

    fn diff(old: &Room, new: &Room) -> Self {
        Self {
            status: old.status != new.status,
            members: old.members != new.members,
            scenario: old.scenario != new.scenario,
            submissions: old.submissions != new.submissions,
            votes: old.cancel_votes != new.cancel_votes,
        }
    }
}

/// Outcome of [`RoomStore::apply_snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The snapshot was accepted; flags describe what changed.
    Applied(StateChanged),
    /// The snapshot was issued before an already-applied one and was
    /// dropped.
    StaleSeq,
    /// The snapshot moved the status backwards; dropped and reported.
    StatusRegression {
        held: RoomStatus,
        offered: RoomStatus,
    },
}

struct Entry {
    room: Room,
    last_seq: u64,
}

/// Keyed cache `code -> Room`. No TTL, no eviction; rooms are short-lived
/// and the process drops the store with the session.
#[derive(Default)]
pub struct RoomStore {
    entries: HashMap<String, Entry>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.entries.get(code).map(|e| &e.room)
    }

    /// Apply a fetched snapshot tagged with its request-issue sequence.
    pub fn apply_snapshot(&mut self, seq: u64, room: Room) -> ApplyOutcome {
        match self.entries.get_mut(&room.code) {
            None => {
                self.entries
                    .insert(room.code.clone(), Entry { room, last_seq: seq });
                ApplyOutcome::Applied(StateChanged {
                    status: true,
                    members: true,
                    scenario: true,
                    submissions: true,
                    votes: true,
                })
            }
            Some(entry) => {
                if seq <= entry.last_seq {
                    tracing::debug!(
                        code = %room.code,
                        seq,
                        last = entry.last_seq,
                        "dropping stale room snapshot"
                    );
                    return ApplyOutcome::StaleSeq;
                }
                if room.status.rank() < entry.room.status.rank() {
                    tracing::warn!(
                        code = %room.code,
                        held = ?entry.room.status,
                        offered = ?room.status,
                        "server offered a backwards status transition; rejected"
                    );
                    return ApplyOutcome::StatusRegression {
                        held: entry.room.status,
                        offered: room.status,
                    };
                }
                let changed = StateChanged::diff(&entry.room, &room);
                entry.room = room;
                entry.last_seq = seq;
                ApplyOutcome::Applied(changed)
            }
        }
    }

    // ------------------------------------------------------------------
    // Direct mutators (event-shaped updates, bypassing the seq guard)
    // ------------------------------------------------------------------

    /// Full replace, ignoring sequence state. Resets the seq watermark.
    pub fn set_room(&mut self, room: Room) {
        self.entries
            .insert(room.code.clone(), Entry { room, last_seq: 0 });
    }

    pub fn set_status(&mut self, code: &str, status: RoomStatus) {
        if let Some(entry) = self.entries.get_mut(code) {
            entry.room.status = status;
        }
    }

    /// De-duplicating member insert.
    pub fn add_member(&mut self, code: &str, user_id: &str, name: &str) {
        if let Some(entry) = self.entries.get_mut(code) {
            entry.room.add_member(user_id, name);
        }
    }

    /// Keyed submission upsert; non-members are ignored.
    pub fn add_submission(&mut self, code: &str, user_id: &str, narrative: &str, is_public: bool) {
        if let Some(entry) = self.entries.get_mut(code) {
            entry.room.add_submission(user_id, narrative, is_public);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(status: RoomStatus) -> Room {
        let mut r = Room::new("AB12", "alice", "Alice", 4);
        r.status = status;
        r
    }

    #[test]
    fn first_snapshot_populates() {
        let mut store = RoomStore::new();
        let outcome = store.apply_snapshot(1, room(RoomStatus::Waiting));
        assert!(matches!(outcome, ApplyOutcome::Applied(c) if c.any()));
        assert!(store.get("AB12").is_some());
    }

    #[test]
    fn older_issued_snapshot_is_dropped() {
        // Two in-flight reads: seq 2 resolves first, then seq 1 arrives
        // late carrying pre-start state. The late one must not win.
        let mut store = RoomStore::new();
        store.apply_snapshot(2, room(RoomStatus::InProgress));
        let outcome = store.apply_snapshot(1, room(RoomStatus::Waiting));
        assert_eq!(outcome, ApplyOutcome::StaleSeq);
        assert_eq!(store.get("AB12").unwrap().status, RoomStatus::InProgress);
    }

    #[test]
    fn equal_seq_is_stale() {
        let mut store = RoomStore::new();
        store.apply_snapshot(1, room(RoomStatus::Waiting));
        assert_eq!(
            store.apply_snapshot(1, room(RoomStatus::Waiting)),
            ApplyOutcome::StaleSeq
        );
    }

    #[test]
    fn status_regression_is_rejected() {
        let mut store = RoomStore::new();
        store.apply_snapshot(1, room(RoomStatus::Completed));
        let outcome = store.apply_snapshot(2, room(RoomStatus::InProgress));
        assert_eq!(
            outcome,
            ApplyOutcome::StatusRegression {
                held: RoomStatus::Completed,
                offered: RoomStatus::InProgress,
            }
        );
        assert_eq!(store.get("AB12").unwrap().status, RoomStatus::Completed);
    }

    #[test]
    fn idempotent_refetch_reports_no_change() {
        let mut store = RoomStore::new();
        store.apply_snapshot(1, room(RoomStatus::Waiting));
        match store.apply_snapshot(2, room(RoomStatus::Waiting)) {
            ApplyOutcome::Applied(changed) => assert!(!changed.any()),
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[test]
    fn change_flags_track_what_moved() {
        let mut store = RoomStore::new();
        store.apply_snapshot(1, room(RoomStatus::Waiting));

        let mut next = room(RoomStatus::Waiting);
        next.add_member("bob", "Bob");
        match store.apply_snapshot(2, next) {
            ApplyOutcome::Applied(changed) => {
                assert!(changed.members);
                assert!(!changed.status);
                assert!(!changed.submissions);
            }
            other => panic!("expected Applied, got {other:?}"),
        }
    }

    #[test]
    fn direct_mutators_update_in_place() {
        let mut store = RoomStore::new();
        store.set_room(room(RoomStatus::InProgress));
        store.add_member("AB12", "bob", "Bob");
        store.add_member("AB12", "bob", "Bob");
        store.add_submission("AB12", "bob", "hello", true);
        store.add_submission("AB12", "mallory", "intruder", true);

        let held = store.get("AB12").unwrap();
        assert_eq!(held.members.len(), 2);
        assert_eq!(held.submissions.len(), 1);
        assert!(held.submissions_consistent());
    }
}
