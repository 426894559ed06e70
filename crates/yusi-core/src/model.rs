//! Client-side data model for scenario rooms.
//!
//! A [`Room`] is the aggregate root of a short-lived multi-party session:
//! members join while it is waiting, the owner starts it with a scenario,
//! everyone submits a narrative, and the server flips it to completed once
//! all submissions are in (or cancelled). The client only ever observes
//! server-produced snapshots of this shape; it never invents transitions
//! on its own (see [`crate::reducer`] for the transition rules).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Identity of a user, as issued by the backend.
pub type UserId = String;

/// Identity of an approved scenario.
pub type ScenarioId = String;

/// Lifecycle status of a room, as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Completed,
    Cancelled,
}

impl RoomStatus {
    /// Whether the room can no longer change state.
    pub fn is_terminal(self) -> bool {
        matches!(self, RoomStatus::Completed | RoomStatus::Cancelled)
    }

    /// Position of this status along the forward-only lifecycle.
    ///
    /// `Cancelled` is reachable from any non-terminal state, so it ranks
    /// above everything; `Completed` only follows `InProgress`.
    pub fn rank(self) -> u8 {
        match self {
            RoomStatus::Waiting => 0,
            RoomStatus::InProgress => 1,
            RoomStatus::Completed => 2,
            RoomStatus::Cancelled => 3,
        }
    }
}

/// An approved piece of narrative-prompt content.
///
/// Scenarios are created out-of-band through a submission/audit pipeline;
/// the room flow only consumes the approved catalog by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    pub title: String,
    pub description: String,
}

/// A multi-party scenario session, keyed by its shareable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Short shareable identifier; immutable after creation.
    pub code: String,
    pub status: RoomStatus,
    /// Creator; grants start and force-cancel.
    pub owner_id: UserId,
    pub max_members: usize,
    /// Selected scenario; absent while waiting before a start.
    #[serde(default)]
    pub scenario: Option<Scenario>,
    /// Participants in insertion order. Grows via join, never shrinks.
    pub members: Vec<UserId>,
    /// Display names; auxiliary, not authoritative identity.
    #[serde(default)]
    pub member_names: HashMap<UserId, String>,
    /// Submitted narratives, keyed by member.
    #[serde(default)]
    pub submissions: HashMap<UserId, String>,
    /// Per-member opt-in for the public report tab.
    #[serde(default)]
    pub submission_visibility: HashMap<UserId, bool>,
    /// Members who voted to force-cancel an in-progress room.
    #[serde(default)]
    pub cancel_votes: Vec<UserId>,
}

impl Room {
    /// A fresh waiting room with the owner as its only member.
    pub fn new(code: &str, owner_id: &str, owner_name: &str, max_members: usize) -> Self {
        Self {
            code: code.to_string(),
            status: RoomStatus::Waiting,
            owner_id: owner_id.to_string(),
            max_members,
            scenario: None,
            members: vec![owner_id.to_string()],
            member_names: HashMap::from([(owner_id.to_string(), owner_name.to_string())]),
            submissions: HashMap::new(),
            submission_visibility: HashMap::new(),
            cancel_votes: Vec::new(),
        }
    }

    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_members
    }

    pub fn has_submitted(&self, user_id: &str) -> bool {
        self.submissions.contains_key(user_id)
    }

    /// Whether every member has a submission (the server's completion gate).
    pub fn all_submitted(&self) -> bool {
        self.members.iter().all(|m| self.submissions.contains_key(m))
    }

    /// Votes required to force-cancel: `floor(members / 2) + 1`.
    pub fn cancel_threshold(&self) -> usize {
        self.members.len() / 2 + 1
    }

    pub fn has_voted_cancel(&self, user_id: &str) -> bool {
        self.cancel_votes.iter().any(|v| v == user_id)
    }

    /// De-duplicating member insert. Returns `false` if already present.
    pub fn add_member(&mut self, user_id: &str, name: &str) -> bool {
        self.member_names
            .insert(user_id.to_string(), name.to_string());
        if self.is_member(user_id) {
            return false;
        }
        self.members.push(user_id.to_string());
        true
    }

    /// Keyed submission upsert. Returns `false` for non-members, leaving
    /// the room untouched (submissions must stay a subset of members).
    pub fn add_submission(&mut self, user_id: &str, narrative: &str, is_public: bool) -> bool {
        if !self.is_member(user_id) {
            return false;
        }
        self.submissions
            .insert(user_id.to_string(), narrative.to_string());
        self.submission_visibility
            .insert(user_id.to_string(), is_public);
        true
    }

    /// De-duplicating cancel-vote insert. Returns `false` if already voted.
    pub fn add_cancel_vote(&mut self, user_id: &str) -> bool {
        if self.has_voted_cancel(user_id) {
            return false;
        }
        self.cancel_votes.push(user_id.to_string());
        true
    }

    /// Display name for a member, falling back to the raw id.
    pub fn member_name(&self, user_id: &str) -> String {
        self.member_names
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| user_id.to_string())
    }

    /// Structural invariant: every submission key is a member.
    pub fn submissions_consistent(&self) -> bool {
        self.submissions.keys().all(|k| self.is_member(k))
    }
}

/// AI-generated character sketch for one member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalSketch {
    pub user_id: UserId,
    pub user_name: String,
    pub sketch: String,
}

/// Compatibility score for an unordered member pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairScore {
    pub user_a: UserId,
    pub user_b: UserId,
    /// 0–100.
    pub score: u8,
    pub rationale: String,
}

/// A narrative whose author opted into the public report tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSubmission {
    pub user_id: UserId,
    pub user_name: String,
    pub narrative: String,
}

/// Post-hoc AI analysis of a completed room.
///
/// Produced asynchronously by an external service once all members have
/// submitted; the client only polls for its existence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SituationReport {
    pub personal: Vec<PersonalSketch>,
    pub pairs: Vec<PairScore>,
    #[serde(default)]
    pub public_submissions: Vec<PublicSubmission>,
}

/// A room-scoped chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub room_code: String,
    pub user_id: UserId,
    pub user_name: String,
    pub text: String,
    /// Server-assigned send time, unix millis. Used for delta polling.
    pub sent_at_ms: i64,
}

// ---------------------------------------------------------------------------
// Room code validation
// ---------------------------------------------------------------------------

/// Validate a room code before hitting the network with it.
///
/// The server issues codes and owns join policy, so the client makes no
/// assumption about their format; only blank input is refused.
pub fn validate_room_code(code: &str) -> Result<(), String> {
    if code.trim().is_empty() {
        return Err("Room code cannot be empty".to_string());
    }
    Ok(())
}
