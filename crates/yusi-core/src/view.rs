//! Derived, render-ready view of a room for one observer.

use crate::model::{Room, RoomStatus};

/// The visible phase of a room for a given member.
///
/// Derived from [`RoomStatus`] plus two local booleans: whether *we* have
/// submitted, and whether the report has been fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    /// Waiting for members; only the owner can start or cancel.
    Waiting,
    /// In progress and our narrative is still outstanding.
    AwaitingSubmission,
    /// In progress, we submitted, others have not.
    AwaitingOthers,
    /// Completed but the report has not been generated/fetched yet.
    Generating,
    /// Completed with the report in hand. Terminal.
    Ready,
    /// Cancelled. Terminal.
    Cancelled,
}

impl RoomPhase {
    pub fn label(self) -> &'static str {
        match self {
            RoomPhase::Waiting => "waiting for members",
            RoomPhase::AwaitingSubmission => "awaiting your narrative",
            RoomPhase::AwaitingOthers => "awaiting other members",
            RoomPhase::Generating => "generating report",
            RoomPhase::Ready => "report ready",
            RoomPhase::Cancelled => "cancelled",
        }
    }
}

/// Everything a frontend needs to render the room screen, derived in one
/// place so the mapping stays consistent across frontends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomView {
    pub phase: RoomPhase,
    pub is_owner: bool,
    pub submitted: bool,
    /// Owner-side start guard: waiting room with at least two members.
    pub can_start: bool,
    pub member_count: usize,
    pub members_submitted: usize,
    pub cancel_votes: usize,
    /// Votes needed to force-cancel, for display only. The server owns
    /// enforcement and the client never auto-transitions on its count.
    pub cancel_threshold: usize,
}

impl RoomView {
    pub fn derive(room: &Room, user_id: &str, report_ready: bool) -> Self {
        let submitted = room.has_submitted(user_id);
        let phase = match room.status {
            RoomStatus::Waiting => RoomPhase::Waiting,
            RoomStatus::InProgress if submitted => RoomPhase::AwaitingOthers,
            RoomStatus::InProgress => RoomPhase::AwaitingSubmission,
            RoomStatus::Completed if report_ready => RoomPhase::Ready,
            RoomStatus::Completed => RoomPhase::Generating,
            RoomStatus::Cancelled => RoomPhase::Cancelled,
        };
        let is_owner = room.is_owner(user_id);
        Self {
            phase,
            is_owner,
            submitted,
            can_start: is_owner && room.status == RoomStatus::Waiting && room.members.len() >= 2,
            member_count: room.members.len(),
            members_submitted: room.submissions.len(),
            cancel_votes: room.cancel_votes.len(),
            cancel_threshold: room.cancel_threshold(),
        }
    }
}

/// Whether the room loop should keep fetching.
///
/// Polls continue while the status is non-terminal, and through the
/// report-generation latency window after completion; they stop once the
/// room is cancelled or completed with a fetched report.
pub fn should_poll(status: RoomStatus, report_ready: bool) -> bool {
    match status {
        RoomStatus::Waiting | RoomStatus::InProgress => true,
        RoomStatus::Completed => !report_ready,
        RoomStatus::Cancelled => false,
    }
}
