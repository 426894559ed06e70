//! Room lifecycle state machine as an explicit reducer.
//!
//! [`apply`] is the single transition function `(Room, RoomEvent) -> Room`.
//! Events correspond one-to-one with the repository mutations, so the
//! lifecycle is testable without polling timers or a network. The real
//! server is the authority for every rule here; the client uses the same
//! function for optimistic guards and test doubles use it as the
//! server-side rulebook.

use thiserror::Error;

use crate::model::{Room, RoomStatus, Scenario, UserId};

/// A state-changing operation on a room. Mirrors the repository surface.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// A user joined a waiting room.
    MemberJoined { user_id: UserId, name: String },
    /// The owner started the room with a resolved scenario.
    Started { scenario: Scenario },
    /// A member submitted their narrative.
    NarrativeSubmitted {
        user_id: UserId,
        narrative: String,
        is_public: bool,
    },
    /// A non-owner member voted to force-cancel.
    CancelVoteCast { user_id: UserId },
    /// The owner hard-cancelled the room.
    Cancelled,
    /// The server observed all submissions in and closed the room.
    Completed,
}

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("room is not waiting")]
    NotWaiting,
    #[error("room is not in progress")]
    NotInProgress,
    #[error("room is already in a terminal state")]
    Terminal,
    #[error("room is full")]
    RoomFull,
    #[error("user '{0}' is not a member of this room")]
    NotMember(UserId),
    #[error("at least two members are required to start")]
    NotEnoughMembers,
    #[error("the owner cannot vote-cancel their own room")]
    OwnerVote,
    #[error("not every member has submitted")]
    NotAllSubmitted,
}

/// Apply one event to a room, producing the next room state.
///
/// Transitions are monotonic: nothing leaves `Completed` or `Cancelled`,
/// and `Waiting -> InProgress` is reachable exactly once via
/// [`RoomEvent::Started`]. A cancel vote that reaches
/// [`Room::cancel_threshold`] flips the room to `Cancelled` in the same
/// step.
pub fn apply(room: &Room, event: &RoomEvent) -> Result<Room, TransitionError> {
    if room.status.is_terminal() {
        return Err(TransitionError::Terminal);
    }
    let mut next = room.clone();

    match event {
        RoomEvent::MemberJoined { user_id, name } => {
            if next.status != RoomStatus::Waiting {
                return Err(TransitionError::NotWaiting);
            }
            if next.is_full() && !next.is_member(user_id) {
                return Err(TransitionError::RoomFull);
            }
            next.add_member(user_id, name);
        }
        RoomEvent::Started { scenario } => {
            if next.status != RoomStatus::Waiting {
                return Err(TransitionError::NotWaiting);
            }
            if next.members.len() < 2 {
                return Err(TransitionError::NotEnoughMembers);
            }
            next.scenario = Some(scenario.clone());
            next.status = RoomStatus::InProgress;
        }
        RoomEvent::NarrativeSubmitted {
            user_id,
            narrative,
            is_public,
        } => {
            if next.status != RoomStatus::InProgress {
                return Err(TransitionError::NotInProgress);
            }
            if !next.add_submission(user_id, narrative, *is_public) {
                return Err(TransitionError::NotMember(user_id.clone()));
            }
        }
        RoomEvent::CancelVoteCast { user_id } => {
            if next.status != RoomStatus::InProgress {
                return Err(TransitionError::NotInProgress);
            }
            if !next.is_member(user_id) {
                return Err(TransitionError::NotMember(user_id.clone()));
            }
            if next.is_owner(user_id) {
                return Err(TransitionError::OwnerVote);
            }
            next.add_cancel_vote(user_id);
            if next.cancel_votes.len() >= next.cancel_threshold() {
                next.status = RoomStatus::Cancelled;
            }
        }
        RoomEvent::Cancelled => {
            next.status = RoomStatus::Cancelled;
        }
        RoomEvent::Completed => {
            if next.status != RoomStatus::InProgress {
                return Err(TransitionError::NotInProgress);
            }
            if !next.all_submitted() {
                return Err(TransitionError::NotAllSubmitted);
            }
            next.status = RoomStatus::Completed;
        }
    }

    debug_assert!(next.submissions_consistent());
    Ok(next)
}
