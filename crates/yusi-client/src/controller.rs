//! Frontend-agnostic room page controller.
//!
//! Owns a [`RoomApi`] implementation and a [`RoomStore`], providing the
//! shared flow every frontend needs:
//!
//! - One-shot actions (create/join/start/submit/vote/cancel), each a
//!   mutate-then-refetch against the repository with client-side guards.
//! - The 2-second poll loop that reconciles server snapshots into the
//!   store while the room is live, plus the push-channel equivalent.
//! - Lazy one-shot report fetch once the room is observed completed.
//!
//! Frontends read [`RoomController::view`] and drain
//! [`RoomController::drain_events`] to render; they never mutate room
//! state directly.

use std::collections::VecDeque;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use yusi_core::model::{Room, RoomStatus, SituationReport, validate_room_code};
use yusi_core::narrative::{NarrativeError, validate_narrative};
use yusi_core::protocol::PushFrame;
use yusi_core::scenario::{ScenarioSelection, SelectionError};
use yusi_core::view::{RoomView, should_poll};

use crate::api::{ApiError, RoomApi};
use crate::store::{ApplyOutcome, RoomStore, StateChanged};

/// Poll cadence while a room is live.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Cap on the retained feed; older entries are dropped.
const MAX_FEED_EVENTS: usize = 100;

/// A structured room event for frontends to render however they see fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomFeedEvent {
    MemberJoined { name: String },
    ScenarioChosen { title: String },
    SubmissionReceived { submitted: usize, members: usize },
    CancelVoteCast { votes: usize, threshold: usize },
    StatusChanged { status: RoomStatus },
    ReportReady,
    /// A poll tick failed; it will be retried on the next tick.
    PollFailed { detail: String },
    /// The server offered state the client refuses to accept.
    ServerInconsistency { detail: String },
}

/// Why a user action was refused before (or after) hitting the network.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Narrative(#[from] NarrativeError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error("{0}")]
    InvalidCode(String),
    #[error("no room attached")]
    NoRoom,
    #[error("only the room owner can {0}")]
    OwnerOnly(&'static str),
    #[error("the owner cancels directly instead of voting")]
    OwnerVote,
    #[error("at least two members are required to start")]
    NotEnoughMembers,
    #[error("action not available in the current room phase")]
    WrongPhase,
}

/// Drives one room's lifecycle for one local user.
pub struct RoomController<A: RoomApi> {
    api: A,
    store: RoomStore,
    user_id: String,
    room_code: Option<String>,
    /// Issue-order watermark for locally initiated requests.
    seq: u64,
    /// Server's per-room push sequence; a separate domain from `seq`, so
    /// push frames are ordered against each other, never against local
    /// request counts.
    push_seq: u64,
    report: Option<SituationReport>,
    events: VecDeque<RoomFeedEvent>,
}

impl<A: RoomApi> RoomController<A> {
    pub fn new(api: A, user_id: &str) -> Self {
        Self {
            api,
            store: RoomStore::new(),
            user_id: user_id.to_string(),
            room_code: None,
            seq: 0,
            push_seq: 0,
            report: None,
            events: VecDeque::new(),
        }
    }

    // ------------------------------------------------------------------
    // Read side
    // ------------------------------------------------------------------

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn room_code(&self) -> Option<&str> {
        self.room_code.as_deref()
    }

    /// The attached room's last-accepted snapshot.
    pub fn room(&self) -> Option<&Room> {
        self.store.get(self.room_code.as_deref()?)
    }

    /// Render-ready view of the attached room for the local user.
    pub fn view(&self) -> Option<RoomView> {
        let room = self.room()?;
        Some(RoomView::derive(room, &self.user_id, self.report.is_some()))
    }

    pub fn report(&self) -> Option<&SituationReport> {
        self.report.as_ref()
    }

    /// Take all pending feed events, oldest first.
    pub fn drain_events(&mut self) -> Vec<RoomFeedEvent> {
        self.events.drain(..).collect()
    }

    // ------------------------------------------------------------------
    // One-shot actions: mutate -> refetch -> store update
    // ------------------------------------------------------------------

    /// Create a room and attach to it.
    pub async fn create_room(&mut self, max_members: usize) -> Result<(), ControllerError> {
        let seq = self.next_seq();
        let room = self.api.create_room(&self.user_id, max_members).await?;
        self.room_code = Some(room.code.clone());
        self.report = None;
        self.apply_fetched(seq, room);
        Ok(())
    }

    /// Join an existing room by code and attach to it.
    pub async fn join_room(&mut self, code: &str) -> Result<(), ControllerError> {
        validate_room_code(code).map_err(ControllerError::InvalidCode)?;
        let seq = self.next_seq();
        let room = self.api.join_room(code, &self.user_id).await?;
        self.room_code = Some(room.code.clone());
        self.report = None;
        self.apply_fetched(seq, room);
        Ok(())
    }

    /// Attach to a room we already belong to (e.g. from history) and
    /// fetch its current state.
    pub async fn attach(&mut self, code: &str) -> Result<(), ControllerError> {
        validate_room_code(code).map_err(ControllerError::InvalidCode)?;
        self.room_code = Some(code.to_string());
        self.report = None;
        self.refresh().await
    }

    /// Fetch the attached room once and reconcile.
    pub async fn refresh(&mut self) -> Result<(), ControllerError> {
        let code = self.require_code()?.to_string();
        let seq = self.next_seq();
        let room = self.api.get_room(&code).await?;
        self.apply_fetched(seq, room);
        Ok(())
    }

    /// Owner action: resolve the scenario selection and start the room.
    ///
    /// Refused client-side with fewer than two members or an empty
    /// selection; the server remains the authority and may still reject.
    pub async fn start(&mut self, selection: &ScenarioSelection) -> Result<(), ControllerError> {
        let code = self.require_code()?.to_string();
        {
            let room = self.store.get(&code).ok_or(ControllerError::NoRoom)?;
            if !room.is_owner(&self.user_id) {
                return Err(ControllerError::OwnerOnly("start the room"));
            }
            if room.status != RoomStatus::Waiting {
                return Err(ControllerError::WrongPhase);
            }
            if room.members.len() < 2 {
                return Err(ControllerError::NotEnoughMembers);
            }
        }
        let scenario_id = selection.resolve(&mut rand::rng())?;
        let seq = self.next_seq();
        let room = self
            .api
            .start_room(&code, &scenario_id, &self.user_id)
            .await?;
        self.apply_fetched(seq, room);
        Ok(())
    }

    /// Submit the local user's narrative. The length guard runs before
    /// any network call.
    pub async fn submit(&mut self, narrative: &str, is_public: bool) -> Result<(), ControllerError> {
        let code = self.require_code()?.to_string();
        {
            let room = self.store.get(&code).ok_or(ControllerError::NoRoom)?;
            if room.status != RoomStatus::InProgress || room.has_submitted(&self.user_id) {
                return Err(ControllerError::WrongPhase);
            }
        }
        validate_narrative(narrative)?;
        let seq = self.next_seq();
        let room = self
            .api
            .submit_narrative(&code, &self.user_id, narrative, is_public)
            .await?;
        self.apply_fetched(seq, room);
        Ok(())
    }

    /// Non-owner action: vote to force-cancel an in-progress room.
    pub async fn vote_cancel(&mut self) -> Result<(), ControllerError> {
        let code = self.require_code()?.to_string();
        {
            let room = self.store.get(&code).ok_or(ControllerError::NoRoom)?;
            if room.is_owner(&self.user_id) {
                return Err(ControllerError::OwnerVote);
            }
            if room.status != RoomStatus::InProgress {
                return Err(ControllerError::WrongPhase);
            }
        }
        let seq = self.next_seq();
        let room = self.api.vote_cancel(&code, &self.user_id).await?;
        self.apply_fetched(seq, room);
        Ok(())
    }

    /// Owner action: hard-cancel the room.
    pub async fn cancel(&mut self) -> Result<(), ControllerError> {
        let code = self.require_code()?.to_string();
        {
            let room = self.store.get(&code).ok_or(ControllerError::NoRoom)?;
            if !room.is_owner(&self.user_id) {
                return Err(ControllerError::OwnerOnly("cancel the room"));
            }
        }
        self.api.cancel_room(&code, &self.user_id).await?;
        // The cancel route returns no body; refetch for the terminal
        // snapshot. A room the server already dropped counts as cancelled.
        match self.refresh().await {
            Ok(()) => {}
            Err(ControllerError::Api(ApiError::NotFound)) => {
                self.store.set_status(&code, RoomStatus::Cancelled);
                self.push_event(RoomFeedEvent::StatusChanged {
                    status: RoomStatus::Cancelled,
                });
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Polling / push loops
    // ------------------------------------------------------------------

    /// One poll cycle: fetch, reconcile, lazily fetch the report.
    ///
    /// A failed fetch is logged and swallowed; polling is idempotent and
    /// the next tick retries. Returns the current view.
    pub async fn poll_tick(&mut self) -> Option<RoomView> {
        let code = self.room_code.clone()?;
        let seq = self.next_seq();
        match self.api.get_room(&code).await {
            Ok(room) => self.apply_fetched(seq, room),
            Err(e) => {
                tracing::warn!(code = %code, error = %e, "room poll tick failed");
                self.push_event(RoomFeedEvent::PollFailed {
                    detail: e.to_string(),
                });
            }
        }
        self.ensure_report().await;
        self.view()
    }

    /// Whether the loop should keep running: live room, or completed
    /// with the report still outstanding.
    pub fn should_continue(&self) -> bool {
        match self.room() {
            Some(room) => should_poll(room.status, self.report.is_some()),
            None => false,
        }
    }

    /// Run the poll loop to termination, invoking `on_tick` after every
    /// cycle. Returns once the room is terminal with its report fetched
    /// (or cancelled).
    pub async fn run_poll_loop(&mut self, mut on_tick: impl FnMut(&mut Self)) {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        while self.should_continue() {
            ticker.tick().await;
            self.poll_tick().await;
            on_tick(self);
        }
    }

    /// Consume push frames over the same reconciliation path as polling.
    ///
    /// Returns `true` on clean termination (terminal room), `false` when
    /// the channel closed first; the caller should fall back to
    /// [`run_poll_loop`](Self::run_poll_loop).
    pub async fn run_push_loop(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<PushFrame>,
        mut on_frame: impl FnMut(&mut Self),
    ) -> bool {
        while self.should_continue() {
            match rx.recv().await {
                Some(PushFrame::Room { seq, room }) => {
                    // Server frame ordering is tracked on its own
                    // watermark; frames are applied under a fresh local
                    // issue number so a low server seq cannot be mistaken
                    // for a stale local response.
                    if seq <= self.push_seq {
                        tracing::debug!(seq, last = self.push_seq, "dropping stale push frame");
                        continue;
                    }
                    self.push_seq = seq;
                    let issued = self.next_seq();
                    self.apply_fetched(issued, room);
                    self.ensure_report().await;
                    on_frame(self);
                }
                Some(PushFrame::Ping) => {}
                None => return false,
            }
        }
        true
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn require_code(&self) -> Result<&str, ControllerError> {
        self.room_code.as_deref().ok_or(ControllerError::NoRoom)
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn push_event(&mut self, event: RoomFeedEvent) {
        self.events.push_back(event);
        if self.events.len() > MAX_FEED_EVENTS {
            self.events.pop_front();
        }
    }

    /// Apply a fetched snapshot and translate accepted changes into feed
    /// events.
    fn apply_fetched(&mut self, seq: u64, room: Room) {
        let old = self.store.get(&room.code).cloned();
        match self.store.apply_snapshot(seq, room) {
            ApplyOutcome::Applied(changed) if changed.any() => {
                if let Some(old) = old {
                    self.emit_diff_events(&old, changed);
                }
            }
            ApplyOutcome::Applied(_) | ApplyOutcome::StaleSeq => {}
            ApplyOutcome::StatusRegression { held, offered } => {
                self.push_event(RoomFeedEvent::ServerInconsistency {
                    detail: format!("status went backwards: {held:?} to {offered:?}"),
                });
            }
        }
    }

    fn emit_diff_events(&mut self, old: &Room, changed: StateChanged) {
        let Some(new) = self.store.get(&old.code).cloned() else {
            return;
        };
        if changed.members {
            for member in &new.members {
                if !old.is_member(member) {
                    self.push_event(RoomFeedEvent::MemberJoined {
                        name: new.member_name(member),
                    });
                }
            }
        }
        if changed.scenario
            && let Some(scenario) = &new.scenario
        {
            self.push_event(RoomFeedEvent::ScenarioChosen {
                title: scenario.title.clone(),
            });
        }
        if changed.submissions && new.submissions.len() > old.submissions.len() {
            self.push_event(RoomFeedEvent::SubmissionReceived {
                submitted: new.submissions.len(),
                members: new.members.len(),
            });
        }
        if changed.votes && new.cancel_votes.len() > old.cancel_votes.len() {
            self.push_event(RoomFeedEvent::CancelVoteCast {
                votes: new.cancel_votes.len(),
                threshold: new.cancel_threshold(),
            });
        }
        if changed.status {
            self.push_event(RoomFeedEvent::StatusChanged { status: new.status });
        }
    }

    /// Fetch the report once the room is completed and none is cached.
    ///
    /// `NotFound` means the AI service is still generating; the poll loop
    /// keeps running through that window and retries here.
    async fn ensure_report(&mut self) {
        let completed = self
            .room()
            .is_some_and(|r| r.status == RoomStatus::Completed);
        if !completed || self.report.is_some() {
            return;
        }
        let code = match self.room_code.clone() {
            Some(c) => c,
            None => return,
        };
        match self.api.get_report(&code).await {
            Ok(report) => {
                self.report = Some(report);
                self.push_event(RoomFeedEvent::ReportReady);
            }
            Err(ApiError::NotFound) => {
                tracing::debug!(code = %code, "report not generated yet");
            }
            Err(e) => {
                tracing::warn!(code = %code, error = %e, "report fetch failed");
                self.push_event(RoomFeedEvent::PollFailed {
                    detail: e.to_string(),
                });
            }
        }
    }
}
