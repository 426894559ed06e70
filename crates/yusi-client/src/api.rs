//! Repository seam for the remote room resource.
//!
//! [`RoomApi`] decouples the controller and stores from any specific
//! transport: the production implementation is the reqwest-backed
//! [`HttpRoomApi`](crate::http::HttpRoomApi), while tests drive the same
//! controller against an in-memory fake. One method per remote operation,
//! each a thin typed request/response pair.

use std::future::Future;

use thiserror::Error;

use yusi_core::model::{ChatMessage, Room, Scenario, SituationReport};
use yusi_core::protocol::EnvelopeRejection;

/// Typed failure taxonomy for repository calls.
///
/// Callers can branch on kind: background polls swallow and retry,
/// one-shot actions surface the message, and `NotFound` lets a frontend
/// leave a stale room instead of hanging on old state.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect/transport failure).
    #[error("network error reaching {url}: {detail}")]
    Network { url: String, detail: String },

    /// The server replied with an unexpected HTTP status.
    #[error("unexpected HTTP status {status} from {url}")]
    Http { status: u16, url: String },

    /// The server understood the request and refused it (room full,
    /// already started, not owner, ...). Message text is server-provided.
    #[error("server rejected request (code {code}): {message}")]
    Domain { code: i32, message: String },

    /// The resource does not exist (unknown room code, report not yet
    /// generated).
    #[error("not found")]
    NotFound,

    /// The response body did not match the wire contract.
    #[error("could not decode response body: {detail}")]
    Decode { detail: String },
}

impl From<EnvelopeRejection> for ApiError {
    fn from(rej: EnvelopeRejection) -> Self {
        ApiError::Domain {
            code: rej.code,
            message: rej.message,
        }
    }
}

/// Client-side contract of the room HTTP resource.
///
/// All calls are request/response passthrough: no local derivation, no
/// retries. Failures propagate as [`ApiError`] and are handled by the
/// caller.
pub trait RoomApi: Send + Sync {
    /// Create a room owned by `owner_id`. `max_members` is expected in
    /// `[2, 8]`; the server is the authority.
    fn create_room(
        &self,
        owner_id: &str,
        max_members: usize,
    ) -> impl Future<Output = Result<Room, ApiError>> + Send;

    /// Join an existing waiting room by code.
    fn join_room(
        &self,
        code: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Room, ApiError>> + Send;

    /// Idempotent read; the polling primitive.
    fn get_room(&self, code: &str) -> impl Future<Output = Result<Room, ApiError>> + Send;

    /// Owner-only: move a waiting room into progress with a scenario.
    fn start_room(
        &self,
        code: &str,
        scenario_id: &str,
        owner_id: &str,
    ) -> impl Future<Output = Result<Room, ApiError>> + Send;

    /// Submit a member narrative. Length is guarded client-side before
    /// this is called.
    fn submit_narrative(
        &self,
        code: &str,
        user_id: &str,
        narrative: &str,
        is_public: bool,
    ) -> impl Future<Output = Result<Room, ApiError>> + Send;

    /// Owner-only hard cancel.
    fn cancel_room(
        &self,
        code: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Non-owner soft cancel; the server cancels at the threshold.
    fn vote_cancel(
        &self,
        code: &str,
        user_id: &str,
    ) -> impl Future<Output = Result<Room, ApiError>> + Send;

    /// Valid once the room is completed; `NotFound` while still
    /// generating.
    fn get_report(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<SituationReport, ApiError>> + Send;

    /// The approved scenario catalog.
    fn get_scenarios(&self) -> impl Future<Output = Result<Vec<Scenario>, ApiError>> + Send;

    /// The caller's past rooms (caller identity comes from auth).
    fn get_history(&self) -> impl Future<Output = Result<Vec<Room>, ApiError>> + Send;

    /// Room-scoped messages sent strictly after `after_ms` (all messages
    /// when `None`). The delta-polling primitive for chat.
    fn get_messages(
        &self,
        code: &str,
        after_ms: Option<i64>,
    ) -> impl Future<Output = Result<Vec<ChatMessage>, ApiError>> + Send;

    /// Post a chat message; returns the server-stamped message.
    fn send_message(
        &self,
        code: &str,
        user_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<ChatMessage, ApiError>> + Send;
}
