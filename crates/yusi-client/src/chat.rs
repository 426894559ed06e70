//! Room-scoped chat with incremental (delta) polling.
//!
//! A second, independent 2-second loop beside the room poll: each tick
//! requests only messages newer than the last seen timestamp, de-duplicates
//! by message id, and tracks an unread count that grows only while the
//! chat panel is closed.

use std::collections::HashSet;
use std::time::Duration;

use yusi_core::model::ChatMessage;

use crate::api::{ApiError, RoomApi};

/// Poll cadence for the chat loop.
pub const CHAT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Client-side view of one room's message list.
pub struct ChatFeed {
    room_code: String,
    user_id: String,
    messages: Vec<ChatMessage>,
    seen_ids: HashSet<String>,
    /// Timestamp of the newest seen message; the delta-poll watermark.
    last_seen_ms: Option<i64>,
    panel_open: bool,
    unread: usize,
}

impl ChatFeed {
    pub fn new(room_code: &str, user_id: &str) -> Self {
        Self {
            room_code: room_code.to_string(),
            user_id: user_id.to_string(),
            messages: Vec::new(),
            seen_ids: HashSet::new(),
            last_seen_ms: None,
            panel_open: false,
            unread: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn unread(&self) -> usize {
        self.unread
    }

    pub fn is_open(&self) -> bool {
        self.panel_open
    }

    /// Open the chat panel; resets the unread count.
    pub fn open(&mut self) {
        self.panel_open = true;
        self.unread = 0;
    }

    pub fn close(&mut self) {
        self.panel_open = false;
    }

    /// One delta-poll cycle. Failures are logged and swallowed; the next
    /// tick retries with the same watermark. Returns how many new
    /// messages arrived.
    pub async fn poll_tick<A: RoomApi>(&mut self, api: &A) -> usize {
        match api.get_messages(&self.room_code, self.last_seen_ms).await {
            Ok(batch) => self.ingest(batch),
            Err(e) => {
                tracing::warn!(code = %self.room_code, error = %e, "chat poll tick failed");
                0
            }
        }
    }

    /// Post a message and fold the server-stamped copy straight in, so
    /// the sender sees it without waiting for the next tick.
    pub async fn send<A: RoomApi>(&mut self, api: &A, text: &str) -> Result<(), ApiError> {
        let message = api.send_message(&self.room_code, &self.user_id, text).await?;
        self.ingest(vec![message]);
        Ok(())
    }

    fn ingest(&mut self, batch: Vec<ChatMessage>) -> usize {
        let mut fresh = 0;
        for message in batch {
            if !self.seen_ids.insert(message.id.clone()) {
                continue;
            }
            self.last_seen_ms = Some(
                self.last_seen_ms
                    .map_or(message.sent_at_ms, |ts| ts.max(message.sent_at_ms)),
            );
            let own = message.user_id == self.user_id;
            self.messages.push(message);
            if !self.panel_open && !own {
                self.unread += 1;
            }
            fresh += 1;
        }
        fresh
    }
}
