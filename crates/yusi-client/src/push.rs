//! Push channel for room updates (server-sent events).
//!
//! Replaces the poll loop with a long-lived stream where the backend
//! supports it: a reader task consumes `GET /room/{code}/events`, parses
//! `data:` lines into [`PushFrame`]s, and forwards them over an unbounded
//! channel. The channel closing signals disconnection, at which point the
//! controller falls back to polling. The client state machine is
//! unchanged either way: frames go through the same store guards.

use futures_util::StreamExt;
use tokio::sync::mpsc;

use yusi_core::protocol::PushFrame;

/// Open the room event stream and spawn the background reader task.
///
/// Non-frame lines (comments, heartbeats, malformed JSON) are skipped.
/// Dropping the receiver stops the task on its next send.
pub fn spawn_sse_watch(
    client: reqwest::Client,
    base_url: &str,
    bearer: Option<String>,
    code: &str,
) -> mpsc::UnboundedReceiver<PushFrame> {
    let url = format!("{}/room/{}/events", base_url.trim_end_matches('/'), code);
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut request = client.get(&url).header("Accept", "text/event-stream");
        if let Some(token) = &bearer {
            request = request.bearer_auth(token);
        }

        let resp = match request.send().await {
            Ok(resp) if resp.status().is_success() => resp,
            Ok(resp) => {
                tracing::warn!(url = %url, status = %resp.status(), "room event stream refused");
                return;
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "room event stream connect failed");
                return;
            }
        };

        let mut stream = resp.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "room event stream broke");
                    break;
                }
            };
            buffer.push_str(&String::from_utf8_lossy(&chunk));

            // SSE frames are newline-delimited; keep the trailing partial
            // line in the buffer for the next chunk.
            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim_end_matches('\r').to_string();
                buffer.drain(..=pos);

                let Some(payload) = line.strip_prefix("data: ") else {
                    continue;
                };
                match serde_json::from_str::<PushFrame>(payload) {
                    Ok(frame) => {
                        if tx.send(frame).is_err() {
                            return; // receiver dropped
                        }
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping unparseable push frame");
                    }
                }
            }
        }
        // Stream ended; channel drops, signalling disconnect.
    });

    rx
}
