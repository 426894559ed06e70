//! Wire types for the room HTTP resource.
//!
//! Every REST response arrives wrapped in an [`Envelope`]; request bodies
//! are camelCase JSON. The push channel (SSE) carries [`PushFrame`]s using
//! the same tagged-enum convention.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Room, ScenarioId, UserId};

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

/// Backend code signalling success inside an [`Envelope`].
pub const ENVELOPE_OK: i32 = 0;

/// A non-zero envelope code with the server-provided message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("server rejected request (code {code}): {message}")]
pub struct EnvelopeRejection {
    pub code: i32,
    pub message: String,
}

/// The `{code, data, info}` wrapper every response body uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: i32,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub info: Option<String>,
}

impl<T> Envelope<T> {
    fn rejection(code: i32, info: Option<String>) -> EnvelopeRejection {
        EnvelopeRejection {
            code,
            message: info.unwrap_or_else(|| "unspecified server error".to_string()),
        }
    }

    /// Unwrap a data-carrying response.
    ///
    /// A success code with a missing `data` field is treated as a
    /// rejection: the payload contract was not met.
    pub fn into_result(self) -> Result<T, EnvelopeRejection> {
        if self.code != ENVELOPE_OK {
            return Err(Self::rejection(self.code, self.info));
        }
        self.data.ok_or(EnvelopeRejection {
            code: ENVELOPE_OK,
            message: "response envelope carried no data".to_string(),
        })
    }

    /// Unwrap a data-less acknowledgement (e.g. owner cancel).
    pub fn into_ack(self) -> Result<(), EnvelopeRejection> {
        if self.code != ENVELOPE_OK {
            return Err(Self::rejection(self.code, self.info));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub owner_id: UserId,
    pub max_members: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    pub code: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRoomRequest {
    pub code: String,
    pub scenario_id: ScenarioId,
    pub owner_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitNarrativeRequest {
    pub code: String,
    pub user_id: UserId,
    pub narrative: String,
    pub is_public: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRoomRequest {
    pub code: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteCancelRequest {
    pub code: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub user_id: UserId,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Push frames (SSE room watch)
// ---------------------------------------------------------------------------

/// One frame on a room's push channel.
///
/// `seq` is the server's monotonic per-room sequence; the store rejects
/// frames that arrive out of order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PushFrame {
    /// A fresh room snapshot.
    Room { seq: u64, room: Room },
    /// Keep-alive; carries no state.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RoomStatus;

    #[test]
    fn envelope_success_unwraps_data() {
        let env: Envelope<u32> = serde_json::from_str(r#"{"code":0,"data":7,"info":null}"#).unwrap();
        assert_eq!(env.into_result().unwrap(), 7);
    }

    #[test]
    fn envelope_error_surfaces_code_and_info() {
        let env: Envelope<u32> =
            serde_json::from_str(r#"{"code":40301,"info":"room already started"}"#).unwrap();
        let err = env.into_result().unwrap_err();
        assert_eq!(err.code, 40301);
        assert_eq!(err.message, "room already started");
    }

    #[test]
    fn envelope_success_without_data_is_rejected() {
        let env: Envelope<u32> = serde_json::from_str(r#"{"code":0}"#).unwrap();
        assert!(env.into_result().is_err());
    }

    #[test]
    fn envelope_ack_ignores_missing_data() {
        let env: Envelope<serde_json::Value> = serde_json::from_str(r#"{"code":0}"#).unwrap();
        assert!(env.into_ack().is_ok());
    }

    #[test]
    fn push_frame_tagging() {
        let frame: PushFrame = serde_json::from_str(
            r#"{"type":"room","seq":3,"room":{
                "code":"AB12","status":"WAITING","ownerId":"alice",
                "maxMembers":4,"members":["alice"]}}"#,
        )
        .unwrap();
        match frame {
            PushFrame::Room { seq, room } => {
                assert_eq!(seq, 3);
                assert_eq!(room.status, RoomStatus::Waiting);
            }
            PushFrame::Ping => panic!("expected room frame"),
        }

        let ping: PushFrame = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();
        assert!(matches!(ping, PushFrame::Ping));
    }

    #[test]
    fn request_bodies_are_camel_case() {
        let body = SubmitNarrativeRequest {
            code: "AB12".into(),
            user_id: "alice".into(),
            narrative: "hello".into(),
            is_public: true,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("isPublic").is_some());
        assert!(json.get("user_id").is_none());
    }
}
