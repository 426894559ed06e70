//! reqwest-backed implementation of [`RoomApi`].
//!
//! One route per operation, JSON over REST, bearer-token authenticated.
//! Every response body is an `{code, data, info}` envelope; decode and
//! error mapping are shared by all calls:
//!
//! - connect/transport failure  -> [`ApiError::Network`]
//! - HTTP 404                   -> [`ApiError::NotFound`]
//! - other non-2xx              -> [`ApiError::Http`]
//! - envelope `code != 0`       -> [`ApiError::Domain`]
//! - unparseable body           -> [`ApiError::Decode`]

use serde::Serialize;
use serde::de::DeserializeOwned;

use yusi_core::model::{ChatMessage, Room, Scenario, SituationReport};
use yusi_core::protocol::{
    CancelRoomRequest, CreateRoomRequest, Envelope, JoinRoomRequest, SendMessageRequest,
    StartRoomRequest, SubmitNarrativeRequest, VoteCancelRequest,
};

use crate::api::{ApiError, RoomApi};

/// HTTP client for the room resource.
#[derive(Clone)]
pub struct HttpRoomApi {
    client: reqwest::Client,
    base_url: String,
    bearer: Option<String>,
}

impl HttpRoomApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer: None,
        }
    }

    /// Attach a bearer token sent with every request.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Reuse an existing [`reqwest::Client`] (connection pool sharing,
    /// e.g. with the SSE watch).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn decode<T: DeserializeOwned>(
        url: String,
        resp: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Envelope<T>, ApiError> {
        let resp = resp.map_err(|e| ApiError::Network {
            url: url.clone(),
            detail: e.to_string(),
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound);
        }
        if !status.is_success() {
            return Err(ApiError::Http {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = resp.bytes().await.map_err(|e| ApiError::Network {
            url: url.clone(),
            detail: e.to_string(),
        })?;
        serde_json::from_slice::<Envelope<T>>(&bytes).map_err(|e| ApiError::Decode {
            detail: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        let resp = self.authed(self.client.get(&url)).send().await;
        let envelope = Self::decode::<T>(url, resp).await?;
        Ok(envelope.into_result()?)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        let resp = self.authed(self.client.post(&url)).json(body).send().await;
        let envelope = Self::decode::<T>(url, resp).await?;
        Ok(envelope.into_result()?)
    }

    async fn post_ack<B: Serialize>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        let url = self.url(path);
        let resp = self.authed(self.client.post(&url)).json(body).send().await;
        let envelope = Self::decode::<serde_json::Value>(url, resp).await?;
        Ok(envelope.into_ack()?)
    }
}

impl RoomApi for HttpRoomApi {
    async fn create_room(&self, owner_id: &str, max_members: usize) -> Result<Room, ApiError> {
        self.post_json(
            "/room/create",
            &CreateRoomRequest {
                owner_id: owner_id.to_string(),
                max_members,
            },
        )
        .await
    }

    async fn join_room(&self, code: &str, user_id: &str) -> Result<Room, ApiError> {
        self.post_json(
            "/room/join",
            &JoinRoomRequest {
                code: code.to_string(),
                user_id: user_id.to_string(),
            },
        )
        .await
    }

    async fn get_room(&self, code: &str) -> Result<Room, ApiError> {
        self.get_json(&format!("/room/{code}")).await
    }

    async fn start_room(
        &self,
        code: &str,
        scenario_id: &str,
        owner_id: &str,
    ) -> Result<Room, ApiError> {
        self.post_json(
            "/room/start",
            &StartRoomRequest {
                code: code.to_string(),
                scenario_id: scenario_id.to_string(),
                owner_id: owner_id.to_string(),
            },
        )
        .await
    }

    async fn submit_narrative(
        &self,
        code: &str,
        user_id: &str,
        narrative: &str,
        is_public: bool,
    ) -> Result<Room, ApiError> {
        self.post_json(
            "/room/submit",
            &SubmitNarrativeRequest {
                code: code.to_string(),
                user_id: user_id.to_string(),
                narrative: narrative.to_string(),
                is_public,
            },
        )
        .await
    }

    async fn cancel_room(&self, code: &str, user_id: &str) -> Result<(), ApiError> {
        self.post_ack(
            "/room/cancel",
            &CancelRoomRequest {
                code: code.to_string(),
                user_id: user_id.to_string(),
            },
        )
        .await
    }

    async fn vote_cancel(&self, code: &str, user_id: &str) -> Result<Room, ApiError> {
        self.post_json(
            "/room/vote-cancel",
            &VoteCancelRequest {
                code: code.to_string(),
                user_id: user_id.to_string(),
            },
        )
        .await
    }

    async fn get_report(&self, code: &str) -> Result<SituationReport, ApiError> {
        self.get_json(&format!("/room/report/{code}")).await
    }

    async fn get_scenarios(&self) -> Result<Vec<Scenario>, ApiError> {
        self.get_json("/room/scenarios").await
    }

    async fn get_history(&self) -> Result<Vec<Room>, ApiError> {
        self.get_json("/room/history").await
    }

    async fn get_messages(
        &self,
        code: &str,
        after_ms: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let path = match after_ms {
            Some(ts) => format!("/room/{code}/messages?after={ts}"),
            None => format!("/room/{code}/messages"),
        };
        self.get_json(&path).await
    }

    async fn send_message(
        &self,
        code: &str,
        user_id: &str,
        text: &str,
    ) -> Result<ChatMessage, ApiError> {
        self.post_json(
            &format!("/room/{code}/messages"),
            &SendMessageRequest {
                user_id: user_id.to_string(),
                text: text.to_string(),
            },
        )
        .await
    }
}
