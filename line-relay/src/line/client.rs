//! Messaging API client.
//!
//! `Messenger` is the seam the web handlers depend on. `LineClient` is the
//! production implementation over `reqwest`; it is cheap to share and safe
//! to call from concurrent requests.

use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use super::signature::{verify_signature, SIGNATURE_HEADER};
use super::types::{Event, OutboundMessage, PushRequest, ReplyRequest, WebhookPayload};
use crate::Config;

/// Reply endpoint, relative to the API base URL.
pub const REPLY_PATH: &str = "v2/bot/message/reply";

/// Push endpoint, relative to the API base URL.
pub const PUSH_PATH: &str = "v2/bot/message/push";

/// Errors raised by the Messaging API client.
#[derive(Debug, Error)]
pub enum LineError {
    /// Missing or mismatching `x-line-signature`
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Signature was fine but the body is not a webhook payload
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    /// Transport failure talking to the API
    #[error("messaging api request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("messaging api returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid messaging api url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

impl LineError {
    /// True when the request failed signature verification.
    pub fn is_invalid_signature(&self) -> bool {
        matches!(self, LineError::InvalidSignature)
    }
}

/// Operations the relay needs from the messaging platform.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Verify the request signature and decode its events.
    fn parse_request(&self, headers: &HeaderMap, body: &[u8]) -> Result<Vec<Event>, LineError>;

    /// Answer an event through its reply token.
    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), LineError>;

    /// Send messages to a user independent of any event.
    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), LineError>;
}

/// Verify and decode a webhook request.
///
/// The signature is checked over the raw bytes before any parsing.
pub fn parse_webhook(
    channel_secret: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Vec<Event>, LineError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_signature(channel_secret, body, signature) {
        return Err(LineError::InvalidSignature);
    }

    let payload: WebhookPayload = serde_json::from_slice(body)?;
    Ok(payload.events)
}

/// Messaging API client backed by `reqwest`.
#[derive(Clone)]
pub struct LineClient {
    http: Client,
    channel_secret: String,
    channel_token: String,
    base_url: Url,
}

impl LineClient {
    /// Build a client from configuration.
    ///
    /// Blank credentials are rejected here so that a misconfigured process
    /// fails at startup rather than on its first request.
    pub fn new(config: &Config) -> Result<Self, LineError> {
        if config.channel_secret.trim().is_empty() {
            return Err(LineError::Config("channel secret is empty".to_string()));
        }
        if config.channel_token.trim().is_empty() {
            return Err(LineError::Config("channel token is empty".to_string()));
        }

        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            channel_secret: config.channel_secret.clone(),
            channel_token: config.channel_token.clone(),
            base_url: config.api_base_url.clone(),
        })
    }

    async fn post_json<T: Serialize>(&self, path: &str, body: &T) -> Result<(), LineError> {
        let url = self.base_url.join(path)?;

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.channel_token)
            .json(body)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().await.unwrap_or_default();
        warn!(
            path = path,
            status_code = status.as_u16(),
            response_body = %body,
            "line_api_error_response"
        );
        Err(LineError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Messenger for LineClient {
    fn parse_request(&self, headers: &HeaderMap, body: &[u8]) -> Result<Vec<Event>, LineError> {
        parse_webhook(&self.channel_secret, headers, body)
    }

    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), LineError> {
        self.post_json(
            REPLY_PATH,
            &ReplyRequest {
                reply_token,
                messages,
            },
        )
        .await?;

        info!(message_count = messages.len(), "line_reply_sent");
        Ok(())
    }

    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), LineError> {
        self.post_json(PUSH_PATH, &PushRequest { to, messages }).await?;

        info!(to = %to, message_count = messages.len(), "line_push_sent");
        Ok(())
    }
}
