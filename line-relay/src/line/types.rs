//! Messaging API wire types.
//!
//! Inbound: the webhook body LINE posts to `/callback`.
//! Outbound: the reply and push request bodies.

use serde::{Deserialize, Serialize};

// =============================================================================
// Inbound Webhook Types
// =============================================================================

/// One webhook delivery: a batch of events for a single bot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    /// User ID of the bot that should receive the events
    #[serde(default)]
    pub destination: String,
    /// Events in delivery order
    #[serde(default)]
    pub events: Vec<Event>,
}

/// A single inbound event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Single-use token scoping a reply to this event
    #[serde(default)]
    pub reply_token: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub timestamp: i64,
    /// Present only on message events
    #[serde(default)]
    pub message: Option<Message>,
}

/// Event type. Only message events are acted upon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum EventKind {
    Message,
    Other(String),
}

impl From<String> for EventKind {
    fn from(kind: String) -> Self {
        if kind == "message" {
            EventKind::Message
        } else {
            EventKind::Other(kind)
        }
    }
}

/// Where an event came from.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    #[serde(default)]
    pub room_id: Option<String>,
}

/// Message content of a message event.
///
/// Every type other than text and sticker (image, video, audio, file,
/// location, ...) collapses into `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(default)]
        id: String,
        #[serde(default)]
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Sticker {
        #[serde(default)]
        id: String,
        #[serde(default)]
        package_id: String,
        sticker_id: String,
        #[serde(default)]
        sticker_resource_type: String,
    },
    #[serde(other)]
    Other,
}

// =============================================================================
// Outbound Types
// =============================================================================

/// A message sent by the bot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Text { text: String },
}

impl OutboundMessage {
    /// Create a text message.
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }

    /// The text carried by this message.
    pub fn content(&self) -> &str {
        match self {
            OutboundMessage::Text { text } => text,
        }
    }
}

/// Body of `POST /v2/bot/message/reply`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest<'a> {
    pub reply_token: &'a str,
    pub messages: &'a [OutboundMessage],
}

/// Body of `POST /v2/bot/message/push`.
#[derive(Debug, Serialize)]
pub struct PushRequest<'a> {
    pub to: &'a str,
    pub messages: &'a [OutboundMessage],
}
