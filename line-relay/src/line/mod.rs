//! LINE Messaging API plumbing.
//!
//! This module provides:
//! - Wire types for webhook deliveries and outbound messages
//! - `x-line-signature` verification
//! - The `Messenger` seam and its `reqwest` implementation

pub mod client;
pub mod signature;
pub mod types;

pub use client::{parse_webhook, LineClient, LineError, Messenger, PUSH_PATH, REPLY_PATH};
pub use signature::{sign, verify_signature, SIGNATURE_HEADER};
pub use types::{
    Event, EventKind, Message, OutboundMessage, PushRequest, ReplyRequest, Source, WebhookPayload,
};
