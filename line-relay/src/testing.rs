//! Test doubles shared by unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::HeaderMap;

use crate::line::{parse_webhook, Event, EventKind, LineError, Message, Messenger, OutboundMessage};

/// Channel secret the recording messenger verifies against.
pub const TEST_SECRET: &str = "test-channel-secret";

/// Build a message event with the given reply token.
pub fn message_event(reply_token: &str, message: Message) -> Event {
    Event {
        kind: EventKind::Message,
        reply_token: Some(reply_token.to_string()),
        source: None,
        timestamp: 0,
        message: Some(message),
    }
}

/// `Messenger` that records every call instead of talking to LINE.
///
/// Attempts are recorded even when configured to fail.
#[derive(Default)]
pub struct RecordingMessenger {
    replies: Mutex<Vec<(String, String)>>,
    pushes: Mutex<Vec<(String, String)>>,
    failing_tokens: HashSet<String>,
    fail_push: bool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make replies with this token fail with an API error.
    pub fn failing_reply(mut self, reply_token: &str) -> Self {
        self.failing_tokens.insert(reply_token.to_string());
        self
    }

    /// Make every push fail with an API error.
    pub fn failing_push(mut self) -> Self {
        self.fail_push = true;
        self
    }

    pub fn replies(&self) -> Vec<(String, String)> {
        self.replies.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<(String, String)> {
        self.pushes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    fn parse_request(&self, headers: &HeaderMap, body: &[u8]) -> Result<Vec<Event>, LineError> {
        parse_webhook(TEST_SECRET, headers, body)
    }

    async fn reply(&self, reply_token: &str, messages: &[OutboundMessage]) -> Result<(), LineError> {
        let mut replies = self.replies.lock().unwrap();
        for message in messages {
            replies.push((reply_token.to_string(), message.content().to_string()));
        }

        if self.failing_tokens.contains(reply_token) {
            return Err(LineError::Api {
                status: 400,
                body: r#"{"message":"Invalid reply token"}"#.to_string(),
            });
        }
        Ok(())
    }

    async fn push(&self, to: &str, messages: &[OutboundMessage]) -> Result<(), LineError> {
        let mut pushes = self.pushes.lock().unwrap();
        for message in messages {
            pushes.push((to.to_string(), message.content().to_string()));
        }

        if self.fail_push {
            return Err(LineError::Api {
                status: 500,
                body: "{}".to_string(),
            });
        }
        Ok(())
    }
}
