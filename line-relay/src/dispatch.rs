//! Event dispatch.
//!
//! Maps each inbound event to at most one reply and sends the replies in
//! delivery order. A failed reply is logged and never stops the batch.
//!
//! ```text
//! Event → reply_for() → OutboundMessage → Messenger::reply()
//! ```

use tracing::{error, info, warn};

use crate::line::{Event, EventKind, Message, Messenger, OutboundMessage};

/// Outcome counts for one webhook delivery.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSummary {
    pub replied: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// The reply an event calls for, if any.
pub fn reply_for(event: &Event) -> Option<OutboundMessage> {
    if event.kind != EventKind::Message {
        return None;
    }

    match event.message.as_ref()? {
        Message::Text { text, .. } => Some(OutboundMessage::text(text.clone())),
        Message::Sticker {
            sticker_id,
            sticker_resource_type,
            ..
        } => Some(OutboundMessage::text(format!(
            "sticker id is {}, stickerResourceType is {}",
            sticker_id, sticker_resource_type
        ))),
        Message::Other => None,
    }
}

/// Reply to every event in order.
pub async fn dispatch_events(messenger: &dyn Messenger, events: &[Event]) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    for (index, event) in events.iter().enumerate() {
        let Some(message) = reply_for(event) else {
            summary.skipped += 1;
            continue;
        };

        let Some(reply_token) = event.reply_token.as_deref() else {
            warn!(event_index = index, "event_missing_reply_token");
            summary.skipped += 1;
            continue;
        };

        match messenger.reply(reply_token, std::slice::from_ref(&message)).await {
            Ok(()) => summary.replied += 1,
            Err(e) => {
                error!(event_index = index, error = %e, "reply_failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        event_count = events.len(),
        replied = summary.replied,
        failed = summary.failed,
        skipped = summary.skipped,
        "dispatch_complete"
    );

    summary
}
