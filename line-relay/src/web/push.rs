//! Push forwarding endpoint.
//!
//! Forwards a raw request body as a text message to the configured
//! recipient. The body is read up to the declared `Content-Length`.

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_LENGTH, HeaderMap, Method, StatusCode},
};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::line::OutboundMessage;
use crate::web::handlers::AppState;

/// Upper bound on the buffer reserved up front from `Content-Length`.
const MAX_PREALLOC_BYTES: usize = 64 * 1024;

/// Push endpoint.
///
/// 1. Requires POST (400 otherwise)
/// 2. Requires a numeric `Content-Length` (500 otherwise)
/// 3. Fails with 500 if the body stream errors before it ends
/// 4. Pushes the body text to `USER_ID` when one is configured
/// 5. Returns 200 OK; push failures are only logged
pub async fn send_line_message(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    body: Body,
) -> StatusCode {
    if method != Method::POST {
        warn!(method = %method, "push_method_not_allowed");
        return StatusCode::BAD_REQUEST;
    }

    let Some(declared) = content_length(&headers) else {
        error!(
            content_length = ?headers.get(CONTENT_LENGTH),
            "push_content_length_invalid"
        );
        return StatusCode::INTERNAL_SERVER_ERROR;
    };

    let bytes = match read_declared(body, declared).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, expected_length = declared, "push_body_read_failed");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };
    let text = String::from_utf8_lossy(&bytes).into_owned();

    info!(body_length = bytes.len(), "push_body_read");
    debug!(body = %text, "push_body");

    let Some(recipient) = state.config.user_id.as_deref() else {
        warn!("push_recipient_empty");
        return StatusCode::OK;
    };

    info!(recipient = %recipient, "push_sending");

    if let Err(e) = state
        .messenger
        .push(recipient, &[OutboundMessage::text(text)])
        .await
    {
        error!(recipient = %recipient, error = %e, "push_failed");
    }

    StatusCode::OK
}

/// Parse the `Content-Length` header.
fn content_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Read at most `declared` bytes from `body`.
///
/// An early end of stream is a short read: whatever arrived so far is
/// returned and a warning is logged. A stream error is returned as is.
async fn read_declared(body: Body, declared: usize) -> Result<Vec<u8>, axum::Error> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::with_capacity(declared.min(MAX_PREALLOC_BYTES));

    while buf.len() < declared {
        match stream.next().await {
            Some(Ok(chunk)) => {
                let take = (declared - buf.len()).min(chunk.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Some(Err(e)) => return Err(e),
            None => break,
        }
    }

    if buf.len() < declared {
        warn!(
            expected_length = declared,
            received_length = buf.len(),
            "push_body_short_read"
        );
    }

    Ok(buf)
}
