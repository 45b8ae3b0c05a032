//! Webhook endpoint handlers.
//!
//! Each handler is a single pass: validate, then dispatch. Validation
//! failures short-circuit to an error status; everything after validation
//! ends in an explicit `200 OK`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{any, get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::dispatch::dispatch_events;
use crate::line::{Messenger, SIGNATURE_HEADER};
use crate::web::push::send_line_message;
use crate::Config;

/// Shared application state.
///
/// Read-only after startup; cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub messenger: Arc<dyn Messenger>,
}

impl AppState {
    pub fn new(config: Config, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            config: Arc::new(config),
            messenger,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/callback", post(callback))
        // Every method reaches the handler so non-POST gets a 400, not a 405
        .route("/sendLineMessage", any(send_line_message))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// LINE Webhook
// =============================================================================

/// LINE webhook endpoint.
///
/// 1. Verifies `x-line-signature` and parses the events
/// 2. Replies to each event in order
/// 3. Returns 200 OK whatever the individual replies did
pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    info!(
        body_length = body.len(),
        has_signature = headers.contains_key(SIGNATURE_HEADER),
        "callback_received"
    );

    let events = match state.messenger.parse_request(&headers, &body) {
        Ok(events) => events,
        Err(e) if e.is_invalid_signature() => {
            warn!("callback_signature_invalid");
            return StatusCode::BAD_REQUEST;
        }
        Err(e) => {
            error!(error = %e, "callback_parse_failed");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    info!(event_count = events.len(), "callback_events_parsed");

    dispatch_events(state.messenger.as_ref(), &events).await;

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::sign;
    use crate::testing::{RecordingMessenger, TEST_SECRET};
    use axum::{
        body::Body,
        http::{Method, Request},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;
    use url::Url;

    fn test_config() -> Config {
        Config {
            channel_secret: TEST_SECRET.to_string(),
            channel_token: "test-token".to_string(),
            user_id: Some("U123".to_string()),
            port: 0,
            api_base_url: Url::parse("http://127.0.0.1:1").unwrap(),
            request_timeout_ms: 1_000,
        }
    }

    fn app(messenger: Arc<RecordingMessenger>) -> Router {
        router(AppState::new(test_config(), messenger))
    }

    fn callback_request(body: &str, signature: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/callback")
            .header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn signed_request(body: &str) -> Request<Body> {
        let signature = sign(TEST_SECRET, body.as_bytes()).unwrap();
        callback_request(body, Some(&signature))
    }

    const TEXT_AND_STICKER: &str = r#"{
        "destination": "Ubot",
        "events": [
            {"type": "message", "replyToken": "r1", "timestamp": 1,
             "source": {"type": "user", "userId": "U1"},
             "message": {"type": "text", "id": "1", "text": "hi"}},
            {"type": "message", "replyToken": "r2", "timestamp": 2,
             "source": {"type": "user", "userId": "U1"},
             "message": {"type": "sticker", "id": "2", "packageId": "1",
                         "stickerId": "123", "stickerResourceType": "STATIC"}}
        ]
    }"#;

    #[tokio::test]
    async fn test_health() {
        let resp = app(Arc::new(RecordingMessenger::new()))
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], br#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn test_callback_replies_in_order() {
        let messenger = Arc::new(RecordingMessenger::new());

        let resp = app(messenger.clone())
            .oneshot(signed_request(TEXT_AND_STICKER))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            messenger.replies(),
            vec![
                ("r1".to_string(), "hi".to_string()),
                (
                    "r2".to_string(),
                    "sticker id is 123, stickerResourceType is STATIC".to_string()
                ),
            ]
        );
        assert!(messenger.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_callback_invalid_signature() {
        let messenger = Arc::new(RecordingMessenger::new());

        let resp = app(messenger.clone())
            .oneshot(callback_request(TEXT_AND_STICKER, Some("aW52YWxpZA==")))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(messenger.replies().is_empty());
        assert!(messenger.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_callback_missing_signature() {
        let messenger = Arc::new(RecordingMessenger::new());

        let resp = app(messenger.clone())
            .oneshot(callback_request(TEXT_AND_STICKER, None))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(messenger.replies().is_empty());
    }

    #[tokio::test]
    async fn test_callback_malformed_payload() {
        let messenger = Arc::new(RecordingMessenger::new());

        let resp = app(messenger.clone())
            .oneshot(signed_request("{\"events\": [oops"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(messenger.replies().is_empty());
        assert!(messenger.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_callback_reply_failure_still_ok() {
        let messenger = Arc::new(RecordingMessenger::new().failing_reply("r1"));

        let resp = app(messenger.clone())
            .oneshot(signed_request(TEXT_AND_STICKER))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        // Second event still processed after the first reply failed
        assert_eq!(messenger.replies().len(), 2);
        assert_eq!(messenger.replies()[1].0, "r2");
    }

    #[tokio::test]
    async fn test_callback_ignores_non_message_events() {
        let messenger = Arc::new(RecordingMessenger::new());
        let body = r#"{"destination": "Ubot", "events": [
            {"type": "follow", "replyToken": "r1", "timestamp": 1},
            {"type": "message", "replyToken": "r2", "timestamp": 2,
             "message": {"type": "location", "id": "3", "latitude": 35.0, "longitude": 139.0}}
        ]}"#;

        let resp = app(messenger.clone())
            .oneshot(signed_request(body))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(messenger.replies().is_empty());
    }

    #[tokio::test]
    async fn test_callback_empty_batch() {
        // LINE sends an empty batch when verifying the webhook URL
        let messenger = Arc::new(RecordingMessenger::new());

        let resp = app(messenger.clone())
            .oneshot(signed_request(r#"{"destination": "Ubot", "events": []}"#))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(messenger.replies().is_empty());
    }
}
