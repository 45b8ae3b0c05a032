//! Web server module for the LINE relay endpoints.
//!
//! This module provides:
//! - `POST /callback`: LINE webhook, verified and answered with replies
//! - `POST /sendLineMessage`: forwards the raw body as a push message
//! - `GET /health`: liveness probe

pub mod handlers;
pub mod push;

pub use handlers::{callback, health, router, AppState, HealthResponse};
pub use push::send_line_message;
