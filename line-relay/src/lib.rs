//! LINE Relay - webhook-driven LINE Messaging API relay.
//!
//! ## Architecture
//!
//! ```text
//! LINE → /callback → verify signature → dispatch → reply API
//! caller → /sendLineMessage → push API (USER_ID)
//! ```

pub mod config;
pub mod dispatch;
pub mod line;
pub mod web;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use dispatch::{dispatch_events, reply_for, DispatchSummary};
pub use line::{LineClient, LineError, Messenger};
pub use web::{router, AppState};
