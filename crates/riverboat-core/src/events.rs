//! Lifecycle notifications.
//!
//! The orchestrator publishes a small event at each pipeline milestone.
//! Publishing is strictly best-effort: a sink failure is logged and
//! swallowed, never surfaced to the caller, and never fails a request.

use async_trait::async_trait;
use tracing::{debug, warn};

use riverboat_types::Result;

/// Channels the pipeline publishes on.
pub mod channels {
    /// An envelope was accepted and persisted.
    pub const RECEIVED: &str = "riverboat_received";
    /// Security validation rejected an envelope.
    pub const SECURITY_FAILED: &str = "riverboat_security_failed";
    /// A package was delivered.
    pub const COMPLETED: &str = "riverboat_completed";
    /// A request failed with a taxonomy error.
    pub const ERROR: &str = "riverboat_error";
}

/// Destination for lifecycle events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()>;
}

/// Sink that logs events instead of delivering them anywhere.
///
/// The default when no external pub/sub collaborator is wired in.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<()> {
        debug!(channel, %payload, "lifecycle event");
        Ok(())
    }
}

/// Publish without letting a sink failure reach the caller.
pub async fn publish_best_effort(sink: &dyn EventSink, channel: &str, payload: serde_json::Value) {
    if let Err(err) = sink.publish(channel, payload).await {
        warn!(channel, error = %err, "event publish failed");
    }
}
