//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors, raised while wiring channels
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Channel creation error
    #[error("failed to create channel '{name}': {message}")]
    ChannelCreation { name: String, message: String },

    /// Tenants route through the broker but no queued channel is wired
    #[error("tenants {tenant_ids:?} enable the broker but no queued channel is configured")]
    MissingBroker { tenant_ids: Vec<i64> },
}

impl DispatcherError {
    /// Create a channel creation error
    pub fn channel_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChannelCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
