//! MessageBroker trait - queued channel output interface
//!
//! Defines the abstract interface for brokers.

use bytes::Bytes;
use std::collections::BTreeMap;

use crate::ContractError;

/// A single message handed to the broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    /// Message body
    pub body: Bytes,
    /// Content type of the body
    pub content_type: String,
    /// Routing/filtering headers for consumers
    pub headers: BTreeMap<String, String>,
}

impl BrokerMessage {
    /// Create a JSON message without headers
    pub fn json(body: impl Into<Bytes>) -> Self {
        Self {
            body: body.into(),
            content_type: "application/json".to_string(),
            headers: BTreeMap::new(),
        }
    }

    /// Add a header to the message
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Message broker trait
///
/// All broker implementations must implement this trait.
#[trait_variant::make(MessageBroker: Send)]
pub trait LocalMessageBroker {
    /// Broker name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Publish one message to the broker's configured destination
    ///
    /// # Errors
    /// Returns a publish error (should include destination)
    async fn publish(&self, message: BrokerMessage) -> Result<(), ContractError>;
}
