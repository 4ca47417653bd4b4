//! Delivery channels

mod direct;
mod queued;

pub use direct::{AckReader, DirectChannel, CLOUDEVENTS_BATCH_CONTENT_TYPE};
pub use queued::QueuedChannel;

use std::fmt;

/// The two mutually exclusive delivery paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Synchronous HTTP POST to the ingestion endpoint
    Direct,
    /// Ingestion request published to the message broker
    Queued,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Queued => "queued",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
