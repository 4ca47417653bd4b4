//! InMemoryBroker - records published messages (tests and dry runs)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use contracts::{BrokerMessage, ContractError, MessageBroker};
use tracing::debug;

#[derive(Debug, Default)]
struct Inner {
    messages: Mutex<Vec<BrokerMessage>>,
    failing: AtomicBool,
}

/// Broker that keeps every message in memory.
///
/// Clones share the same message log, so a test can keep a handle while the
/// router owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A broker whose every publish fails
    pub fn unavailable() -> Self {
        let broker = Self::new();
        broker.set_available(false);
        broker
    }

    pub fn set_available(&self, available: bool) {
        self.inner.failing.store(!available, Ordering::Relaxed);
    }

    /// Messages published so far, in order
    pub fn messages(&self) -> Vec<BrokerMessage> {
        self.inner
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.inner
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageBroker for InMemoryBroker {
    fn name(&self) -> &str {
        "memory"
    }

    async fn publish(&self, message: BrokerMessage) -> Result<(), ContractError> {
        if self.inner.failing.load(Ordering::Relaxed) {
            return Err(ContractError::publish("memory", "broker unavailable"));
        }

        let mut messages = self
            .inner
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        messages.push(message);
        debug!(total = messages.len(), "Message stored");
        Ok(())
    }
}
