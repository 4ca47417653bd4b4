//! MessageBroker implementations for the queued channel

mod amqp;
mod memory;

pub use amqp::AmqpBroker;
pub use memory::InMemoryBroker;
