//! # Contracts
//!
//! Frozen interface contracts, defining inter-crate data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Envelope Model
//! - One envelope per changed entity, CloudEvents 1.0 structured JSON
//! - `subject` is the entity key, the downstream identity for upsert/delete
//! - `data.content == None` means unpublish

mod broker;
mod entity;
mod entity_id;
mod envelope;
mod error;
mod provider;
mod tenant;

pub use broker::{BrokerMessage, LocalMessageBroker, MessageBroker};
pub use entity::*;
pub use entity_id::EntityId;
pub use envelope::*;
pub use error::*;
pub use provider::TenantConfigProvider;
pub use tenant::*;
