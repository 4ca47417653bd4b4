//! # Publisher
//!
//! Publish / unpublish entry point of the catalog event pipeline.
//!
//! - Resolve each entity's content type and key
//! - Build one envelope per entity
//! - Hand the envelopes to the delivery router

pub mod attributes;
pub mod client;
pub mod resolver;

pub use attributes::{AttributeDefinition, IndexableAttributesFilter};
pub use client::CatalogPublisher;
pub use dispatcher::{Channel, DeliveryOutcome};
pub use resolver::{key_of, type_for_publish, type_for_unpublish};
