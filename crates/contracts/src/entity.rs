//! Catalog entities as handed over by the indexing platform

use serde_json::{Map, Value};
use std::fmt;

use crate::{ContractError, EntityId};

/// Collection name used by the product indexer
pub const PRODUCT_COLLECTION: &str = "product";

/// Collection name used by the category indexer
pub const CATEGORY_COLLECTION: &str = "category";

/// Fields whose non-empty presence marks a parent entity
const CHILD_COLLECTION_FIELDS: [&str; 2] = ["variants", "children"];

/// Structural shape of an entity, declared by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityShape {
    /// Flat entity (e.g. a simple product)
    Leaf,
    /// Entity carrying a non-empty collection of children (e.g. a configurable product)
    Parent,
}

impl EntityShape {
    /// Classify a raw JSON body.
    ///
    /// For collaborators that only hold raw documents; everything else should
    /// declare the shape explicitly.
    pub fn infer(body: &Map<String, Value>) -> Self {
        let has_children = CHILD_COLLECTION_FIELDS
            .iter()
            .filter_map(|field| body.get(*field))
            .any(|value| match value {
                Value::Null => false,
                Value::Array(items) => !items.is_empty(),
                Value::Object(fields) => !fields.is_empty(),
                _ => true,
            });

        if has_children {
            Self::Parent
        } else {
            Self::Leaf
        }
    }
}

/// An entity to publish: explicit shape plus its JSON document
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntity {
    shape: EntityShape,
    body: Map<String, Value>,
}

impl CatalogEntity {
    pub fn new(shape: EntityShape, body: Map<String, Value>) -> Self {
        Self { shape, body }
    }

    pub fn leaf(body: Map<String, Value>) -> Self {
        Self::new(EntityShape::Leaf, body)
    }

    pub fn parent(body: Map<String, Value>) -> Self {
        Self::new(EntityShape::Parent, body)
    }

    /// Accept a raw JSON object, inferring its shape
    pub fn from_value(value: Value) -> Result<Self, ContractError> {
        match value {
            Value::Object(body) => Ok(Self::new(EntityShape::infer(&body), body)),
            other => Err(ContractError::validation(
                "entity",
                format!("entity must be a JSON object, got {other}"),
            )),
        }
    }

    pub fn shape(&self) -> EntityShape {
        self.shape
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// The entity's `id` field
    pub fn id(&self) -> Result<EntityId, ContractError> {
        let raw = self
            .body
            .get("id")
            .ok_or_else(|| ContractError::validation("id", "entity has no 'id' field"))?;
        EntityId::from_json(raw)
    }

    /// Compact JSON encoding of the body, the payload of a publish event
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, ContractError> {
        serde_json::to_vec(&self.body)
            .map_err(|e| ContractError::serialization("failed to encode entity body", e))
    }
}

/// Fully qualified content type of an entity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// Product without variants
    SimpleProduct,
    /// Product with variants
    MasterProduct,
    /// Product whose body is unknown (unpublish)
    Product,
    Category,
    /// Any other collection; the collection name is both root and full name
    Other(String),
}

impl EntityType {
    /// Type family used in entity keys
    pub fn root_type(&self) -> &str {
        match self {
            Self::SimpleProduct | Self::MasterProduct | Self::Product => PRODUCT_COLLECTION,
            Self::Category => CATEGORY_COLLECTION,
            Self::Other(name) => name,
        }
    }

    /// Name written into `data.type`
    pub fn fully_qualified_name(&self) -> &str {
        match self {
            Self::SimpleProduct => "product/simple",
            Self::MasterProduct => "product/master",
            Self::Product => PRODUCT_COLLECTION,
            Self::Category => CATEGORY_COLLECTION,
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fully_qualified_name())
    }
}
