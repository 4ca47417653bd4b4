//! Entity key and content type resolution

use contracts::{
    CatalogEntity, ContractError, EntityId, EntityShape, EntityType, Tenant, CATEGORY_COLLECTION,
    PRODUCT_COLLECTION,
};

/// Content type of an entity being published
///
/// # Errors
/// `Validation` if the collection name is empty
pub fn type_for_publish(
    entity: &CatalogEntity,
    collection: &str,
) -> Result<EntityType, ContractError> {
    match checked(collection)? {
        PRODUCT_COLLECTION => Ok(match entity.shape() {
            EntityShape::Parent => EntityType::MasterProduct,
            EntityShape::Leaf => EntityType::SimpleProduct,
        }),
        CATEGORY_COLLECTION => Ok(EntityType::Category),
        other => Ok(EntityType::Other(other.to_string())),
    }
}

/// Content type of an entity being unpublished; only its id is known
///
/// # Errors
/// `Validation` if the collection name is empty
pub fn type_for_unpublish(collection: &str) -> Result<EntityType, ContractError> {
    match checked(collection)? {
        PRODUCT_COLLECTION => Ok(EntityType::Product),
        CATEGORY_COLLECTION => Ok(EntityType::Category),
        other => Ok(EntityType::Other(other.to_string())),
    }
}

/// `{tenant_code}_{root_type}:{entity_id}`
pub fn key_of(entity_type: &EntityType, entity_id: &EntityId, tenant: &Tenant) -> String {
    format!("{}_{}:{}", tenant.code, entity_type.root_type(), entity_id)
}

fn checked(collection: &str) -> Result<&str, ContractError> {
    let collection = collection.trim();
    if collection.is_empty() {
        return Err(ContractError::validation("collection", "collection name is empty"));
    }
    Ok(collection)
}
