//! Indexable attribute selection per tenant

use std::sync::Arc;

use contracts::{ContractError, TenantConfigProvider};
use serde::{Deserialize, Serialize};

/// A catalog attribute: numeric id plus its code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
    pub id: i64,
    pub code: String,
}

impl AttributeDefinition {
    pub fn new(id: i64, code: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
        }
    }
}

/// Selects the attributes a tenant has configured for indexing.
///
/// An empty configured list means every attribute is indexed.
pub struct IndexableAttributesFilter {
    provider: Arc<dyn TenantConfigProvider>,
}

impl IndexableAttributesFilter {
    pub fn new(provider: Arc<dyn TenantConfigProvider>) -> Self {
        Self { provider }
    }

    /// Ids of the attributes indexable on main products
    pub fn indexable_product_attribute_ids(
        &self,
        attributes: &[AttributeDefinition],
        tenant_id: i64,
    ) -> Result<Vec<i64>, ContractError> {
        let settings = self.provider.settings(tenant_id)?;
        Ok(filter_ids(attributes, &settings.product_attributes))
    }

    /// Ids of the attributes indexable on child (variant) products
    pub fn indexable_child_product_attribute_ids(
        &self,
        attributes: &[AttributeDefinition],
        tenant_id: i64,
    ) -> Result<Vec<i64>, ContractError> {
        let settings = self.provider.settings(tenant_id)?;
        Ok(filter_ids(attributes, &settings.child_product_attributes))
    }

    /// Explicit membership; an empty list selects nothing here
    pub fn is_indexable_product_attribute(
        &self,
        code: &str,
        tenant_id: i64,
    ) -> Result<bool, ContractError> {
        let settings = self.provider.settings(tenant_id)?;
        Ok(settings.product_attributes.iter().any(|c| c == code))
    }

    pub fn is_indexable_child_product_attribute(
        &self,
        code: &str,
        tenant_id: i64,
    ) -> Result<bool, ContractError> {
        let settings = self.provider.settings(tenant_id)?;
        Ok(settings.child_product_attributes.iter().any(|c| c == code))
    }
}

fn filter_ids(attributes: &[AttributeDefinition], codes: &[String]) -> Vec<i64> {
    attributes
        .iter()
        .filter(|a| codes.is_empty() || codes.contains(&a.code))
        .map(|a| a.id)
        .collect()
}
