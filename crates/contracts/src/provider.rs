//! TenantConfigProvider trait - per-tenant settings lookup

use crate::{ContractError, TenantSettings};

/// Source of tenant settings.
///
/// Called on every delivery so changes apply without restart; implementations
/// must be cheap and thread-safe.
pub trait TenantConfigProvider: Send + Sync {
    /// Current settings of the tenant
    ///
    /// # Errors
    /// `UnknownTenant` when no settings exist
    fn settings(&self, tenant_id: i64) -> Result<TenantSettings, ContractError>;
}

impl<P: TenantConfigProvider + ?Sized> TenantConfigProvider for std::sync::Arc<P> {
    fn settings(&self, tenant_id: i64) -> Result<TenantSettings, ContractError> {
        (**self).settings(tenant_id)
    }
}
