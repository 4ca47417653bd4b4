//! 租户配置提供者
//!
//! - `StaticTenantConfig`: 内存中的固定配置
//! - `ReloadingTenantConfig`: 文件修改时间变化时重新加载，无需重启

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use contracts::{ContractError, PublisherBlueprint, TenantConfigProvider, TenantSettings};
use tracing::{debug, info, warn};

use crate::ConfigLoader;

/// 固定配置，适用于测试和单次命令
#[derive(Debug, Clone)]
pub struct StaticTenantConfig {
    tenants: Vec<TenantSettings>,
}

impl StaticTenantConfig {
    pub fn new(tenants: Vec<TenantSettings>) -> Self {
        Self { tenants }
    }

    pub fn from_blueprint(blueprint: &PublisherBlueprint) -> Self {
        Self::new(blueprint.tenants.clone())
    }
}

impl TenantConfigProvider for StaticTenantConfig {
    fn settings(&self, tenant_id: i64) -> Result<TenantSettings, ContractError> {
        self.tenants
            .iter()
            .find(|t| t.id == tenant_id)
            .cloned()
            .ok_or(ContractError::UnknownTenant { tenant_id })
    }
}

struct Snapshot {
    blueprint: PublisherBlueprint,
    modified: Option<SystemTime>,
}

/// 基于文件的配置，每次查询时检查修改时间
///
/// 重新加载失败时保留上一次有效配置并记录警告。
pub struct ReloadingTenantConfig {
    path: PathBuf,
    current: RwLock<Snapshot>,
}

impl ReloadingTenantConfig {
    /// 首次加载必须成功
    ///
    /// # Errors
    /// 文件读取、解析或校验失败
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ContractError> {
        let path = path.into();
        let modified = modified_time(&path);
        let blueprint = ConfigLoader::load_from_path(&path)?;
        info!(path = %path.display(), tenants = blueprint.tenants.len(), "Tenant config loaded");

        Ok(Self {
            path,
            current: RwLock::new(Snapshot {
                blueprint,
                modified,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 当前有效配置的副本
    pub fn blueprint(&self) -> PublisherBlueprint {
        self.refresh();
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .blueprint
            .clone()
    }

    /// 强制重新加载
    ///
    /// # Errors
    /// 解析或校验失败时返回错误，当前配置保持不变
    pub fn reload(&self) -> Result<(), ContractError> {
        let modified = modified_time(&self.path);
        let blueprint = ConfigLoader::load_from_path(&self.path)?;
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Snapshot {
            blueprint,
            modified,
        };
        info!(
            path = %self.path.display(),
            tenants = current.blueprint.tenants.len(),
            "Tenant config reloaded"
        );
        Ok(())
    }

    /// 修改时间变化时重新加载
    fn refresh(&self) {
        let modified = modified_time(&self.path);
        let stale = {
            let current = self.current.read().unwrap_or_else(PoisonError::into_inner);
            modified.is_some() && modified != current.modified
        };
        if !stale {
            return;
        }

        debug!(path = %self.path.display(), "Tenant config changed on disk");
        if let Err(e) = self.reload() {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Tenant config reload failed, keeping last good config"
            );
            // 记录本次修改时间，避免每次查询都重复解析同一个坏文件
            let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
            current.modified = modified;
        }
    }
}

impl TenantConfigProvider for ReloadingTenantConfig {
    fn settings(&self, tenant_id: i64) -> Result<TenantSettings, ContractError> {
        self.refresh();
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .blueprint
            .tenant(tenant_id)
            .cloned()
            .ok_or(ContractError::UnknownTenant { tenant_id })
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}
