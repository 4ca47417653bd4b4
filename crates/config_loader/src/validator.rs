//! 配置校验模块
//!
//! 校验规则：
//! - 字段级规则 (derive `Validate`)：非空、URL、超时 > 0
//! - tenant id 唯一, tenant code 唯一
//! - tenant code 不含 key 分隔符
//! - ingestion 地址必须为 http(s)
//! - 任一租户启用队列投递时必须配置 broker

use std::collections::HashSet;

use contracts::{ContractError, PublisherBlueprint};
use ::validator::Validate;

/// 校验 PublisherBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &PublisherBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_tenant_ids(blueprint)?;
    validate_tenant_codes(blueprint)?;
    validate_endpoints(blueprint)?;
    validate_broker(blueprint)?;
    Ok(())
}

/// 字段级校验
fn validate_fields(blueprint: &PublisherBlueprint) -> Result<(), ContractError> {
    blueprint
        .validate()
        .map_err(|errors| ContractError::config_validation("blueprint", errors.to_string()))
}

/// 校验 tenant id 唯一性
fn validate_tenant_ids(blueprint: &PublisherBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for tenant in &blueprint.tenants {
        if !seen.insert(tenant.id) {
            return Err(ContractError::config_validation(
                format!("tenants[id={}]", tenant.id),
                "duplicate tenant id",
            ));
        }
    }
    Ok(())
}

/// 校验 tenant code 唯一性与字符
fn validate_tenant_codes(blueprint: &PublisherBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for tenant in &blueprint.tenants {
        if tenant.code.contains(':') || tenant.code.chars().any(char::is_whitespace) {
            return Err(ContractError::config_validation(
                format!("tenants[id={}].code", tenant.id),
                format!("code '{}' must not contain ':' or whitespace", tenant.code),
            ));
        }
        if !seen.insert(tenant.code.as_str()) {
            return Err(ContractError::config_validation(
                format!("tenants[id={}].code", tenant.id),
                format!("duplicate tenant code '{}'", tenant.code),
            ));
        }
    }
    Ok(())
}

/// 校验 ingestion 地址
fn validate_endpoints(blueprint: &PublisherBlueprint) -> Result<(), ContractError> {
    for tenant in &blueprint.tenants {
        let url = tenant.ingestion_base_url.to_ascii_lowercase();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ContractError::config_validation(
                format!("tenants[id={}].ingestion_base_url", tenant.id),
                format!(
                    "ingestion_base_url must be http(s), got '{}'",
                    tenant.ingestion_base_url
                ),
            ));
        }
        if tenant.publish_event_type == tenant.unpublish_event_type {
            return Err(ContractError::config_validation(
                format!("tenants[id={}].unpublish_event_type", tenant.id),
                "publish and unpublish event types must differ",
            ));
        }
    }
    Ok(())
}

/// 校验 broker 配置
fn validate_broker(blueprint: &PublisherBlueprint) -> Result<(), ContractError> {
    if blueprint.broker.is_none() && blueprint.any_broker_enabled() {
        let tenant_ids: Vec<String> = blueprint
            .tenants
            .iter()
            .filter(|t| t.broker_enabled)
            .map(|t| t.id.to_string())
            .collect();
        return Err(ContractError::config_validation(
            "broker",
            format!(
                "broker section is required by tenants with broker_enabled: {}",
                tenant_ids.join(", ")
            ),
        ));
    }
    Ok(())
}
