//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    tenant_count: usize,
    broker_configured: bool,
    queued_tenants: Vec<i64>,
    max_in_flight: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            let queued_tenants = blueprint
                .tenants
                .iter()
                .filter(|t| t.broker_enabled)
                .map(|t| t.id)
                .collect();

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    tenant_count: blueprint.tenants.len(),
                    broker_configured: blueprint.broker.is_some(),
                    queued_tenants,
                    max_in_flight: blueprint.delivery.max_in_flight,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &contracts::PublisherBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.tenants.is_empty() {
        warnings.push("No stores configured - every publish will fail".to_string());
    }

    if blueprint.broker.is_some() && !blueprint.any_broker_enabled() {
        warnings.push("Broker configured but no store has broker_enabled set".to_string());
    }

    for tenant in &blueprint.tenants {
        if tenant.ingestion_base_url.starts_with("https://") && tenant.auth_token.is_none() {
            warnings.push(format!(
                "Store {} ({}) uses HTTPS without an auth token",
                tenant.id, tenant.code
            ));
        }
        if !tenant.verify_tls {
            warnings.push(format!(
                "Store {} ({}) has TLS verification disabled",
                tenant.id, tenant.code
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Stores: {}", summary.tenant_count);
            println!("  Broker: {}", if summary.broker_configured { "configured" } else { "none" });
            println!("  Queued stores: {:?}", summary.queued_tenants);
            println!("  Max in-flight requests: {}", summary.max_in_flight);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PublisherBlueprint, TenantSettings};

    fn blueprint(tenants: Vec<TenantSettings>) -> PublisherBlueprint {
        PublisherBlueprint {
            version: Default::default(),
            delivery: Default::default(),
            broker: None,
            tenants,
        }
    }

    #[test]
    fn test_warns_on_empty_tenants() {
        let warnings = collect_warnings(&blueprint(vec![]));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("No stores"));
    }

    #[test]
    fn test_warns_on_insecure_tenant() {
        let mut tenant = TenantSettings::new(1, "default", "https://ingestion.example.com");
        tenant.verify_tls = false;
        let warnings = collect_warnings(&blueprint(vec![tenant]));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let mut tenant = TenantSettings::new(1, "default", "https://ingestion.example.com");
        tenant.auth_token = Some("secret".to_string());
        assert!(collect_warnings(&blueprint(vec![tenant])).is_empty());
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let args = ValidateArgs {
            config: "/nonexistent/publisher.toml".into(),
            json: false,
        };
        let result = validate_config(&args);
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }
}
