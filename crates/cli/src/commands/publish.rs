//! `publish` command implementation.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::info;

use contracts::CatalogEntity;

use crate::cli::PublishArgs;
use crate::runtime::Runtime;

/// Execute the `publish` command
pub async fn run_publish(args: &PublishArgs) -> Result<()> {
    let entities = read_entities(&args.entities)?;
    let runtime = Runtime::build(&args.config)?;
    let tenant = runtime.tenant(args.tenant)?;

    info!(
        tenant_id = tenant.id,
        collection = %args.collection,
        count = entities.len(),
        "Publishing entities"
    );

    let outcome = runtime
        .publisher
        .publish(&entities, &args.collection, &tenant)
        .await
        .context("Failed to build events")?;

    runtime.report(&outcome)
}

/// Read a JSON array of entity objects (a single object is accepted too)
fn read_entities(path: &Path) -> Result<Vec<CatalogEntity>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read entities from {}", path.display()))?;
    parse_entities(&raw).with_context(|| format!("Invalid entities in {}", path.display()))
}

fn parse_entities(raw: &str) -> Result<Vec<CatalogEntity>> {
    let values = match serde_json::from_str::<Value>(raw)? {
        Value::Array(values) => values,
        single @ Value::Object(_) => vec![single],
        other => anyhow::bail!("expected an object or an array of objects, got {}", other),
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            CatalogEntity::from_value(value).with_context(|| format!("entity #{i}"))
        })
        .collect()
}
