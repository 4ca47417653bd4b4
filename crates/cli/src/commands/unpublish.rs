//! `unpublish` command implementation.

use anyhow::{Context, Result};
use tracing::info;

use contracts::EntityId;

use crate::cli::UnpublishArgs;
use crate::runtime::Runtime;

/// Execute the `unpublish` command
pub async fn run_unpublish(args: &UnpublishArgs) -> Result<()> {
    let ids = args
        .ids
        .iter()
        .map(|raw| EntityId::parse(raw).with_context(|| format!("Invalid entity id '{raw}'")))
        .collect::<Result<Vec<_>>>()?;

    let runtime = Runtime::build(&args.config)?;
    let tenant = runtime.tenant(args.tenant)?;

    info!(
        tenant_id = tenant.id,
        collection = %args.collection,
        count = ids.len(),
        "Unpublishing entities"
    );

    let outcome = runtime
        .publisher
        .unpublish(&ids, &args.collection, &tenant)
        .await
        .context("Failed to build events")?;

    runtime.report(&outcome)
}
