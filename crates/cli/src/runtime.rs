//! Composition root: wires codec, transport, channels and publisher.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use config_loader::ReloadingTenantConfig;
use contracts::{Tenant, TenantConfigProvider};
use dispatcher::{create_router, AmqpBroker, DeliveryOutcome, HttpTransport};
use envelope_codec::EnvelopeCodec;
use publisher::CatalogPublisher;

/// Everything a publish/unpublish command needs
pub struct Runtime {
    pub publisher: CatalogPublisher<AmqpBroker>,
    provider: Arc<ReloadingTenantConfig>,
}

impl Runtime {
    /// Load configuration and build the delivery pipeline
    pub fn build(config: &Path) -> Result<Self> {
        info!(config = %config.display(), "Loading configuration");

        let provider = Arc::new(
            ReloadingTenantConfig::open(config)
                .with_context(|| format!("Failed to load config from {}", config.display()))?,
        );
        let blueprint = provider.blueprint();

        let codec = EnvelopeCodec::new();
        let transport = Arc::new(HttpTransport::new());
        let shared: Arc<dyn TenantConfigProvider> = provider.clone();

        let router = create_router(&blueprint, codec, transport, shared.clone())
            .context("Failed to create delivery router")?;

        info!(
            tenants = blueprint.tenants.len(),
            broker = blueprint.broker.is_some(),
            max_in_flight = blueprint.delivery.max_in_flight,
            "Delivery pipeline ready"
        );

        Ok(Self {
            publisher: CatalogPublisher::new(codec, router, shared),
            provider,
        })
    }

    /// Identity of a configured store
    pub fn tenant(&self, tenant_id: i64) -> Result<Tenant> {
        let settings = self
            .provider
            .settings(tenant_id)
            .with_context(|| format!("Store {tenant_id} is not configured"))?;
        Ok(settings.tenant())
    }

    /// Print the outcome and per-channel counters; non-delivery is an error
    pub fn report(&self, outcome: &DeliveryOutcome) -> Result<()> {
        for (channel, snapshot) in self.publisher.router().metrics() {
            if snapshot.attempts() > 0 {
                info!(
                    channel = %channel,
                    delivered = snapshot.delivered_count,
                    rejected = snapshot.rejected_count,
                    failed = snapshot.failed_count,
                    envelopes = snapshot.envelope_count,
                    "Channel summary"
                );
            }
        }

        match outcome {
            DeliveryOutcome::Delivered { channel } => {
                println!("✓ Delivered via {} channel", channel);
                Ok(())
            }
            DeliveryOutcome::Skipped => {
                println!("Nothing to deliver");
                Ok(())
            }
            DeliveryOutcome::Rejected { channel } => {
                anyhow::bail!("Delivery rejected on {} channel", channel)
            }
            DeliveryOutcome::Failed { channel, reason } => {
                anyhow::bail!("Delivery failed on {} channel: {}", channel, reason)
            }
        }
    }
}
