//! DeliveryRouter - picks exactly one channel per call and contains its failures

use std::sync::Arc;
use std::time::Instant;

use contracts::{
    subjects, ContractError, Envelope, MessageBroker, PublisherBlueprint, Tenant,
    TenantConfigProvider,
};
use envelope_codec::{EnvelopeCodec, IngestionRequest};
use tracing::{error, info, instrument, warn};

use crate::broker::AmqpBroker;
use crate::channels::{Channel, DirectChannel, QueuedChannel};
use crate::error::DispatcherError;
use crate::metrics::{DeliveryMetrics, MetricsSnapshot};
use crate::transport::HttpTransport;

/// Result of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by the channel
    Delivered { channel: Channel },
    /// The direct channel reported a failed ingestion
    Rejected { channel: Channel },
    /// The channel raised an error
    Failed { channel: Channel, reason: String },
    /// Nothing to deliver
    Skipped,
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    /// Channel that handled the call, `None` when skipped
    pub fn channel(&self) -> Option<Channel> {
        match self {
            Self::Delivered { channel }
            | Self::Rejected { channel }
            | Self::Failed { channel, .. } => Some(*channel),
            Self::Skipped => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Delivered { .. } => "delivered",
            Self::Rejected { .. } => "rejected",
            Self::Failed { .. } => "failed",
            Self::Skipped => "skipped",
        }
    }
}

/// Routes envelopes through the direct or the queued channel
pub struct DeliveryRouter<B> {
    direct: DirectChannel,
    queued: Option<QueuedChannel<B>>,
    provider: Arc<dyn TenantConfigProvider>,
    direct_metrics: DeliveryMetrics,
    queued_metrics: DeliveryMetrics,
}

impl<B: MessageBroker> DeliveryRouter<B> {
    pub fn new(
        direct: DirectChannel,
        queued: Option<QueuedChannel<B>>,
        provider: Arc<dyn TenantConfigProvider>,
    ) -> Self {
        Self {
            direct,
            queued,
            provider,
            direct_metrics: DeliveryMetrics::new(),
            queued_metrics: DeliveryMetrics::new(),
        }
    }

    pub fn queued_channel(&self) -> Option<&QueuedChannel<B>> {
        self.queued.as_ref()
    }

    /// Channel the tenant's settings select, with the direct channel as fallback
    pub fn select_channel(&self, tenant_id: i64) -> Channel {
        let broker_enabled = match self.provider.settings(tenant_id) {
            Ok(settings) => settings.broker_enabled,
            Err(e) => {
                warn!(tenant_id, error = %e, "Tenant settings unavailable, using direct channel");
                observability::record_config_failure(tenant_id);
                return Channel::Direct;
            }
        };

        match (broker_enabled, self.queued.is_some()) {
            (true, true) => Channel::Queued,
            (true, false) => {
                warn!(
                    tenant_id,
                    "Broker enabled but no queued channel configured, using direct channel"
                );
                Channel::Direct
            }
            (false, _) => Channel::Direct,
        }
    }

    /// Deliver through the selected channel, surfacing channel errors
    ///
    /// # Errors
    /// `Publish`, `Serialization` or `Format` from the queued channel
    pub async fn dispatch(
        &self,
        envelopes: &[Envelope],
        tenant: &Tenant,
    ) -> Result<DeliveryOutcome, ContractError> {
        if envelopes.is_empty() {
            return Ok(DeliveryOutcome::Skipped);
        }
        let channel = self.select_channel(tenant.id);
        self.deliver(channel, envelopes, tenant).await
    }

    /// Deliver and convert every failure into an outcome.
    ///
    /// Never fails; errors are logged with their full cause chain.
    #[instrument(
        name = "delivery_router_route",
        skip(self, envelopes, tenant),
        fields(tenant_id = tenant.id, count = envelopes.len())
    )]
    pub async fn route(
        &self,
        envelopes: &[Envelope],
        event_type: &str,
        collection: &str,
        tenant: &Tenant,
    ) -> DeliveryOutcome {
        if envelopes.is_empty() {
            return DeliveryOutcome::Skipped;
        }

        let keys = subjects(envelopes);
        let count = envelopes.len();
        info!(
            count,
            event_type,
            collection,
            tenant_id = tenant.id,
            keys = ?keys,
            "Start sending entities"
        );

        let channel = self.select_channel(tenant.id);
        let started = Instant::now();
        let outcome = match self.deliver(channel, envelopes, tenant).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    channel = %channel,
                    tenant_id = tenant.id,
                    tenant_code = %tenant.code,
                    collection,
                    event_type,
                    count,
                    keys = ?keys,
                    error = %e.chain(),
                    "Event sending failed"
                );
                DeliveryOutcome::Failed {
                    channel,
                    reason: e.to_string(),
                }
            }
        };

        self.record(channel, &outcome, count, started);
        info!(
            count,
            event_type,
            collection,
            outcome = outcome.label(),
            "Finished sending entities"
        );
        outcome
    }

    /// Counters per channel
    pub fn metrics(&self) -> Vec<(Channel, MetricsSnapshot)> {
        vec![
            (Channel::Direct, self.direct_metrics.snapshot()),
            (Channel::Queued, self.queued_metrics.snapshot()),
        ]
    }

    async fn deliver(
        &self,
        channel: Channel,
        envelopes: &[Envelope],
        tenant: &Tenant,
    ) -> Result<DeliveryOutcome, ContractError> {
        match (channel, &self.queued) {
            (Channel::Queued, Some(queued)) => {
                let request = IngestionRequest::new(envelopes.to_vec(), tenant.id);
                queued.send(&request).await?;
                Ok(DeliveryOutcome::Delivered { channel })
            }
            _ => {
                let channel = Channel::Direct;
                if self.direct.send(envelopes, tenant.id).await {
                    Ok(DeliveryOutcome::Delivered { channel })
                } else {
                    Ok(DeliveryOutcome::Rejected { channel })
                }
            }
        }
    }

    fn record(&self, channel: Channel, outcome: &DeliveryOutcome, count: usize, started: Instant) {
        let metrics = match channel {
            Channel::Direct => &self.direct_metrics,
            Channel::Queued => &self.queued_metrics,
        };
        metrics.add_envelopes(count);
        match outcome {
            DeliveryOutcome::Delivered { .. } => metrics.inc_delivered_count(),
            DeliveryOutcome::Rejected { .. } => metrics.inc_rejected_count(),
            DeliveryOutcome::Failed { .. } => metrics.inc_failed_count(),
            DeliveryOutcome::Skipped => return,
        }

        observability::record_delivery(
            channel.as_str(),
            outcome.label(),
            started.elapsed().as_secs_f64() * 1000.0,
        );
        observability::record_batch_size(count);
    }
}

/// Wire a router from configuration: direct channel always, queued channel
/// over AMQP when a broker section is present
#[instrument(name = "delivery_router_create", skip_all)]
pub fn create_router(
    blueprint: &PublisherBlueprint,
    codec: EnvelopeCodec,
    transport: Arc<HttpTransport>,
    provider: Arc<dyn TenantConfigProvider>,
) -> Result<DeliveryRouter<AmqpBroker>, DispatcherError> {
    let direct = DirectChannel::new(
        codec,
        transport,
        provider.clone(),
        blueprint.delivery.max_in_flight,
    );

    let queued = match &blueprint.broker {
        Some(settings) => {
            let keys_header = settings.keys_header.clone();
            let broker = AmqpBroker::new(settings.clone())?;
            info!(destination = %settings.destination(), "Queued channel configured");
            Some(QueuedChannel::new(codec, broker, keys_header))
        }
        None if blueprint.any_broker_enabled() => {
            return Err(DispatcherError::MissingBroker {
                tenant_ids: blueprint
                    .tenants
                    .iter()
                    .filter(|t| t.broker_enabled)
                    .map(|t| t.id)
                    .collect(),
            });
        }
        None => None,
    };

    Ok(DeliveryRouter::new(direct, queued, provider))
}
