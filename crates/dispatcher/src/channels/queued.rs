//! QueuedChannel - ingestion requests through a message broker

use contracts::{BrokerMessage, ContractError, MessageBroker};
use envelope_codec::{EnvelopeCodec, IngestionRequest};
use tracing::{info, instrument};

/// Channel that wraps envelopes into an [`IngestionRequest`] and publishes it
/// once. Errors propagate to the router.
pub struct QueuedChannel<B> {
    codec: EnvelopeCodec,
    broker: B,
    keys_header: String,
}

impl<B: MessageBroker> QueuedChannel<B> {
    pub fn new(codec: EnvelopeCodec, broker: B, keys_header: impl Into<String>) -> Self {
        Self {
            codec,
            broker,
            keys_header: keys_header.into(),
        }
    }

    pub fn broker(&self) -> &B {
        &self.broker
    }

    #[instrument(
        name = "queued_channel_send",
        skip(self, request),
        fields(
            broker = self.broker.name(),
            tenant_id = request.tenant_id(),
            count = request.envelopes().len()
        )
    )]
    pub async fn send(&self, request: &IngestionRequest) -> Result<(), ContractError> {
        let keys = serde_json::to_string(&request.subjects())
            .map_err(|e| ContractError::serialization("failed to encode ingestion keys", e))?;
        info!(
            tenant_id = request.tenant_id(),
            count = request.envelopes().len(),
            keys = %keys,
            "Sending events to broker"
        );

        let body = request.to_wire_form(&self.codec)?;
        let message = BrokerMessage::json(body).with_header(&self.keys_header, keys);
        self.broker.publish(message).await
    }
}
