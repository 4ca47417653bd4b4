//! CatalogPublisher - turns entity changes into routed envelopes

use std::sync::Arc;

use contracts::{
    CatalogEntity, ContractError, Data, EntityId, Envelope, MessageBroker, Tenant,
    TenantConfigProvider,
};
use dispatcher::{DeliveryOutcome, DeliveryRouter};
use envelope_codec::EnvelopeCodec;
use tracing::{debug, instrument};

use crate::resolver::{key_of, type_for_publish, type_for_unpublish};

/// Entry point for the host platform's indexers.
///
/// Delivery failures come back as a [`DeliveryOutcome`]; `Err` is reserved
/// for invalid input, encoding failures and unknown tenants.
pub struct CatalogPublisher<B> {
    codec: EnvelopeCodec,
    router: DeliveryRouter<B>,
    provider: Arc<dyn TenantConfigProvider>,
}

impl<B: MessageBroker> CatalogPublisher<B> {
    pub fn new(
        codec: EnvelopeCodec,
        router: DeliveryRouter<B>,
        provider: Arc<dyn TenantConfigProvider>,
    ) -> Self {
        Self {
            codec,
            router,
            provider,
        }
    }

    pub fn router(&self) -> &DeliveryRouter<B> {
        &self.router
    }

    /// Publish the current state of each entity
    ///
    /// # Errors
    /// `Validation` for a missing/invalid id or empty collection,
    /// `Serialization`, `UnknownTenant`
    #[instrument(
        name = "catalog_publisher_publish",
        skip(self, entities, tenant),
        fields(tenant_id = tenant.id, count = entities.len())
    )]
    pub async fn publish(
        &self,
        entities: &[CatalogEntity],
        collection: &str,
        tenant: &Tenant,
    ) -> Result<DeliveryOutcome, ContractError> {
        if entities.is_empty() {
            debug!(collection, "Nothing to publish");
            return Ok(DeliveryOutcome::Skipped);
        }

        let settings = self.provider.settings(tenant.id)?;
        let envelopes: Vec<Envelope> = entities
            .iter()
            .map(|entity| -> Result<Envelope, ContractError> {
                let entity_type = type_for_publish(entity, collection)?;
                let key = key_of(&entity_type, &entity.id()?, tenant);
                let content = entity.to_json_bytes()?;
                Ok(self.codec.build(
                    key,
                    &settings.publish_event_type,
                    &settings.event_source,
                    Data::new(Some(content.as_slice()), entity_type.fully_qualified_name()),
                ))
            })
            .collect::<Result<_, _>>()?;

        observability::record_envelopes_built("publish", envelopes.len());
        Ok(self
            .router
            .route(&envelopes, &settings.publish_event_type, collection, tenant)
            .await)
    }

    /// Remove entities by id
    ///
    /// # Errors
    /// `Validation` for an empty collection, `UnknownTenant`
    #[instrument(
        name = "catalog_publisher_unpublish",
        skip(self, entity_ids, tenant),
        fields(tenant_id = tenant.id, count = entity_ids.len())
    )]
    pub async fn unpublish(
        &self,
        entity_ids: &[EntityId],
        collection: &str,
        tenant: &Tenant,
    ) -> Result<DeliveryOutcome, ContractError> {
        if entity_ids.is_empty() {
            debug!(collection, "Nothing to unpublish");
            return Ok(DeliveryOutcome::Skipped);
        }

        let settings = self.provider.settings(tenant.id)?;
        let entity_type = type_for_unpublish(collection)?;
        let envelopes: Vec<Envelope> = entity_ids
            .iter()
            .map(|id| {
                self.codec.build(
                    key_of(&entity_type, id, tenant),
                    &settings.unpublish_event_type,
                    &settings.event_source,
                    Data::removal(entity_type.fully_qualified_name()),
                )
            })
            .collect();

        observability::record_envelopes_built("unpublish", envelopes.len());
        Ok(self
            .router
            .route(&envelopes, &settings.unpublish_event_type, collection, tenant)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config_loader::StaticTenantConfig;
    use contracts::TenantSettings;
    use dispatcher::{Channel, DirectChannel, HttpTransport, InMemoryBroker, QueuedChannel};
    use envelope_codec::IngestionRequest;
    use serde_json::json;

    const PUBLISH_TYPE: &str = "com.streamx.blueprints.data.published.v1";
    const UNPUBLISH_TYPE: &str = "com.streamx.blueprints.data.unpublished.v1";

    fn publisher(broker: &InMemoryBroker) -> CatalogPublisher<InMemoryBroker> {
        let codec = EnvelopeCodec::new();
        let mut settings = TenantSettings::new(5, "store_5", "http://127.0.0.1:9");
        settings.broker_enabled = true;
        let provider: Arc<dyn TenantConfigProvider> =
            Arc::new(StaticTenantConfig::new(vec![settings]));

        let direct = DirectChannel::new(codec, Arc::new(HttpTransport::new()), provider.clone(), 4);
        let queued = QueuedChannel::new(codec, broker.clone(), "ingestion_keys");
        let router = DeliveryRouter::new(direct, Some(queued), provider.clone());
        CatalogPublisher::new(codec, router, provider)
    }

    fn store() -> Tenant {
        Tenant::new(5, "store_5")
    }

    /// Envelopes of the nth message the broker received
    fn sent(broker: &InMemoryBroker, nth: usize) -> Vec<Envelope> {
        let messages = broker.messages();
        let body = std::str::from_utf8(&messages[nth].body).unwrap();
        IngestionRequest::from_wire_form(body, &EnvelopeCodec::new())
            .unwrap()
            .into_envelopes()
    }

    fn entity(value: serde_json::Value) -> CatalogEntity {
        CatalogEntity::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_publish_simple_product() {
        let broker = InMemoryBroker::new();
        let outcome = publisher(&broker)
            .publish(&[entity(json!({"id": "1"}))], "product", &store())
            .await
            .unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered { channel: Channel::Queued });

        let envelopes = sent(&broker, 0);
        assert_eq!(envelopes.len(), 1);
        let envelope = &envelopes[0];
        assert_eq!(envelope.subject(), "store_5_product:1");
        assert_eq!(envelope.event_type(), PUBLISH_TYPE);
        assert_eq!(envelope.source(), "magento-connector");
        assert_eq!(envelope.data().content_type(), "product/simple");
        assert_eq!(envelope.data().content(), Some("eyJpZCI6IjEifQ=="));
    }

    #[tokio::test]
    async fn test_publish_master_product() {
        let broker = InMemoryBroker::new();
        publisher(&broker)
            .publish(
                &[entity(json!({"id": "2", "variants": {"id": "10"}}))],
                "product",
                &store(),
            )
            .await
            .unwrap();

        let envelopes = sent(&broker, 0);
        let envelope = &envelopes[0];
        assert_eq!(envelope.subject(), "store_5_product:2");
        assert_eq!(envelope.data().content_type(), "product/master");
        let decoded = envelope.data().decoded_content().unwrap().unwrap();
        assert_eq!(decoded, br#"{"id":"2","variants":{"id":"10"}}"#);
    }

    #[tokio::test]
    async fn test_unpublish_product() {
        let broker = InMemoryBroker::new();
        publisher(&broker)
            .unpublish(&[EntityId::from(3u64)], "product", &store())
            .await
            .unwrap();

        let envelopes = sent(&broker, 0);
        let envelope = &envelopes[0];
        assert_eq!(envelope.subject(), "store_5_product:3");
        assert_eq!(envelope.event_type(), UNPUBLISH_TYPE);
        assert_eq!(envelope.data().content(), None);
        assert_eq!(envelope.data().content_type(), "product");
        assert!(envelope.is_removal());
    }

    #[tokio::test]
    async fn test_content_polarity() {
        let broker = InMemoryBroker::new();
        let publisher = publisher(&broker);
        publisher
            .publish(
                &[entity(json!({"id": 7})), entity(json!({"id": "8", "name": ""}))],
                "category",
                &store(),
            )
            .await
            .unwrap();
        publisher
            .unpublish(&[EntityId::from(7u64), EntityId::from(8u64)], "category", &store())
            .await
            .unwrap();

        assert!(sent(&broker, 0).iter().all(|e| e.data().content().is_some()));
        assert!(sent(&broker, 1).iter().all(|e| e.data().content().is_none()));
        assert_eq!(sent(&broker, 0)[0].subject(), sent(&broker, 1)[0].subject());
    }

    #[tokio::test]
    async fn test_invalid_input_is_error_and_nothing_is_sent() {
        let broker = InMemoryBroker::new();
        let publisher = publisher(&broker);

        let missing_id = publisher
            .publish(
                &[entity(json!({"id": "1"})), entity(json!({"sku": "x"}))],
                "product",
                &store(),
            )
            .await;
        assert!(matches!(
            missing_id,
            Err(ContractError::Validation { ref field, .. }) if field == "id"
        ));

        let bad_collection = publisher.unpublish(&[EntityId::from(1u64)], "", &store()).await;
        assert!(bad_collection.is_err());

        let unknown = publisher
            .publish(&[entity(json!({"id": "1"}))], "product", &Tenant::new(6, "store_6"))
            .await;
        assert!(matches!(unknown, Err(ContractError::UnknownTenant { tenant_id: 6 })));

        assert!(broker.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_is_skipped() {
        let broker = InMemoryBroker::new();
        let publisher = publisher(&broker);
        assert_eq!(
            publisher.publish(&[], "product", &store()).await.unwrap(),
            DeliveryOutcome::Skipped
        );
        assert_eq!(
            publisher.unpublish(&[], "product", &store()).await.unwrap(),
            DeliveryOutcome::Skipped
        );
        assert!(broker.is_empty());
    }

    #[tokio::test]
    async fn test_delivery_failure_never_escapes() {
        let broker = InMemoryBroker::unavailable();
        let outcome = publisher(&broker)
            .publish(&[entity(json!({"id": "1"}))], "product", &store())
            .await;
        assert!(matches!(
            outcome,
            Ok(DeliveryOutcome::Failed { channel: Channel::Queued, .. })
        ));
    }
}
