//! AmqpBroker - RabbitMQ publisher with confirms

use std::future::Future;

use contracts::{BrokerMessage, BrokerSettings, ContractError, MessageBroker};
use lapin::options::{BasicPublishOptions, ConfirmSelectOptions};
use lapin::types::{AMQPValue, FieldTable, LongString, ShortString};
use lapin::uri::AMQPUri;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info, instrument, warn};

use crate::error::DispatcherError;

/// AMQP delivery mode for messages that survive a broker restart
const PERSISTENT: u8 = 2;

struct Session {
    connection: Connection,
    channel: Channel,
}

impl Session {
    fn is_usable(&self) -> bool {
        self.connection.status().connected() && self.channel.status().connected()
    }
}

/// Publishes ingestion requests to a RabbitMQ exchange.
///
/// Connects on first publish and reconnects when the previous connection or
/// channel is gone. Every network step is bounded by `timeout_ms`.
pub struct AmqpBroker {
    settings: BrokerSettings,
    uri: AMQPUri,
    session: Mutex<Option<Session>>,
}

impl AmqpBroker {
    /// # Errors
    /// `ChannelCreation` if the URI cannot be parsed
    pub fn new(settings: BrokerSettings) -> Result<Self, DispatcherError> {
        let uri: AMQPUri = settings
            .uri
            .parse()
            .map_err(|e: String| DispatcherError::channel_creation("amqp", e))?;

        Ok(Self {
            settings,
            uri,
            session: Mutex::new(None),
        })
    }

    pub fn settings(&self) -> &BrokerSettings {
        &self.settings
    }

    /// Run one broker step under the configured timeout
    async fn bounded<T, F>(&self, step: &str, future: F) -> Result<T, ContractError>
    where
        F: Future<Output = Result<T, lapin::Error>>,
    {
        match timeout(self.settings.timeout(), future).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ContractError::publish_with_source(
                self.settings.destination(),
                format!("{step} failed"),
                e,
            )),
            Err(_) => Err(ContractError::publish(
                self.settings.destination(),
                format!("{step} timed out after {}ms", self.settings.timeout_ms),
            )),
        }
    }

    async fn open_session(&self) -> Result<Session, ContractError> {
        let connection = self
            .bounded(
                "connect",
                Connection::connect_uri(self.uri.clone(), ConnectionProperties::default()),
            )
            .await?;
        let channel = self
            .bounded("create channel", connection.create_channel())
            .await?;
        self.bounded(
            "confirm select",
            channel.confirm_select(ConfirmSelectOptions::default()),
        )
        .await?;

        info!(destination = %self.settings.destination(), "AMQP session opened");
        Ok(Session {
            connection,
            channel,
        })
    }

    async fn publish_on(
        &self,
        channel: &Channel,
        message: &BrokerMessage,
    ) -> Result<(), ContractError> {
        let confirm = self
            .bounded(
                "publish",
                channel.basic_publish(
                    &self.settings.exchange,
                    &self.settings.routing_key,
                    BasicPublishOptions::default(),
                    &message.body,
                    properties(message),
                ),
            )
            .await?;

        let confirmation = self.bounded("publisher confirm", confirm).await?;
        if confirmation.is_nack() {
            return Err(ContractError::publish(
                self.settings.destination(),
                "broker refused the message",
            ));
        }
        Ok(())
    }
}

fn properties(message: &BrokerMessage) -> BasicProperties {
    let mut headers = FieldTable::default();
    for (name, value) in &message.headers {
        headers.insert(
            ShortString::from(name.clone()),
            AMQPValue::LongString(LongString::from(value.clone())),
        );
    }

    BasicProperties::default()
        .with_content_type(ShortString::from(message.content_type.clone()))
        .with_delivery_mode(PERSISTENT)
        .with_headers(headers)
}

impl MessageBroker for AmqpBroker {
    fn name(&self) -> &str {
        "amqp"
    }

    #[instrument(
        name = "amqp_broker_publish",
        skip(self, message),
        fields(destination = %self.settings.destination(), bytes = message.body.len())
    )]
    async fn publish(&self, message: BrokerMessage) -> Result<(), ContractError> {
        let mut session = self.session.lock().await;

        if session.as_ref().is_some_and(|s| !s.is_usable()) {
            debug!("AMQP session lost, reconnecting");
            *session = None;
        }
        if session.is_none() {
            *session = Some(self.open_session().await?);
        }

        let Some(active) = session.as_ref() else {
            return Err(ContractError::publish(
                self.settings.destination(),
                "no AMQP session",
            ));
        };

        let result = self.publish_on(&active.channel, &message).await;
        if let Err(ref e) = result {
            warn!(error = %e, "AMQP publish failed, session will be reopened");
            *session = None;
        }
        result
    }
}
