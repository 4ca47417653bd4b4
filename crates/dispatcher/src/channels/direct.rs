//! DirectChannel - synchronous HTTP delivery to the ingestion endpoint

use std::sync::Arc;

use contracts::{event_types, subjects, ContractError, Envelope, TenantConfigProvider};
use envelope_codec::EnvelopeCodec;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument};

use crate::transport::{ClientProfile, HttpTransport};

/// Content type of a multi-envelope request body
pub const CLOUDEVENTS_BATCH_CONTENT_TYPE: &str = "application/cloudevents-batch+json";

/// Longest response excerpt carried into an error message
const MAX_ERROR_BODY: usize = 512;

/// Channel that POSTs envelopes straight to the tenant's ingestion endpoint.
///
/// Never raises: every failure is logged and reported as `false`.
pub struct DirectChannel {
    codec: EnvelopeCodec,
    transport: Arc<HttpTransport>,
    provider: Arc<dyn TenantConfigProvider>,
    permits: Semaphore,
}

impl DirectChannel {
    /// `max_in_flight` bounds concurrent requests across all tenants
    pub fn new(
        codec: EnvelopeCodec,
        transport: Arc<HttpTransport>,
        provider: Arc<dyn TenantConfigProvider>,
        max_in_flight: usize,
    ) -> Self {
        Self {
            codec,
            transport,
            provider,
            permits: Semaphore::new(max_in_flight.max(1)),
        }
    }

    /// `true` if and only if every envelope was accepted downstream
    #[instrument(
        name = "direct_channel_send",
        skip(self, envelopes),
        fields(count = envelopes.len())
    )]
    pub async fn send(&self, envelopes: &[Envelope], tenant_id: i64) -> bool {
        match self.ingest(envelopes, tenant_id).await {
            Ok(()) => {
                info!(tenant_id, "Finished ingesting data with success");
                true
            }
            Err(e) => {
                error!(
                    tenant_id,
                    error = %e.chain(),
                    keys = ?subjects(envelopes),
                    "Finished ingesting data with failure"
                );
                false
            }
        }
    }

    async fn ingest(&self, envelopes: &[Envelope], tenant_id: i64) -> Result<(), ContractError> {
        let settings = self.provider.settings(tenant_id)?;
        let endpoint = settings.ingestion_endpoint();
        info!(
            tenant_id,
            endpoint = %endpoint,
            event_types = ?event_types(envelopes),
            keys = ?subjects(envelopes),
            "Ingesting data"
        );

        let body = self.codec.serialize_batch(envelopes)?;
        let client = self.transport.client(ClientProfile::for_tenant(&settings))?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| ContractError::transport_with_source(&endpoint, "channel closed", e))?;

        let mut request = client
            .post(&endpoint)
            .timeout(settings.response_timeout())
            .header(CONTENT_TYPE, CLOUDEVENTS_BATCH_CONTENT_TYPE)
            .body(body);
        if let Some(token) = settings.auth_token.as_deref().filter(|t| !t.is_empty()) {
            request = request.bearer_auth(token);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| ContractError::transport_with_source(&endpoint, "request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ContractError::transport(
                &endpoint,
                format!("unexpected status {status}: {}", excerpt(&text)),
            ));
        }

        let mut acks = AckReader::new(&endpoint, envelopes.len());
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| {
                ContractError::transport_with_source(&endpoint, "response stream failed", e)
            })?
        {
            acks.push(&chunk)?;
        }
        let acknowledged = acks.finish()?;
        debug!(tenant_id, acknowledged, "Ingestion response consumed");
        Ok(())
    }
}

/// Incremental reader of newline-delimited acknowledgements.
///
/// An object carrying `failure` or `errorCode` is a rejection. An empty body
/// accepts everything; otherwise each envelope must be acknowledged exactly
/// once.
#[derive(Debug)]
pub struct AckReader {
    endpoint: String,
    expected: usize,
    acknowledged: usize,
    pending: Vec<u8>,
}

impl AckReader {
    pub fn new(endpoint: impl Into<String>, expected: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            expected,
            acknowledged: 0,
            pending: Vec::new(),
        }
    }

    /// Feed one chunk; fails on the first rejection
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), ContractError> {
        self.pending.extend_from_slice(chunk);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.accept_line(&line)?;
        }
        Ok(())
    }

    /// Number of acknowledgements read
    pub fn finish(mut self) -> Result<usize, ContractError> {
        let rest = std::mem::take(&mut self.pending);
        self.accept_line(&rest)?;

        if self.acknowledged != 0 && self.acknowledged < self.expected {
            return Err(ContractError::transport(
                &self.endpoint,
                format!(
                    "only {} of {} envelopes acknowledged",
                    self.acknowledged, self.expected
                ),
            ));
        }
        Ok(self.acknowledged)
    }

    fn accept_line(&mut self, line: &[u8]) -> Result<(), ContractError> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return Ok(());
        }

        let ack: Value = serde_json::from_slice(line).map_err(|e| {
            ContractError::transport_with_source(&self.endpoint, "malformed acknowledgement", e)
        })?;

        if let Some(fields) = ack.as_object() {
            if fields.contains_key("failure") || fields.contains_key("errorCode") {
                return Err(ContractError::transport(
                    &self.endpoint,
                    format!("ingestion rejected: {}", excerpt(&ack.to_string())),
                ));
            }
        }
        if self.acknowledged == self.expected {
            return Err(ContractError::transport(
                &self.endpoint,
                format!("more acknowledgements than the {} envelopes sent", self.expected),
            ));
        }
        self.acknowledged += 1;
        Ok(())
    }
}

fn excerpt(text: &str) -> &str {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
